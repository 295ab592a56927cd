//! Wire types for the chat completions exchange.
//!
//! Requests are built from borrowed prompt text; responses are decoded in two
//! steps: the envelope first, then the JSON object the model wrote into the
//! first choice's content.

use serde::{Deserialize, Serialize};

use crate::domain::ports::RawSuggestion;

#[derive(Debug, Serialize)]
pub(super) struct ChatRequestDto<'a> {
    pub(super) model: &'a str,
    pub(super) messages: [ChatMessageDto<'a>; 2],
    pub(super) temperature: f32,
    pub(super) response_format: ResponseFormatDto,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub(super) role: &'static str,
    pub(super) content: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ResponseFormatDto {
    #[serde(rename = "type")]
    pub(super) format: &'static str,
}

impl ResponseFormatDto {
    pub(super) fn json_object() -> Self {
        Self {
            format: "json_object",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponseDto {
    #[serde(default)]
    choices: Vec<ChatChoiceDto>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceDto {
    message: ChatReplyDto,
}

#[derive(Debug, Deserialize)]
struct ChatReplyDto {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionDto {
    email: String,
    #[serde(default)]
    reason: String,
}

impl ChatResponseDto {
    /// Extract the suggestion from the first choice.
    pub(super) fn into_suggestion(self) -> Result<RawSuggestion, String> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| "response carried no message content".to_owned())?;
        let decoded: SuggestionDto = serde_json::from_str(strip_code_fence(&content))
            .map_err(|err| format!("message content is not a suggestion object: {err}"))?;
        Ok(RawSuggestion {
            email: decoded.email,
            reason: decoded.reason,
        })
    }
}

/// Models sometimes wrap JSON in a Markdown fence despite the response format.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
