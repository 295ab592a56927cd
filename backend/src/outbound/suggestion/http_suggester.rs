//! Reqwest-backed assignee suggester.
//!
//! Owns transport details only: prompt construction, bearer authentication,
//! status mapping and response decoding. Shape validation of the answer is
//! left to the domain service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ChatMessageDto, ChatRequestDto, ChatResponseDto, ResponseFormatDto};
use crate::domain::KnownAssignee;
use crate::domain::ports::{AssigneeSuggester, AssigneeSuggesterError, RawSuggestion};

const SYSTEM_PROMPT: &str = "You route IT support tickets. Pick the single best assignee for the \
ticket from the roster. Answer with a JSON object of the form \
{\"email\": \"<assignee email>\", \"reason\": \"<one sentence>\"} and nothing else.";

/// Where and how to reach the completion API.
pub struct SuggesterEndpoint {
    pub url: Url,
    pub model: String,
    pub api_key: Option<Zeroizing<String>>,
    pub timeout: Duration,
}

impl fmt::Debug for SuggesterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggesterEndpoint")
            .field("url", &self.url.as_str())
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Suggester posting to a single chat completions endpoint.
pub struct ChatCompletionsSuggester {
    client: Client,
    endpoint: SuggesterEndpoint,
}

impl ChatCompletionsSuggester {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: SuggesterEndpoint) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(endpoint.timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AssigneeSuggester for ChatCompletionsSuggester {
    async fn suggest(
        &self,
        description: &str,
        roster: &[KnownAssignee],
    ) -> Result<RawSuggestion, AssigneeSuggesterError> {
        let prompt = build_user_prompt(description, roster);
        let body = ChatRequestDto {
            model: &self.endpoint.model,
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessageDto {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormatDto::json_object(),
        };

        let mut request = self
            .client
            .post(self.endpoint.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key.as_str());
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        debug!(bytes = bytes.len(), "assignee suggestion received");
        decode(bytes.as_ref())
    }
}

fn build_user_prompt(description: &str, roster: &[KnownAssignee]) -> String {
    let roster_lines = if roster.is_empty() {
        "(no roster configured; suggest any plausible support email)".to_owned()
    } else {
        roster
            .iter()
            .map(|member| format!("- {} <{}>", member.name.as_ref(), member.email.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("Roster:\n{roster_lines}\n\nTicket:\n{}", description.trim())
}

fn decode(body: &[u8]) -> Result<RawSuggestion, AssigneeSuggesterError> {
    let envelope: ChatResponseDto = serde_json::from_slice(body).map_err(|err| {
        AssigneeSuggesterError::decode(format!("invalid completion payload: {err}"))
    })?;
    envelope
        .into_suggestion()
        .map_err(AssigneeSuggesterError::decode)
}

fn map_transport_error(error: reqwest::Error) -> AssigneeSuggesterError {
    if error.is_timeout() {
        AssigneeSuggesterError::transport(format!("timed out: {error}"))
    } else {
        AssigneeSuggesterError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AssigneeSuggesterError {
    let preview = body_preview(body);
    if preview.is_empty() {
        AssigneeSuggesterError::transport(format!("status {}", status.as_u16()))
    } else {
        AssigneeSuggesterError::transport(format!("status {}: {preview}", status.as_u16()))
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
