//! Assignee suggestion service.
//!
//! Wraps the external model behind [`AssigneeSuggester`] and enforces the
//! contract on both sides: the description must be non-blank and the model
//! must answer with a valid email and a non-blank reason. When a roster is
//! configured the email must also belong to one of its members.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::domain::ports::{AssigneeSuggester, AssigneeSuggesterError, AssigneeSuggestion};
use crate::domain::{AssigneeRoster, EmailAddress, Error};

/// Validated suggestion returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeSuggestionResult {
    pub email: EmailAddress,
    pub reason: String,
}

/// Implements [`AssigneeSuggestion`] over an [`AssigneeSuggester`].
#[derive(Clone)]
pub struct AssigneeSuggestionService<S> {
    suggester: Arc<S>,
    roster: AssigneeRoster,
}

impl<S> AssigneeSuggestionService<S> {
    pub fn new(suggester: Arc<S>, roster: AssigneeRoster) -> Self {
        Self { suggester, roster }
    }
}

fn map_suggester_error(err: AssigneeSuggesterError) -> Error {
    warn!(error = %err, "assignee suggestion failed");
    Error::upstream(err.to_string())
}

#[async_trait]
impl<S> AssigneeSuggestion for AssigneeSuggestionService<S>
where
    S: AssigneeSuggester,
{
    async fn suggest(&self, description: &str) -> Result<AssigneeSuggestionResult, Error> {
        let description = description.trim();
        if description.is_empty() {
            return Err(
                Error::invalid_request("description must not be empty").with_details(json!({
                    "field": "description",
                    "code": "missing_field",
                })),
            );
        }

        let raw = self
            .suggester
            .suggest(description, self.roster.members())
            .await
            .map_err(map_suggester_error)?;

        let email = EmailAddress::new(&raw.email).map_err(|err| {
            map_suggester_error(AssigneeSuggesterError::decode(format!(
                "suggested email is invalid: {err}"
            )))
        })?;
        if !self.roster.admits(&email) {
            return Err(map_suggester_error(AssigneeSuggesterError::decode(format!(
                "suggested {email} is not on the roster"
            ))));
        }
        let reason = raw.reason.trim();
        if reason.is_empty() {
            return Err(map_suggester_error(AssigneeSuggesterError::decode(
                "suggestion reason is empty",
            )));
        }

        Ok(AssigneeSuggestionResult {
            email,
            reason: reason.to_owned(),
        })
    }
}
