//! Driven port for the external text-generation model suggesting assignees.
//!
//! Adapters receive the problem description plus the roster of known
//! assignees and return whatever the model answered. Shape validation happens
//! in the domain service, so adapters stay thin.

use async_trait::async_trait;

use crate::domain::KnownAssignee;

use super::define_port_error;

define_port_error! {
    /// Errors raised by suggestion adapters.
    pub enum AssigneeSuggesterError {
        /// No model endpoint is configured.
        Disabled => "assignee suggestions are not configured",
        /// The call did not complete or returned a failure status.
        Transport { message: String } => "suggestion request failed: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "suggestion response was malformed: {message}",
    }
}

/// Unvalidated answer returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSuggestion {
    pub email: String,
    pub reason: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssigneeSuggester: Send + Sync {
    /// Ask the model who should handle `description`.
    async fn suggest(
        &self,
        description: &str,
        roster: &[KnownAssignee],
    ) -> Result<RawSuggestion, AssigneeSuggesterError>;
}

/// Suggester used when no endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAssigneeSuggester;

#[async_trait]
impl AssigneeSuggester for DisabledAssigneeSuggester {
    async fn suggest(
        &self,
        _description: &str,
        _roster: &[KnownAssignee],
    ) -> Result<RawSuggestion, AssigneeSuggesterError> {
        Err(AssigneeSuggesterError::disabled())
    }
}
