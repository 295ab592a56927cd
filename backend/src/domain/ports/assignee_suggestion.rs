//! Driving port for assignee suggestions.

use async_trait::async_trait;

use crate::domain::{AssigneeSuggestionResult, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssigneeSuggestion: Send + Sync {
    /// Suggest who should handle a problem described in free text.
    async fn suggest(&self, description: &str) -> Result<AssigneeSuggestionResult, Error>;
}
