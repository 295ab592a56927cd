//! Port for reading the lookup catalogue.
use async_trait::async_trait;

use crate::domain::LookupEntry;

use super::define_port_error;

define_port_error! {
    /// Errors raised by lookup repository adapters.
    pub enum LookupRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "lookup repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "lookup repository query failed: {message}",
    }
}

/// Read-only access to every lookup record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupRepository: Send + Sync {
    /// Load the whole catalogue.
    async fn list_all(&self) -> Result<Vec<LookupEntry>, LookupRepositoryError>;
}
