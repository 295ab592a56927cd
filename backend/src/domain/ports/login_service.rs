//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! infrastructure. HTTP handler tests substitute a mock instead of wiring
//! persistence.

use async_trait::async_trait;

use crate::domain::{CallerIdentity, Error, LoginCredentials};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the identity to keep in the session.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<CallerIdentity, Error>;
}
