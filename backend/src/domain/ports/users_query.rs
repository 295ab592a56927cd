//! Driving port for directory reads.
//!
//! Inbound adapters (HTTP handlers) use this port to fetch user-visible data
//! without importing outbound persistence concerns.

use async_trait::async_trait;

use crate::domain::{DirectoryUser, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Every directory user ordered by name.
    async fn list_users(&self) -> Result<Vec<DirectoryUser>, Error>;

    /// One user by id.
    async fn get_user(&self, id: &UserId) -> Result<DirectoryUser, Error>;
}
