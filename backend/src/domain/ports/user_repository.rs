//! Port abstraction for directory user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{DirectoryUser, EmailAddress, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another record already holds the email.
        DuplicateEmail { email: String } => "email {email} is already registered",
        /// The record to update or delete does not exist.
        NotFound { id: UserId } => "user {id} not found",
        /// Tickets still reference the record.
        Referenced { id: UserId } => "user {id} is referenced by tickets",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; fails with `DuplicateEmail` on a taken address.
    async fn insert(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError>;

    /// Overwrite an existing user.
    async fn update(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<DirectoryUser>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserPersistenceError>;

    /// All users ordered by name.
    async fn list(&self) -> Result<Vec<DirectoryUser>, UserPersistenceError>;

    /// Remove a user; fails with `Referenced` while tickets point at it.
    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError>;

    /// Number of tickets naming the user as requester or assignee.
    async fn count_ticket_references(&self, id: &UserId) -> Result<u64, UserPersistenceError>;
}
