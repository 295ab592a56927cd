//! Driving port for directory writes.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{DirectoryUser, EmailAddress, Error, PersonName, UserId};

/// Request to register a directory user with a login password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub photo_url: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
///
/// An empty `photo_url` removes the photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub active: Option<bool>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectoryCommand: Send + Sync {
    /// Register a user; the email domain must be allowed and unused.
    async fn create(&self, request: CreateUserRequest) -> Result<DirectoryUser, Error>;

    /// Apply a partial update.
    async fn update(&self, id: &UserId, request: UpdateUserRequest) -> Result<DirectoryUser, Error>;

    /// Remove a user nobody references.
    async fn delete(&self, id: &UserId) -> Result<(), Error>;

    /// Return the user holding `email` with `name` applied, creating a
    /// minimal active record when none exists.
    async fn upsert_by_email(
        &self,
        email: &EmailAddress,
        name: &PersonName,
    ) -> Result<DirectoryUser, Error>;
}
