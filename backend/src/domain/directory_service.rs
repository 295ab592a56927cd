//! User directory domain service.
//!
//! Implements the directory driving ports on top of a [`UserRepository`]:
//! domain allowlist and uniqueness checks on registration and email changes,
//! reference-guarded deletes, and the upsert-by-email used when tickets name
//! a requester or assignee.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    CreateUserRequest, UpdateUserRequest, UserDirectoryCommand, UserPersistenceError,
    UserRepository, UsersQuery,
};
use crate::domain::{
    CredentialError, DirectoryUser, EmailAddress, EmailDomainPolicy, Error, FieldErrorCode,
    FieldErrors, PASSWORD_MIN_LEN, PasswordCredential, PersonName, PhotoUrl, UserId,
    UserValidationError,
};

/// Directory service implementing [`UserDirectoryCommand`] and [`UsersQuery`].
#[derive(Clone)]
pub struct UserDirectoryService<U> {
    users: Arc<U>,
    policy: EmailDomainPolicy,
    clock: Arc<dyn Clock>,
}

impl<U> UserDirectoryService<U> {
    pub fn new(users: Arc<U>, policy: EmailDomainPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            policy,
            clock,
        }
    }
}

fn code_for(err: &UserValidationError) -> FieldErrorCode {
    match err {
        UserValidationError::EmptyEmail | UserValidationError::EmptyName => {
            FieldErrorCode::MissingField
        }
        UserValidationError::NameTooLong { .. } | UserValidationError::EmailTooLong { .. } => {
            FieldErrorCode::TooLong
        }
        _ => FieldErrorCode::InvalidValue,
    }
}

fn email_taken(email: impl std::fmt::Display) -> Error {
    Error::conflict(format!("email {email} is already registered")).with_details(json!({
        "field": "email",
        "code": "duplicate_email",
    }))
}

fn user_not_found(id: &UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

fn user_referenced(id: &UserId, references: Option<u64>) -> Error {
    Error::conflict(format!(
        "user {id} is referenced by tickets; deactivate it instead"
    ))
    .with_details(json!({
        "code": "user_referenced",
        "ticketReferences": references,
    }))
}

fn map_credential_error(err: CredentialError) -> Error {
    Error::internal(format!("credential derivation failed: {err}"))
}

impl<U> UserDirectoryService<U>
where
    U: UserRepository,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { email } => email_taken(email),
            UserPersistenceError::NotFound { id } => user_not_found(&id),
            UserPersistenceError::Referenced { id } => user_referenced(&id, None),
        }
    }

    fn check_email(&self, errors: &mut FieldErrors, raw: &str) -> Option<EmailAddress> {
        let email = match EmailAddress::new(raw) {
            Ok(email) => email,
            Err(err) => {
                errors.push("email", code_for(&err), err.to_string());
                return None;
            }
        };
        if !self.policy.permits(&email) {
            errors.push(
                "email",
                FieldErrorCode::DomainNotAllowed,
                format!("email domain {} is not allowed", email.domain()),
            );
            return None;
        }
        Some(email)
    }

    fn check_name(errors: &mut FieldErrors, raw: &str) -> Option<PersonName> {
        match PersonName::new(raw) {
            Ok(name) => Some(name),
            Err(err) => {
                errors.push("name", code_for(&err), err.to_string());
                None
            }
        }
    }

    /// `Some(None)` clears the photo; `None` records a failure.
    fn check_photo(errors: &mut FieldErrors, raw: &str) -> Option<Option<PhotoUrl>> {
        if raw.trim().is_empty() {
            return Some(None);
        }
        errors
            .check("photoUrl", FieldErrorCode::InvalidValue, PhotoUrl::new(raw))
            .map(Some)
    }

    async fn find_existing(&self, id: &UserId) -> Result<DirectoryUser, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| user_not_found(id))
    }

    async fn ensure_email_free(
        &self,
        email: &EmailAddress,
        owner: Option<&UserId>,
    ) -> Result<(), Error> {
        let holder = self
            .users
            .find_by_email(email)
            .await
            .map_err(Self::map_user_error)?;
        match holder {
            Some(existing) if Some(&existing.id) != owner => Err(email_taken(email)),
            _ => Ok(()),
        }
    }

    async fn rename(
        &self,
        mut user: DirectoryUser,
        name: &PersonName,
    ) -> Result<DirectoryUser, Error> {
        if &user.name == name {
            return Ok(user);
        }
        user.name = name.clone();
        user.updated_at = self.clock.utc();
        self.users
            .update(&user)
            .await
            .map_err(Self::map_user_error)?;
        debug!(user_id = %user.id, "directory user renamed by upsert");
        Ok(user)
    }
}

#[async_trait]
impl<U> UserDirectoryCommand for UserDirectoryService<U>
where
    U: UserRepository,
{
    async fn create(&self, request: CreateUserRequest) -> Result<DirectoryUser, Error> {
        let mut errors = FieldErrors::default();
        let name = Self::check_name(&mut errors, &request.name);
        let email = self.check_email(&mut errors, &request.email);
        let photo = match request.photo_url.as_deref() {
            Some(raw) => Self::check_photo(&mut errors, raw),
            None => Some(None),
        };
        if request.password.chars().count() < PASSWORD_MIN_LEN {
            errors.push(
                "password",
                FieldErrorCode::TooShort,
                format!("password must be at least {PASSWORD_MIN_LEN} characters"),
            );
        }
        errors.into_result("invalid user")?;
        let (Some(name), Some(email), Some(photo_url)) = (name, email, photo) else {
            return Err(Error::internal("validated user fields missing"));
        };

        self.ensure_email_free(&email, None).await?;
        let credential =
            PasswordCredential::derive(request.password.as_str()).map_err(map_credential_error)?;

        let mut user = DirectoryUser::minimal(name, email, self.clock.utc());
        user.photo_url = photo_url;
        user.credential = Some(credential);
        self.users
            .insert(&user)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id, "directory user created");
        Ok(user)
    }

    async fn update(
        &self,
        id: &UserId,
        request: UpdateUserRequest,
    ) -> Result<DirectoryUser, Error> {
        let mut user = self.find_existing(id).await?;

        let mut errors = FieldErrors::default();
        let name = request
            .name
            .as_deref()
            .map(|raw| Self::check_name(&mut errors, raw));
        let email = request
            .email
            .as_deref()
            .map(|raw| self.check_email(&mut errors, raw));
        let photo = request
            .photo_url
            .as_deref()
            .map(|raw| Self::check_photo(&mut errors, raw));
        errors.into_result("invalid user")?;

        if let Some(Some(name)) = name {
            user.name = name;
        }
        if let Some(Some(email)) = email {
            if email != user.email {
                self.ensure_email_free(&email, Some(id)).await?;
                user.email = email;
            }
        }
        if let Some(Some(photo_url)) = photo {
            user.photo_url = photo_url;
        }
        if let Some(active) = request.active {
            user.active = active;
        }
        user.updated_at = self.clock.utc();

        self.users
            .update(&user)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id, active = user.active, "directory user updated");
        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.find_existing(id).await?;
        let references = self
            .users
            .count_ticket_references(id)
            .await
            .map_err(Self::map_user_error)?;
        if references > 0 {
            return Err(user_referenced(id, Some(references)));
        }
        self.users.delete(id).await.map_err(Self::map_user_error)?;
        info!(user_id = %id, "directory user deleted");
        Ok(())
    }

    async fn upsert_by_email(
        &self,
        email: &EmailAddress,
        name: &PersonName,
    ) -> Result<DirectoryUser, Error> {
        if let Some(existing) = self
            .users
            .find_by_email(email)
            .await
            .map_err(Self::map_user_error)?
        {
            return self.rename(existing, name).await;
        }

        let user = DirectoryUser::minimal(name.clone(), email.clone(), self.clock.utc());
        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, "directory user created by upsert");
                Ok(user)
            }
            Err(UserPersistenceError::DuplicateEmail { .. }) => {
                // Lost an insert race; the winner's record is authoritative.
                let winner = self
                    .users
                    .find_by_email(email)
                    .await
                    .map_err(Self::map_user_error)?
                    .ok_or_else(|| Error::internal("user disappeared during upsert race"))?;
                self.rename(winner, name).await
            }
            Err(err) => Err(Self::map_user_error(err)),
        }
    }
}

#[async_trait]
impl<U> UsersQuery for UserDirectoryService<U>
where
    U: UserRepository,
{
    async fn list_users(&self) -> Result<Vec<DirectoryUser>, Error> {
        self.users.list().await.map_err(Self::map_user_error)
    }

    async fn get_user(&self, id: &UserId) -> Result<DirectoryUser, Error> {
        self.find_existing(id).await
    }
}

#[cfg(test)]
#[path = "directory_service_tests.rs"]
mod tests;
