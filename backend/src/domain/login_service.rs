//! Password login against directory credentials.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ports::{LoginService, UserPersistenceError, UserRepository};
use crate::domain::{CallerIdentity, Error, LoginCredentials};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Implements [`LoginService`] over a [`UserRepository`].
///
/// Unknown emails, inactive users, users without a credential and wrong
/// passwords all produce the same `unauthorized` error.
#[derive(Clone)]
pub struct DirectoryLoginService<U> {
    users: Arc<U>,
}

impl<U> DirectoryLoginService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> LoginService for DirectoryLoginService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<CallerIdentity, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(|err| match err {
                UserPersistenceError::Connection { message } => {
                    Error::service_unavailable(format!("user repository unavailable: {message}"))
                }
                other => Error::internal(format!("user repository error: {other}")),
            })?;

        let Some(user) = user.filter(|user| user.active) else {
            debug!("login rejected: no active user for email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let Some(credential) = user.credential.as_ref() else {
            debug!(user_id = %user.id, "login rejected: user has no credential");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        match credential.verify(credentials.password()) {
            Ok(true) => Ok(CallerIdentity::from(&user)),
            Ok(false) => Err(Error::unauthorized(INVALID_CREDENTIALS)),
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "stored credential is unusable");
                Err(Error::unauthorized(INVALID_CREDENTIALS))
            }
        }
    }
}
