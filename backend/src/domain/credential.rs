//! Opaque password credentials.
//!
//! Plain passwords never leave this module: callers hash on the way in and
//! verify on login. The stored form is an Argon2id PHC string.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Errors raised while deriving or checking credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The plain password is shorter than [`PASSWORD_MIN_LEN`].
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    /// Hashing failed inside the Argon2 implementation.
    #[error("failed to derive password credential: {message}")]
    Hashing { message: String },
    /// A stored credential is not a valid PHC string.
    #[error("stored credential is malformed: {message}")]
    Malformed { message: String },
}

/// Argon2id PHC string derived from a user's password.
///
/// `Debug` is redacted so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    /// Derive a credential from a plain password.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::PasswordCredential;
    ///
    /// let credential = PasswordCredential::derive("correct horse").expect("hash");
    /// assert!(credential.verify("correct horse").expect("verify"));
    /// assert!(!credential.verify("wrong horse").expect("verify"));
    /// ```
    pub fn derive(password: &str) -> Result<Self, CredentialError> {
        let password = Zeroizing::new(password.to_owned());
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialError::TooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hashing {
                message: err.to_string(),
            })?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a PHC string read back from storage.
    pub fn from_stored(phc: impl Into<String>) -> Result<Self, CredentialError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|err| CredentialError::Malformed {
            message: err.to_string(),
        })?;
        Ok(Self(phc))
    }

    /// Check a plain password against this credential.
    pub fn verify(&self, password: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(&self.0).map_err(|err| CredentialError::Malformed {
            message: err.to_string(),
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Stored PHC representation.
    pub fn as_phc(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordCredential(<redacted>)")
    }
}
