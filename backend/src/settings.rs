//! Process configuration loaded via OrthoConfig.
//!
//! Values come from `HELPDESK_*` environment variables or the matching CLI
//! flags. Session cookie settings live apart in
//! [`crate::inbound::http::session_config`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ports::CreateUserRequest;
use crate::domain::{AssigneeRoster, EmailAddress, EmailDomainPolicy, RosterParseError};
use crate::outbound::suggestion::SuggesterEndpoint;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SUGGESTION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SUGGESTION_TIMEOUT_SECS: u64 = 20;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid suggestion URL '{value}': {message}")]
    SuggestionUrl { value: String, message: String },
    #[error(transparent)]
    Roster(#[from] RosterParseError),
    #[error("invalid bootstrap user: {message}")]
    BootstrapUser { message: String },
    #[error("failed to read bootstrap password at {path}: {source}")]
    BootstrapPasswordRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for the helpdesk server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct HelpdeskSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Comma-separated email domains accepted by directory writes.
    pub allowed_domains: Option<String>,
    /// Known assignees as `email=Name` pairs separated by `;`.
    pub assignee_roster: Option<String>,
    /// Chat completions endpoint; suggestions are disabled when absent.
    pub suggestion_url: Option<String>,
    pub suggestion_model: Option<String>,
    pub suggestion_api_key: Option<String>,
    pub suggestion_timeout_secs: Option<u64>,
    /// Directory user created at startup unless the email is already taken.
    pub bootstrap_email: Option<String>,
    /// Display name of the bootstrap user; defaults to the email local part.
    pub bootstrap_name: Option<String>,
    /// File holding the bootstrap password; wins over `bootstrap_password`.
    pub bootstrap_password_file: Option<String>,
    pub bootstrap_password: Option<String>,
    /// Return internal error messages to clients. Never enable in production.
    #[ortho_config(default = false)]
    pub expose_diagnostics: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl HelpdeskSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Allowlist of directory email domains; empty when unset.
    pub fn domain_policy(&self) -> EmailDomainPolicy {
        EmailDomainPolicy::parse(self.allowed_domains.as_deref().unwrap_or_default())
    }

    pub fn roster(&self) -> Result<AssigneeRoster, SettingsError> {
        Ok(AssigneeRoster::parse(
            self.assignee_roster.as_deref().unwrap_or_default(),
        )?)
    }

    /// First directory user, or `None` when no bootstrap email is set.
    ///
    /// The password is read from `bootstrap_password_file` with trailing line
    /// breaks removed, falling back to `bootstrap_password`.
    pub fn bootstrap_user(&self) -> Result<Option<CreateUserRequest>, SettingsError> {
        let Some(raw_email) = non_blank(self.bootstrap_email.as_deref()) else {
            return Ok(None);
        };
        let email = EmailAddress::new(raw_email).map_err(|err| SettingsError::BootstrapUser {
            message: err.to_string(),
        })?;
        let name = non_blank(self.bootstrap_name.as_deref())
            .map_or_else(|| email.local_part().to_owned(), str::to_owned);

        let password = match non_blank(self.bootstrap_password_file.as_deref()) {
            Some(path) => {
                let path = PathBuf::from(path);
                let contents = std::fs::read_to_string(&path)
                    .map(Zeroizing::new)
                    .map_err(|source| SettingsError::BootstrapPasswordRead {
                        path: path.clone(),
                        source,
                    })?;
                Zeroizing::new(contents.trim_end_matches(['\r', '\n']).to_owned())
            }
            None => self
                .bootstrap_password
                .clone()
                .filter(|password| !password.is_empty())
                .map(Zeroizing::new)
                .ok_or_else(|| SettingsError::BootstrapUser {
                    message: format!("no password configured for {email}"),
                })?,
        };

        Ok(Some(CreateUserRequest {
            name,
            email: email.as_ref().to_owned(),
            password,
            photo_url: None,
        }))
    }

    /// Suggestion endpoint, or `None` when suggestions are not configured.
    pub fn suggestion_endpoint(&self) -> Result<Option<SuggesterEndpoint>, SettingsError> {
        let Some(raw) = self
            .suggestion_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        else {
            return Ok(None);
        };
        let url = Url::parse(raw).map_err(|err| SettingsError::SuggestionUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })?;
        Ok(Some(SuggesterEndpoint {
            url,
            model: self
                .suggestion_model
                .clone()
                .unwrap_or_else(|| DEFAULT_SUGGESTION_MODEL.to_owned()),
            api_key: self
                .suggestion_api_key
                .clone()
                .filter(|key| !key.is_empty())
                .map(Zeroizing::new),
            timeout: Duration::from_secs(
                self.suggestion_timeout_secs
                    .unwrap_or(DEFAULT_SUGGESTION_TIMEOUT_SECS),
            ),
        }))
    }
}
