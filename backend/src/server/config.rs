//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{AssigneeSuggestion, CreateUserRequest};
use crate::domain::{AssigneeRoster, EmailDomainPolicy};
use crate::inbound::http::session_config::SessionSettings;
use crate::outbound::persistence::DbPool;

/// Domain policy shared by every service instance.
#[derive(Clone)]
pub struct DomainConfig {
    pub policy: EmailDomainPolicy,
    pub roster: AssigneeRoster,
    pub clock: Arc<dyn Clock>,
    pub suggestions: Arc<dyn AssigneeSuggestion>,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) domain: DomainConfig,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) bootstrap_user: Option<CreateUserRequest>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, domain: DomainConfig) -> Self {
        Self {
            session,
            bind_addr,
            domain,
            db_pool: None,
            bootstrap_user: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// Without one the server keeps all data in a process-local store seeded
    /// with the default lookup catalogue.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Directory user to create before serving, unless its email exists.
    #[must_use]
    pub fn with_bootstrap_user(mut self, request: CreateUserRequest) -> Self {
        self.bootstrap_user = Some(request);
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
