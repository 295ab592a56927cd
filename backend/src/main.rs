//! Helpdesk entry-point: loads configuration, prepares persistence and serves
//! the REST API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use helpdesk::domain::expose_diagnostics;
use helpdesk::inbound::http::health::HealthState;
use helpdesk::inbound::http::session_config::{BuildMode, session_settings_from_env};
use helpdesk::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use helpdesk::server::{DomainConfig, ServerConfig, build_suggestions, create_server};
use helpdesk::settings::HelpdeskSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = HelpdeskSettings::load()
        .map_err(|e| io::Error::other(format!("failed to load settings: {e}")))?;
    expose_diagnostics(settings.expose_diagnostics);
    if settings.expose_diagnostics {
        warn!("internal error messages are exposed to clients");
    }

    let session =
        session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let roster = settings.roster().map_err(io::Error::other)?;
    let endpoint = settings.suggestion_endpoint().map_err(io::Error::other)?;
    let bootstrap_user = settings.bootstrap_user().map_err(io::Error::other)?;

    let domain = DomainConfig {
        policy: settings.domain_policy(),
        suggestions: build_suggestions(endpoint, roster.clone())?,
        roster,
        clock: Arc::new(DefaultClock),
    };
    let mut config = ServerConfig::new(session, bind_addr, domain);

    if let Some(database_url) = settings.database_url() {
        run_pending_migrations(database_url)
            .await
            .map_err(|e| io::Error::other(format!("failed to apply migrations: {e}")))?;
        let pool_config = PoolConfig::new(database_url).with_max_size(settings.pool_max_size());
        info!(url = %pool_config.redacted_url(), "connecting to database");
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|e| io::Error::other(format!("failed to create database pool: {e}")))?;
        config = config.with_db_pool(pool);
    } else if bootstrap_user.is_none() {
        warn!("in-memory store without HELPDESK_BOOTSTRAP_EMAIL; nobody can sign in");
    }
    if let Some(request) = bootstrap_user {
        config = config.with_bootstrap_user(request);
    }

    let health_state = web::Data::new(HealthState::new());
    info!(addr = %config.bind_addr(), "starting helpdesk server");
    let server = create_server(health_state, config).await?;
    server.await
}
