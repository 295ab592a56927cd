//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod lookups;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod users;
pub(crate) mod validation;

use actix_web::web;
use tracing::debug;

pub use error::ApiResult;

use crate::domain::Error;

/// JSON extractor configuration reporting malformed bodies with the domain
/// error envelope instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejecting malformed JSON body");
        Error::invalid_request(format!("malformed JSON body: {err}")).into()
    })
}

/// Query extractor configuration mirroring [`json_config`].
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejecting malformed query string");
        Error::invalid_request(format!("malformed query string: {err}")).into()
    })
}

/// Register every `/api/v1` handler on `cfg`.
///
/// `/tickets/stats` and `/tickets/assignee-suggestion` must precede
/// `/tickets/{id}`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(users::login)
        .service(users::logout)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(tickets::create_ticket)
        .service(tickets::list_tickets)
        .service(tickets::ticket_stats)
        .service(tickets::suggest_assignee)
        .service(tickets::get_ticket)
        .service(tickets::update_ticket)
        .service(lookups::list_lookups);
}
