//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler plus the health probes and
//! the session cookie security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::lookups::LookupEntryBody;
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::tickets::{TicketBody, TicketCountBody, TicketFieldsBody};
use crate::inbound::http::users::UserBody;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Helpdesk API",
        description = "Support tickets, the user directory and the lookup catalogue."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::ticket_stats,
        crate::inbound::http::tickets::suggest_assignee,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket,
        crate::inbound::http::lookups::list_lookups,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserBody,
        TicketBody,
        TicketFieldsBody,
        TicketCountBody,
        LookupEntryBody
    )),
    tags(
        (name = "users", description = "Session and user directory"),
        (name = "tickets", description = "Ticket lifecycle, statistics and assignee suggestions"),
        (name = "lookups", description = "Lookup catalogue"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
