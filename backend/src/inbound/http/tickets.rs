//! Ticket HTTP handlers.
//!
//! ```text
//! POST /api/v1/tickets
//! GET  /api/v1/tickets?status=To%20Do&q=printer
//! GET  /api/v1/tickets/stats?by=status
//! GET  /api/v1/tickets/{id}
//! PUT  /api/v1/tickets/{id}
//! POST /api/v1/tickets/assignee-suggestion
//! ```
//!
//! Lookup fields travel as descriptions in requests and as `{id, description}`
//! objects in responses.

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    CreateTicketRequest, TicketFields, TicketListQuery, UpdateTicketRequest,
};
use crate::domain::{
    AssigneeSuggestionResult, Error, LookupCount, LookupEntry, Ticket, UserSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_dimension, parse_ticket_id};

/// Lookup reference embedded in ticket payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupRefBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "High")]
    pub description: String,
}

impl From<&LookupEntry> for LookupRefBody {
    fn from(entry: &LookupEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            description: entry.description.clone(),
        }
    }
}

/// User reference embedded in ticket payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRefBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
}

impl From<&UserSummary> for UserRefBody {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.to_string(),
            email: user.email.to_string(),
        }
    }
}

/// Ticket representation returned by every ticket endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub problem_description: String,
    pub priority: LookupRefBody,
    #[serde(rename = "type")]
    pub ticket_type: LookupRefBody,
    pub environment: LookupRefBody,
    pub origin: LookupRefBody,
    pub status: LookupRefBody,
    pub requester: UserRefBody,
    pub assignee: Option<UserRefBody>,
    pub evidence: String,
    pub attachments: Option<String>,
    pub resolution_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on the first move from "To Do" to "In Progress".
    pub handling_started_at: Option<DateTime<Utc>>,
    /// Set while the ticket is resolved.
    pub handling_ended_at: Option<DateTime<Utc>>,
}

impl From<&Ticket> for TicketBody {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            problem_description: ticket.problem_description.as_ref().to_owned(),
            priority: (&ticket.lookups.priority).into(),
            ticket_type: (&ticket.lookups.ticket_type).into(),
            environment: (&ticket.lookups.environment).into(),
            origin: (&ticket.lookups.origin).into(),
            status: (&ticket.lookups.status).into(),
            requester: (&ticket.requester).into(),
            assignee: ticket.assignee.as_ref().map(UserRefBody::from),
            evidence: ticket.evidence.as_ref().to_owned(),
            attachments: ticket.attachments.clone(),
            resolution_details: ticket.resolution_details.clone(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            handling_started_at: ticket.handling.started_at,
            handling_ended_at: ticket.handling.ended_at,
        }
    }
}

/// Writable ticket fields. Missing strings are treated as empty so every
/// problem is reported in one response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketFieldsBody {
    #[schema(example = "Printer on floor 3 rejects every job")]
    pub problem_description: String,
    #[schema(example = "High")]
    pub priority: String,
    #[serde(rename = "type")]
    #[schema(example = "Bug")]
    pub ticket_type: String,
    #[schema(example = "Production")]
    pub environment: String,
    #[schema(example = "Email")]
    pub origin: String,
    /// Blank or absent leaves the ticket unassigned.
    #[schema(format = "email")]
    pub assignee_email: Option<String>,
    pub evidence: String,
    pub attachments: Option<String>,
}

impl From<TicketFieldsBody> for TicketFields {
    fn from(body: TicketFieldsBody) -> Self {
        Self {
            problem_description: body.problem_description,
            priority: body.priority,
            ticket_type: body.ticket_type,
            environment: body.environment,
            origin: body.origin,
            assignee_email: body.assignee_email,
            evidence: body.evidence,
            attachments: body.attachments,
        }
    }
}

/// Full replacement payload for `PUT /tickets/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTicketBody {
    #[serde(flatten)]
    pub fields: TicketFieldsBody,
    #[schema(example = "In Progress")]
    pub status: String,
    pub resolution_details: Option<String>,
}

/// Query string accepted by `GET /tickets`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketListParams {
    /// Status description.
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub environment: Option<String>,
    pub origin: Option<String>,
    /// Requester email.
    pub requester: Option<String>,
    /// Assignee email.
    pub assignee: Option<String>,
    /// Case-insensitive substring of the problem description.
    pub q: Option<String>,
}

impl From<TicketListParams> for TicketListQuery {
    fn from(params: TicketListParams) -> Self {
        Self {
            status: params.status,
            priority: params.priority,
            ticket_type: params.ticket_type,
            environment: params.environment,
            origin: params.origin,
            requester: params.requester,
            assignee: params.assignee,
            text: params.q,
        }
    }
}

/// Query string accepted by `GET /tickets/stats`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketStatsParams {
    /// One of `status`, `priority` or `type`.
    pub by: String,
}

/// One row of a stats response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketCountBody {
    pub lookup: LookupRefBody,
    pub count: u64,
}

impl From<&LookupCount> for TicketCountBody {
    fn from(row: &LookupCount) -> Self {
        Self {
            lookup: (&row.entry).into(),
            count: row.count,
        }
    }
}

/// Request for `POST /tickets/assignee-suggestion`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionRequestBody {
    #[schema(example = "VPN drops every few minutes for the finance team")]
    pub description: String,
}

/// Suggested assignee with the model's justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBody {
    #[schema(format = "email")]
    pub email: String,
    pub reason: String,
}

impl From<AssigneeSuggestionResult> for SuggestionBody {
    fn from(result: AssigneeSuggestionResult) -> Self {
        Self {
            email: result.email.to_string(),
            reason: result.reason,
        }
    }
}

/// Open a ticket with the caller as requester.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = TicketFieldsBody,
    responses(
        (status = 201, description = "Ticket created", body = TicketBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TicketFieldsBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let ticket = state
        .tickets
        .create(CreateTicketRequest {
            caller,
            fields: payload.into_inner().into(),
        })
        .await?;
    Ok(HttpResponse::Created().json(TicketBody::from(&ticket)))
}

/// Replace a ticket's fields and move it to the requested status.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket identifier", format = "uuid")),
    request_body = UpdateTicketBody,
    responses(
        (status = 200, description = "Ticket updated", body = TicketBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Ticket not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "updateTicket"
)]
#[put("/tickets/{id}")]
pub async fn update_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateTicketBody>,
) -> ApiResult<web::Json<TicketBody>> {
    session.require_caller()?;
    let id = parse_ticket_id(&path.into_inner())?;
    let UpdateTicketBody {
        fields,
        status,
        resolution_details,
    } = payload.into_inner();
    let ticket = state
        .tickets
        .update(UpdateTicketRequest {
            id,
            fields: fields.into(),
            status,
            resolution_details,
        })
        .await?;
    Ok(web::Json(TicketBody::from(&ticket)))
}

/// List tickets, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(TicketListParams),
    responses(
        (status = 200, description = "Matching tickets", body = [TicketBody]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<TicketListParams>,
) -> ApiResult<web::Json<Vec<TicketBody>>> {
    session.require_caller()?;
    let tickets = state.tickets_query.list(params.into_inner().into()).await?;
    Ok(web::Json(tickets.iter().map(TicketBody::from).collect()))
}

/// Count tickets per status, priority or type.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/stats",
    params(TicketStatsParams),
    responses(
        (status = 200, description = "Counts per catalogue entry", body = [TicketCountBody]),
        (status = 400, description = "Unsupported dimension", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "ticketStats"
)]
#[get("/tickets/stats")]
pub async fn ticket_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<TicketStatsParams>,
) -> ApiResult<web::Json<Vec<TicketCountBody>>> {
    session.require_caller()?;
    let dimension = parse_dimension(&params.by)?;
    let rows = state.tickets_query.stats(dimension).await?;
    Ok(web::Json(rows.iter().map(TicketCountBody::from).collect()))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket identifier", format = "uuid")),
    responses(
        (status = 200, description = "Ticket", body = TicketBody),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Ticket not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TicketBody>> {
    session.require_caller()?;
    let id = parse_ticket_id(&path.into_inner())?;
    let ticket = state.tickets_query.get(&id).await?;
    Ok(web::Json(TicketBody::from(&ticket)))
}

/// Ask the model who should handle a problem.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/assignee-suggestion",
    request_body = SuggestionRequestBody,
    responses(
        (status = 200, description = "Suggested assignee", body = SuggestionBody),
        (status = 400, description = "Blank description", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Suggestion service failed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "suggestAssignee"
)]
#[post("/tickets/assignee-suggestion")]
pub async fn suggest_assignee(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SuggestionRequestBody>,
) -> ApiResult<web::Json<SuggestionBody>> {
    session.require_caller()?;
    let suggestion = state.suggestions.suggest(&payload.description).await?;
    Ok(web::Json(suggestion.into()))
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;
