//! Lookup catalogue handler.
//!
//! ```text
//! GET /api/v1/lookups/{category}
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, LookupEntry};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_lookup_category;

/// Catalogue entry; clients send `description` back when writing tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntryBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "priority")]
    pub category: String,
    #[schema(example = "High")]
    pub description: String,
}

impl From<&LookupEntry> for LookupEntryBody {
    fn from(entry: &LookupEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            category: entry.category.as_str().to_owned(),
            description: entry.description.clone(),
        }
    }
}

/// List the entries of one category ordered by description.
#[utoipa::path(
    get,
    path = "/api/v1/lookups/{category}",
    params((
        "category" = String,
        Path,
        description = "One of priority, type, environment, origin, status"
    )),
    responses(
        (status = 200, description = "Catalogue entries", body = [LookupEntryBody]),
        (status = 400, description = "Unknown category", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["lookups"],
    operation_id = "listLookups"
)]
#[get("/lookups/{category}")]
pub async fn list_lookups(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<LookupEntryBody>>> {
    session.require_caller()?;
    let category = parse_lookup_category(&path.into_inner())?;
    let entries = state.lookups.list_category(category).await?;
    Ok(web::Json(entries.iter().map(LookupEntryBody::from).collect()))
}
