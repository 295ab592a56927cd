//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! Tickets are stored by reference. Reads hydrate lookup descriptions and
//! user summaries with two `eq_any` queries per batch rather than joins,
//! since `tickets` references `users` twice.

use std::collections::HashMap;
use std::iter;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::expression_methods::PgTextExpressionMethods;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{TicketRepository, TicketRepositoryError};
use crate::domain::{
    Evidence, HandlingWindow, LookupEntry, LookupId, ProblemDescription, Ticket, TicketDimension,
    TicketFilter, TicketId, TicketLookups, UserSummary,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, classify_pool_error};
use super::models::{LookupRow, NewTicketRow, TicketChangeset, TicketRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{lookup_entries, tickets, users};

/// Ticket storage over the `tickets` table.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TicketRepositoryError {
    classify_pool_error(error)
        .into_basic(TicketRepositoryError::connection, TicketRepositoryError::query)
}

fn map_diesel_error(error: diesel::result::Error) -> TicketRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::ForeignKeyViolation { constraint } => {
            TicketRepositoryError::missing_reference(
                constraint.unwrap_or_else(|| "unknown constraint".to_owned()),
            )
        }
        other => other.into_basic(
            TicketRepositoryError::connection,
            TicketRepositoryError::query,
        ),
    }
}

/// Escape `LIKE` metacharacters so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<TicketRow>,
) -> Result<Vec<Ticket>, TicketRepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let lookup_ids: Vec<Uuid> = rows.iter().flat_map(TicketRow::lookup_ids).collect();
    let user_ids: Vec<Uuid> = rows
        .iter()
        .flat_map(|row| iter::once(row.requester_id).chain(row.assignee_id))
        .collect();

    let lookup_rows: Vec<LookupRow> = lookup_entries::table
        .filter(lookup_entries::id.eq_any(lookup_ids))
        .select(LookupRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let lookups = lookup_rows
        .into_iter()
        .map(|row| row.into_domain().map(|entry| (*entry.id.as_uuid(), entry)))
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(TicketRepositoryError::query)?;

    let user_rows: Vec<UserRow> = users::table
        .filter(users::id.eq_any(user_ids))
        .select(UserRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let users = user_rows
        .iter()
        .map(|row| row.summary().map(|summary| (row.id, summary)))
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(TicketRepositoryError::query)?;

    rows.into_iter()
        .map(|row| assemble(row, &lookups, &users))
        .collect()
}

fn assemble(
    row: TicketRow,
    lookups: &HashMap<Uuid, LookupEntry>,
    users: &HashMap<Uuid, UserSummary>,
) -> Result<Ticket, TicketRepositoryError> {
    let ticket_id = row.id;
    let dangling = |what: &str, id: Uuid| {
        TicketRepositoryError::query(format!("ticket {ticket_id} references missing {what} {id}"))
    };
    let lookup = |id: Uuid| lookups.get(&id).cloned().ok_or_else(|| dangling("lookup", id));
    let user = |id: Uuid| users.get(&id).cloned().ok_or_else(|| dangling("user", id));

    let invalid = |err: crate::domain::TicketValidationError| {
        TicketRepositoryError::query(format!("stored ticket {ticket_id} is invalid: {err}"))
    };

    Ok(Ticket {
        id: TicketId::from_uuid(ticket_id),
        problem_description: ProblemDescription::new(&row.problem_description).map_err(invalid)?,
        lookups: TicketLookups {
            priority: lookup(row.priority_id)?,
            ticket_type: lookup(row.type_id)?,
            environment: lookup(row.environment_id)?,
            origin: lookup(row.origin_id)?,
            status: lookup(row.status_id)?,
        },
        requester: user(row.requester_id)?,
        assignee: row.assignee_id.map(user).transpose()?,
        evidence: Evidence::new(&row.evidence).map_err(invalid)?,
        attachments: row.attachments,
        resolution_details: row.resolution_details,
        created_at: row.created_at,
        updated_at: row.updated_at,
        handling: HandlingWindow {
            started_at: row.handling_started_at,
            ended_at: row.handling_ended_at,
        },
    })
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(tickets::table)
            .values(NewTicketRow::from(ticket))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(ticket_id = %ticket.id, "ticket row inserted");
        Ok(())
    }

    async fn replace(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(tickets::table.find(ticket.id.as_uuid()))
            .set(TicketChangeset::from(ticket))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(TicketRepositoryError::not_found(ticket.id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TicketRow> = tickets::table
            .find(id.as_uuid())
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(hydrate(&mut conn, vec![row]).await?.pop())
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lookup_uuid = |entry: &Option<LookupEntry>| entry.as_ref().map(|e| *e.id.as_uuid());

        let mut query = tickets::table.select(TicketRow::as_select()).into_boxed();
        if let Some(id) = lookup_uuid(&filter.status) {
            query = query.filter(tickets::status_id.eq(id));
        }
        if let Some(id) = lookup_uuid(&filter.priority) {
            query = query.filter(tickets::priority_id.eq(id));
        }
        if let Some(id) = lookup_uuid(&filter.ticket_type) {
            query = query.filter(tickets::type_id.eq(id));
        }
        if let Some(id) = lookup_uuid(&filter.environment) {
            query = query.filter(tickets::environment_id.eq(id));
        }
        if let Some(id) = lookup_uuid(&filter.origin) {
            query = query.filter(tickets::origin_id.eq(id));
        }
        if let Some(email) = &filter.requester {
            query = query.filter(
                tickets::requester_id.eq_any(
                    users::table
                        .filter(users::email.eq(email.as_ref().to_owned()))
                        .select(users::id),
                ),
            );
        }
        if let Some(email) = &filter.assignee {
            query = query.filter(
                tickets::assignee_id.eq_any(
                    users::table
                        .filter(users::email.eq(email.as_ref().to_owned()))
                        .select(users::id.nullable()),
                ),
            );
        }
        if let Some(text) = &filter.text {
            query = query.filter(tickets::problem_description.ilike(like_pattern(text)));
        }

        let rows: Vec<TicketRow> = query
            .order((tickets::created_at.desc(), tickets::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn count_by(
        &self,
        dimension: TicketDimension,
    ) -> Result<Vec<(LookupId, u64)>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let counts: Vec<(Uuid, i64)> = match dimension {
            TicketDimension::Status => {
                tickets::table
                    .group_by(tickets::status_id)
                    .select((tickets::status_id, count_star()))
                    .load::<(Uuid, i64)>(&mut conn)
                    .await
            }
            TicketDimension::Priority => {
                tickets::table
                    .group_by(tickets::priority_id)
                    .select((tickets::priority_id, count_star()))
                    .load::<(Uuid, i64)>(&mut conn)
                    .await
            }
            TicketDimension::TicketType => {
                tickets::table
                    .group_by(tickets::type_id)
                    .select((tickets::type_id, count_star()))
                    .load::<(Uuid, i64)>(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        counts
            .into_iter()
            .map(|(id, count)| {
                u64::try_from(count)
                    .map(|count| (LookupId::from_uuid(id), count))
                    .map_err(|_| TicketRepositoryError::query("negative ticket count"))
            })
            .collect()
    }
}
