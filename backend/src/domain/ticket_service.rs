//! Ticket lifecycle domain service.
//!
//! Every write runs in two phases. The first phase loads a catalogue
//! snapshot, validates every field and resolves every lookup description,
//! collecting all failures into a single `invalid_request` error. Only when
//! that phase succeeds does the second phase load the requester, upsert the
//! assignee in the directory and persist the ticket, so a rejected request
//! leaves no partial state behind.
//!
//! The requester is read from the directory by the caller's user id on every
//! create. The identity held in the session only names the user; a user
//! deleted or deactivated since login cannot open tickets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    CreateTicketRequest, LookupRepository, LookupRepositoryError, TicketCommand, TicketFields,
    TicketListQuery, TicketQuery, TicketRepository, TicketRepositoryError, UpdateTicketRequest,
    UserDirectoryCommand, UsersQuery,
};
use crate::domain::{
    AssigneeRoster, CallerIdentity, EmailAddress, Error, ErrorCode, Evidence, FieldErrorCode,
    FieldErrors, HandlingWindow, LookupCatalogue, LookupCategory, LookupCount, LookupEntry,
    ProblemDescription, STATUS_TODO, Ticket, TicketDimension, TicketFilter, TicketId,
    TicketLookups, TicketValidationError, UserSummary, apply_status_transition,
};

/// Ticket fields once validated and resolved against the catalogue.
struct ResolvedFields {
    problem_description: ProblemDescription,
    priority: LookupEntry,
    ticket_type: LookupEntry,
    environment: LookupEntry,
    origin: LookupEntry,
    assignee_email: Option<EmailAddress>,
    evidence: Evidence,
    attachments: Option<String>,
}

/// Lifecycle service implementing [`TicketCommand`] and [`TicketQuery`].
///
/// `directory` upserts assignees; `users` resolves the requester.
#[derive(Clone)]
pub struct TicketLifecycleService<T, L, D, U> {
    tickets: Arc<T>,
    lookups: Arc<L>,
    directory: Arc<D>,
    users: Arc<U>,
    roster: AssigneeRoster,
    clock: Arc<dyn Clock>,
}

impl<T, L, D, U> TicketLifecycleService<T, L, D, U> {
    pub fn new(
        tickets: Arc<T>,
        lookups: Arc<L>,
        directory: Arc<D>,
        users: Arc<U>,
        roster: AssigneeRoster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            lookups,
            directory,
            users,
            roster,
            clock,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

fn ticket_not_found(id: &TicketId) -> Error {
    Error::not_found(format!("ticket {id} not found"))
}

fn ticket_field_code(err: &TicketValidationError) -> FieldErrorCode {
    match err {
        TicketValidationError::ProblemDescriptionTooShort { .. } => FieldErrorCode::TooShort,
        TicketValidationError::EmptyEvidence => FieldErrorCode::MissingField,
        TicketValidationError::InvalidId => FieldErrorCode::InvalidValue,
    }
}

fn resolve_lookup(
    catalogue: &LookupCatalogue,
    errors: &mut FieldErrors,
    field: &'static str,
    category: LookupCategory,
    description: &str,
) -> Option<LookupEntry> {
    match catalogue.resolve(category, description) {
        Ok(entry) => Some(entry),
        Err(miss) => {
            errors.push_lookup_miss(field, miss);
            None
        }
    }
}

/// Validate every field, recording all failures. Returns `None` when any
/// field failed.
fn resolve_fields(
    catalogue: &LookupCatalogue,
    fields: &TicketFields,
    errors: &mut FieldErrors,
) -> Option<ResolvedFields> {
    let problem_description = ProblemDescription::new(&fields.problem_description)
        .map_err(|err| {
            errors.push("problemDescription", ticket_field_code(&err), err.to_string());
        })
        .ok();
    let priority = resolve_lookup(
        catalogue,
        errors,
        "priority",
        LookupCategory::Priority,
        &fields.priority,
    );
    let ticket_type = resolve_lookup(
        catalogue,
        errors,
        "type",
        LookupCategory::TicketType,
        &fields.ticket_type,
    );
    let environment = resolve_lookup(
        catalogue,
        errors,
        "environment",
        LookupCategory::Environment,
        &fields.environment,
    );
    let origin = resolve_lookup(
        catalogue,
        errors,
        "origin",
        LookupCategory::Origin,
        &fields.origin,
    );
    let assignee_email = match non_blank(fields.assignee_email.as_deref()) {
        None => Some(None),
        Some(raw) => errors
            .check(
                "assigneeEmail",
                FieldErrorCode::InvalidValue,
                EmailAddress::new(raw),
            )
            .map(Some),
    };
    let evidence = Evidence::new(&fields.evidence)
        .map_err(|err| errors.push("evidence", ticket_field_code(&err), err.to_string()))
        .ok();

    Some(ResolvedFields {
        problem_description: problem_description?,
        priority: priority?,
        ticket_type: ticket_type?,
        environment: environment?,
        origin: origin?,
        assignee_email: assignee_email?,
        evidence: evidence?,
        attachments: non_blank(fields.attachments.as_deref()),
    })
}

/// Turn client criteria into a repository filter. Returns `None` when a
/// criterion cannot match any ticket.
fn resolve_filter(
    catalogue: &LookupCatalogue,
    query: &TicketListQuery,
) -> Option<TicketFilter> {
    let lookup = |category, raw: &Option<String>| match non_blank(raw.as_deref()) {
        None => Some(None),
        Some(description) => catalogue.resolve(category, &description).ok().map(Some),
    };
    let email = |raw: &Option<String>| match non_blank(raw.as_deref()) {
        None => Some(None),
        Some(value) => EmailAddress::new(value).ok().map(Some),
    };

    Some(TicketFilter {
        status: lookup(LookupCategory::Status, &query.status)?,
        priority: lookup(LookupCategory::Priority, &query.priority)?,
        ticket_type: lookup(LookupCategory::TicketType, &query.ticket_type)?,
        environment: lookup(LookupCategory::Environment, &query.environment)?,
        origin: lookup(LookupCategory::Origin, &query.origin)?,
        requester: email(&query.requester)?,
        assignee: email(&query.assignee)?,
        text: non_blank(query.text.as_deref()),
    })
}

impl<T, L, D, U> TicketLifecycleService<T, L, D, U>
where
    T: TicketRepository,
    L: LookupRepository,
    D: UserDirectoryCommand,
    U: UsersQuery,
{
    fn map_ticket_error(error: TicketRepositoryError) -> Error {
        match error {
            TicketRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("ticket repository unavailable: {message}"))
            }
            TicketRepositoryError::Query { message } => {
                Error::internal(format!("ticket repository error: {message}"))
            }
            TicketRepositoryError::NotFound { id } => ticket_not_found(&id),
            TicketRepositoryError::MissingReference { message } => {
                Error::conflict(format!("ticket references a missing record: {message}"))
            }
        }
    }

    fn map_lookup_error(error: LookupRepositoryError) -> Error {
        match error {
            LookupRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("lookup repository unavailable: {message}"))
            }
            LookupRepositoryError::Query { message } => {
                Error::internal(format!("lookup repository error: {message}"))
            }
        }
    }

    async fn catalogue(&self) -> Result<LookupCatalogue, Error> {
        let entries = self
            .lookups
            .list_all()
            .await
            .map_err(Self::map_lookup_error)?;
        Ok(LookupCatalogue::from_entries(entries))
    }

    async fn find_ticket(&self, id: &TicketId) -> Result<Ticket, Error> {
        self.tickets
            .find_by_id(id)
            .await
            .map_err(Self::map_ticket_error)?
            .ok_or_else(|| ticket_not_found(id))
    }

    /// Current directory record of the caller, or 401 when the user is gone
    /// or deactivated.
    async fn requester(&self, caller: &CallerIdentity) -> Result<UserSummary, Error> {
        let user = match self.users.get_user(&caller.user_id).await {
            Ok(user) => user,
            Err(err) if err.code() == ErrorCode::NotFound => {
                debug!(user_id = %caller.user_id, "ticket rejected: caller no longer exists");
                return Err(Error::unauthorized("session user no longer exists"));
            }
            Err(err) => return Err(err),
        };
        if !user.active {
            debug!(user_id = %caller.user_id, "ticket rejected: caller is deactivated");
            return Err(Error::unauthorized("session user is deactivated"));
        }
        Ok(user.summary())
    }

    async fn upsert_assignee(
        &self,
        email: Option<&EmailAddress>,
    ) -> Result<Option<UserSummary>, Error> {
        let Some(email) = email else {
            return Ok(None);
        };
        let name = self.roster.display_name_for(email).map_err(|err| {
            Error::internal(format!("cannot derive assignee name from {email}: {err}"))
        })?;
        let user = self.directory.upsert_by_email(email, &name).await?;
        Ok(Some(user.summary()))
    }
}

#[async_trait]
impl<T, L, D, U> TicketCommand for TicketLifecycleService<T, L, D, U>
where
    T: TicketRepository,
    L: LookupRepository,
    D: UserDirectoryCommand,
    U: UsersQuery,
{
    async fn create(&self, request: CreateTicketRequest) -> Result<Ticket, Error> {
        let catalogue = self.catalogue().await?;
        let mut errors = FieldErrors::default();
        let resolved = resolve_fields(&catalogue, &request.fields, &mut errors);
        errors.into_result("invalid ticket")?;
        let Some(resolved) = resolved else {
            return Err(Error::internal("validated ticket fields missing"));
        };
        let status = catalogue
            .resolve(LookupCategory::Status, STATUS_TODO)
            .map_err(|_| {
                Error::internal(format!("default status '{STATUS_TODO}' is not seeded"))
            })?;

        let requester = self.requester(&request.caller).await?;
        let assignee = self.upsert_assignee(resolved.assignee_email.as_ref()).await?;

        let now = self.clock.utc();
        let ticket = Ticket {
            id: TicketId::random(),
            problem_description: resolved.problem_description,
            lookups: TicketLookups {
                priority: resolved.priority,
                ticket_type: resolved.ticket_type,
                environment: resolved.environment,
                origin: resolved.origin,
                status,
            },
            requester,
            assignee,
            evidence: resolved.evidence,
            attachments: resolved.attachments,
            resolution_details: None,
            created_at: now,
            updated_at: now,
            handling: HandlingWindow::unset(),
        };
        self.tickets
            .insert(&ticket)
            .await
            .map_err(Self::map_ticket_error)?;
        info!(ticket_id = %ticket.id, requester = %ticket.requester.email, "ticket created");
        Ok(ticket)
    }

    async fn update(&self, request: UpdateTicketRequest) -> Result<Ticket, Error> {
        let existing = self.find_ticket(&request.id).await?;
        let catalogue = self.catalogue().await?;

        let mut errors = FieldErrors::default();
        let resolved = resolve_fields(&catalogue, &request.fields, &mut errors);
        let status = resolve_lookup(
            &catalogue,
            &mut errors,
            "status",
            LookupCategory::Status,
            &request.status,
        );
        errors.into_result("invalid ticket")?;
        let (Some(resolved), Some(status)) = (resolved, status) else {
            return Err(Error::internal("validated ticket fields missing"));
        };

        let assignee = self.upsert_assignee(resolved.assignee_email.as_ref()).await?;

        let now = self.clock.utc();
        let handling = apply_status_transition(
            &existing.lookups.status.description,
            &status.description,
            existing.handling,
            now,
        );
        if handling != existing.handling {
            debug!(
                ticket_id = %existing.id,
                from = %existing.lookups.status.description,
                to = %status.description,
                "handling window changed"
            );
        }

        let ticket = Ticket {
            id: existing.id,
            problem_description: resolved.problem_description,
            lookups: TicketLookups {
                priority: resolved.priority,
                ticket_type: resolved.ticket_type,
                environment: resolved.environment,
                origin: resolved.origin,
                status,
            },
            requester: existing.requester,
            assignee,
            evidence: resolved.evidence,
            attachments: resolved.attachments,
            resolution_details: non_blank(request.resolution_details.as_deref()),
            created_at: existing.created_at,
            updated_at: now,
            handling,
        };
        self.tickets
            .replace(&ticket)
            .await
            .map_err(Self::map_ticket_error)?;
        info!(
            ticket_id = %ticket.id,
            status = %ticket.lookups.status.description,
            "ticket updated"
        );
        Ok(ticket)
    }
}

#[async_trait]
impl<T, L, D, U> TicketQuery for TicketLifecycleService<T, L, D, U>
where
    T: TicketRepository,
    L: LookupRepository,
    D: UserDirectoryCommand,
    U: UsersQuery,
{
    async fn get(&self, id: &TicketId) -> Result<Ticket, Error> {
        self.find_ticket(id).await
    }

    async fn list(&self, query: TicketListQuery) -> Result<Vec<Ticket>, Error> {
        let catalogue = self.catalogue().await?;

        let Some(filter) = resolve_filter(&catalogue, &query) else {
            debug!("ticket filter cannot match; returning empty listing");
            return Ok(Vec::new());
        };

        self.tickets
            .list(&filter)
            .await
            .map_err(Self::map_ticket_error)
    }

    async fn stats(&self, dimension: TicketDimension) -> Result<Vec<LookupCount>, Error> {
        let catalogue = self.catalogue().await?;
        let counts: HashMap<_, _> = self
            .tickets
            .count_by(dimension)
            .await
            .map_err(Self::map_ticket_error)?
            .into_iter()
            .collect();

        Ok(catalogue
            .category(dimension.category())
            .into_iter()
            .map(|entry| {
                let count = counts.get(&entry.id).copied().unwrap_or(0);
                LookupCount { entry, count }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
