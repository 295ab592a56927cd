//! Internal Diesel row structs for database operations.
//!
//! Rows never leave the persistence layer. Conversions into domain types
//! re-run domain validation; a failure means the stored data is corrupt and
//! is reported as a plain message for the caller to wrap in its query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    DirectoryUser, EmailAddress, LookupCategory, LookupEntry, LookupId, PasswordCredential,
    PersonName, PhotoUrl, Ticket, UserId, UserSummary,
};

use super::schema::{lookup_entries, tickets, users};

fn corrupt(id: Uuid, field: &str, err: impl std::fmt::Display) -> String {
    format!("stored row {id} has invalid {field}: {err}")
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub photo_url: Option<String>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<DirectoryUser, String> {
        let id = self.id;
        let name = PersonName::new(&self.name).map_err(|err| corrupt(id, "name", err))?;
        let email = EmailAddress::new(&self.email).map_err(|err| corrupt(id, "email", err))?;
        let photo_url = self
            .photo_url
            .as_deref()
            .map(PhotoUrl::new)
            .transpose()
            .map_err(|err| corrupt(id, "photo_url", err))?;
        let credential = self
            .password_hash
            .map(PasswordCredential::from_stored)
            .transpose()
            .map_err(|err| corrupt(id, "password_hash", err))?;
        Ok(DirectoryUser {
            id: UserId::from_uuid(id),
            name,
            email,
            active: self.active,
            photo_url,
            credential,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub(crate) fn summary(&self) -> Result<UserSummary, String> {
        self.clone().into_domain().map(|user| user.summary())
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub active: bool,
    pub photo_url: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a DirectoryUser> for NewUserRow<'a> {
    fn from(user: &'a DirectoryUser) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            active: user.active,
            photo_url: user.photo_url.as_ref().map(AsRef::as_ref),
            password_hash: user.credential.as_ref().map(PasswordCredential::as_phc),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Changeset for updating user records.
///
/// `treat_none_as_null` so clearing the photo or credential is persisted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserChangeset<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub active: bool,
    pub photo_url: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a DirectoryUser> for UserChangeset<'a> {
    fn from(user: &'a DirectoryUser) -> Self {
        Self {
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            active: user.active,
            photo_url: user.photo_url.as_ref().map(AsRef::as_ref),
            password_hash: user.credential.as_ref().map(PasswordCredential::as_phc),
            updated_at: user.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup entries
// ---------------------------------------------------------------------------

/// Row struct for reading from the lookup_entries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lookup_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LookupRow {
    pub id: Uuid,
    pub category: String,
    pub description: String,
}

impl LookupRow {
    pub(crate) fn into_domain(self) -> Result<LookupEntry, String> {
        let category: LookupCategory = self
            .category
            .parse()
            .map_err(|err| corrupt(self.id, "category", err))?;
        Ok(LookupEntry {
            id: LookupId::from_uuid(self.id),
            category,
            description: self.description,
        })
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Row struct for reading from the tickets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub problem_description: String,
    pub priority_id: Uuid,
    pub type_id: Uuid,
    pub environment_id: Uuid,
    pub origin_id: Uuid,
    pub status_id: Uuid,
    pub requester_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub evidence: String,
    pub attachments: Option<String>,
    pub resolution_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub handling_started_at: Option<DateTime<Utc>>,
    pub handling_ended_at: Option<DateTime<Utc>>,
}

impl TicketRow {
    pub(crate) fn lookup_ids(&self) -> [Uuid; 5] {
        [
            self.priority_id,
            self.type_id,
            self.environment_id,
            self.origin_id,
            self.status_id,
        ]
    }
}

/// Insertable struct for creating ticket records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub(crate) struct NewTicketRow<'a> {
    pub id: Uuid,
    pub problem_description: &'a str,
    pub priority_id: Uuid,
    pub type_id: Uuid,
    pub environment_id: Uuid,
    pub origin_id: Uuid,
    pub status_id: Uuid,
    pub requester_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub evidence: &'a str,
    pub attachments: Option<&'a str>,
    pub resolution_details: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub handling_started_at: Option<DateTime<Utc>>,
    pub handling_ended_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Ticket> for NewTicketRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        let lookups = &ticket.lookups;
        Self {
            id: *ticket.id.as_uuid(),
            problem_description: ticket.problem_description.as_ref(),
            priority_id: *lookups.priority.id.as_uuid(),
            type_id: *lookups.ticket_type.id.as_uuid(),
            environment_id: *lookups.environment.id.as_uuid(),
            origin_id: *lookups.origin.id.as_uuid(),
            status_id: *lookups.status.id.as_uuid(),
            requester_id: *ticket.requester.id.as_uuid(),
            assignee_id: ticket.assignee.as_ref().map(|user| *user.id.as_uuid()),
            evidence: ticket.evidence.as_ref(),
            attachments: ticket.attachments.as_deref(),
            resolution_details: ticket.resolution_details.as_deref(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            handling_started_at: ticket.handling.started_at,
            handling_ended_at: ticket.handling.ended_at,
        }
    }
}

/// Changeset for replacing a ticket; requester and creation time are absent.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketChangeset<'a> {
    pub problem_description: &'a str,
    pub priority_id: Uuid,
    pub type_id: Uuid,
    pub environment_id: Uuid,
    pub origin_id: Uuid,
    pub status_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub evidence: &'a str,
    pub attachments: Option<&'a str>,
    pub resolution_details: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
    pub handling_started_at: Option<DateTime<Utc>>,
    pub handling_ended_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Ticket> for TicketChangeset<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        let row = NewTicketRow::from(ticket);
        Self {
            problem_description: row.problem_description,
            priority_id: row.priority_id,
            type_id: row.type_id,
            environment_id: row.environment_id,
            origin_id: row.origin_id,
            status_id: row.status_id,
            assignee_id: row.assignee_id,
            evidence: row.evidence,
            attachments: row.attachments,
            resolution_details: row.resolution_details,
            updated_at: row.updated_at,
            handling_started_at: row.handling_started_at,
            handling_ended_at: row.handling_ended_at,
        }
    }
}
