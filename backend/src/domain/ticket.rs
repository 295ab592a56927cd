//! Ticket aggregate and its value types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{EmailAddress, HandlingWindow, LookupCategory, LookupEntry, UserSummary};

/// Minimum length of a problem description, in characters.
pub const PROBLEM_DESCRIPTION_MIN: usize = 10;

/// Validation errors returned by the ticket value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketValidationError {
    #[error("ticket id must be a valid UUID")]
    InvalidId,
    #[error("problem description must be at least {min} characters")]
    ProblemDescriptionTooShort { min: usize },
    #[error("evidence must not be empty")]
    EmptyEvidence,
}

/// Stable ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Parse a ticket id from its string form.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        Uuid::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| TicketValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text description of the reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDescription(String);

impl ProblemDescription {
    /// Trim and validate the description length.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < PROBLEM_DESCRIPTION_MIN {
            return Err(TicketValidationError::ProblemDescriptionTooShort {
                min: PROBLEM_DESCRIPTION_MIN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ProblemDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Evidence supporting the report (logs, steps, screenshots reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence(String);

impl Evidence {
    /// Reject blank evidence.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyEvidence);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Evidence {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// The five resolved lookup references of a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLookups {
    pub priority: LookupEntry,
    pub ticket_type: LookupEntry,
    pub environment: LookupEntry,
    pub origin: LookupEntry,
    pub status: LookupEntry,
}

/// A support ticket with its collaborators resolved.
///
/// ## Invariants
/// - `requester` never changes after creation.
/// - `handling` only changes through status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub problem_description: ProblemDescription,
    pub lookups: TicketLookups,
    pub requester: UserSummary,
    pub assignee: Option<UserSummary>,
    pub evidence: Evidence,
    pub attachments: Option<String>,
    pub resolution_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub handling: HandlingWindow,
}

/// Read-side filter for ticket listings.
///
/// Lookup filters hold resolved entries; a description that does not resolve
/// never reaches the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<LookupEntry>,
    pub priority: Option<LookupEntry>,
    pub ticket_type: Option<LookupEntry>,
    pub environment: Option<LookupEntry>,
    pub origin: Option<LookupEntry>,
    pub requester: Option<EmailAddress>,
    pub assignee: Option<EmailAddress>,
    /// Case-insensitive substring of the problem description.
    pub text: Option<String>,
}

impl TicketFilter {
    /// Whether `ticket` satisfies every populated criterion.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let lookup_ok = |wanted: &Option<LookupEntry>, actual: &LookupEntry| {
            wanted.as_ref().is_none_or(|entry| entry.id == actual.id)
        };
        let text_ok = self.text.as_ref().is_none_or(|needle| {
            ticket
                .problem_description
                .as_ref()
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let assignee_ok = self.assignee.as_ref().is_none_or(|email| {
            ticket
                .assignee
                .as_ref()
                .is_some_and(|assignee| &assignee.email == email)
        });

        lookup_ok(&self.status, &ticket.lookups.status)
            && lookup_ok(&self.priority, &ticket.lookups.priority)
            && lookup_ok(&self.ticket_type, &ticket.lookups.ticket_type)
            && lookup_ok(&self.environment, &ticket.lookups.environment)
            && lookup_ok(&self.origin, &ticket.lookups.origin)
            && self
                .requester
                .as_ref()
                .is_none_or(|email| &ticket.requester.email == email)
            && assignee_ok
            && text_ok
    }
}

/// Dimension used to group ticket counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketDimension {
    Status,
    Priority,
    #[serde(rename = "type")]
    TicketType,
}

impl TicketDimension {
    /// Lookup category the dimension groups by.
    pub fn category(self) -> LookupCategory {
        match self {
            Self::Status => LookupCategory::Status,
            Self::Priority => LookupCategory::Priority,
            Self::TicketType => LookupCategory::TicketType,
        }
    }
}

/// Number of tickets pointing at one lookup entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupCount {
    pub entry: LookupEntry,
    pub count: u64,
}
