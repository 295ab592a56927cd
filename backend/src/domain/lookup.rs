//! Lookup catalogue: small description-keyed reference tables.
//!
//! Tickets refer to priority, type, environment, origin and status records.
//! Clients address those records by their human-readable description; the
//! catalogue turns a description into a typed [`LookupEntry`] once, at the
//! boundary, so the rest of the domain works with identities.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Status description meaning "not started".
pub const STATUS_TODO: &str = "To Do";
/// Status description meaning "being handled".
pub const STATUS_IN_PROGRESS: &str = "In Progress";
/// Status description meaning "finished".
pub const STATUS_DONE: &str = "Resolved";

/// Category of a lookup record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LookupCategory {
    Priority,
    #[serde(rename = "type")]
    TicketType,
    Environment,
    Origin,
    Status,
}

impl LookupCategory {
    /// Every category, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Priority,
        Self::TicketType,
        Self::Environment,
        Self::Origin,
        Self::Status,
    ];

    /// Storage and URL form of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::TicketType => "type",
            Self::Environment => "environment",
            Self::Origin => "origin",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for LookupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lookup category: {0}")]
pub struct UnknownLookupCategory(pub String);

impl FromStr for LookupCategory {
    type Err = UnknownLookupCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownLookupCategory(s.to_owned()))
    }
}

/// Identity of a lookup record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupId(Uuid);

impl LookupId {
    /// Wrap a UUID read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved lookup record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupEntry {
    pub id: LookupId,
    pub category: LookupCategory,
    pub description: String,
}

impl LookupEntry {
    /// Build an entry with a fresh identity.
    pub fn new(category: LookupCategory, description: impl Into<String>) -> Self {
        Self {
            id: LookupId::random(),
            category,
            description: description.into(),
        }
    }
}

/// A description that matched no record of its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMiss {
    pub category: LookupCategory,
    pub description: String,
}

/// Snapshot of the whole catalogue keyed by `(category, description)`.
///
/// Matching is exact and case-sensitive.
///
/// # Examples
/// ```
/// use helpdesk::domain::{LookupCatalogue, LookupCategory, LookupEntry};
///
/// let high = LookupEntry::new(LookupCategory::Priority, "High");
/// let catalogue = LookupCatalogue::from_entries([high]);
/// assert!(catalogue.resolve(LookupCategory::Priority, "High").is_ok());
/// assert!(catalogue.resolve(LookupCategory::Priority, "high").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LookupCatalogue {
    entries: HashMap<(LookupCategory, String), LookupEntry>,
}

impl LookupCatalogue {
    /// Index the given entries.
    pub fn from_entries(entries: impl IntoIterator<Item = LookupEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| ((entry.category, entry.description.clone()), entry))
            .collect();
        Self { entries }
    }

    /// Resolve a description within a category.
    pub fn resolve(
        &self,
        category: LookupCategory,
        description: &str,
    ) -> Result<LookupEntry, LookupMiss> {
        self.entries
            .get(&(category, description.to_owned()))
            .cloned()
            .ok_or_else(|| LookupMiss {
                category,
                description: description.to_owned(),
            })
    }

    /// Entries of one category ordered by description.
    pub fn category(&self, category: LookupCategory) -> Vec<LookupEntry> {
        let mut entries: Vec<LookupEntry> = self
            .entries
            .values()
            .filter(|entry| entry.category == category)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.description.cmp(&b.description));
        entries
    }
}

/// Catalogue rows installed on a fresh database.
pub fn default_catalogue_entries() -> Vec<(LookupCategory, &'static str)> {
    use LookupCategory::{Environment, Origin, Priority, Status, TicketType};
    vec![
        (Priority, "Low"),
        (Priority, "Medium"),
        (Priority, "High"),
        (Priority, "Critical"),
        (TicketType, "Bug"),
        (TicketType, "Feature Request"),
        (TicketType, "Question"),
        (TicketType, "Incident"),
        (Environment, "Production"),
        (Environment, "Staging"),
        (Environment, "Development"),
        (Origin, "Email"),
        (Origin, "Phone"),
        (Origin, "Chat"),
        (Origin, "Web Portal"),
        (Status, STATUS_TODO),
        (Status, STATUS_IN_PROGRESS),
        (Status, "Waiting"),
        (Status, STATUS_DONE),
    ]
}
