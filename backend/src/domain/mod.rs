//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities of the helpdesk (tickets,
//! directory users, lookup records) together with the services that enforce
//! their invariants. Nothing in here knows about HTTP or SQL; adapters talk to
//! the domain through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - Ticket and friends: the ticket aggregate and its status transition rule.
//! - DirectoryUser and friends: directory records and their value types.
//! - LookupCatalogue: description-keyed reference data.
//! - *Service types: implementations of the driving ports.

pub mod assignee_roster;
pub mod assignee_suggestion_service;
pub mod auth;
pub mod credential;
pub mod directory_service;
pub mod error;
pub mod field_errors;
pub mod login_service;
pub mod lookup;
pub mod lookup_service;
pub mod ports;
pub mod ticket;
pub mod ticket_lifecycle;
pub mod ticket_service;
pub mod trace_id;
pub mod user;

pub use self::assignee_roster::{AssigneeRoster, EmailDomainPolicy, KnownAssignee, RosterParseError};
pub use self::assignee_suggestion_service::{AssigneeSuggestionResult, AssigneeSuggestionService};
pub use self::auth::{CallerIdentity, LoginCredentials, LoginValidationError};
pub use self::credential::{CredentialError, PASSWORD_MIN_LEN, PasswordCredential};
pub use self::directory_service::UserDirectoryService;
pub use self::error::{
    Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER, diagnostics_exposed,
    expose_diagnostics,
};
pub use self::field_errors::{FieldErrorCode, FieldErrors};
pub use self::login_service::DirectoryLoginService;
pub use self::lookup::{
    LookupCatalogue, LookupCategory, LookupEntry, LookupId, LookupMiss, STATUS_DONE,
    STATUS_IN_PROGRESS, STATUS_TODO, UnknownLookupCategory, default_catalogue_entries,
};
pub use self::lookup_service::LookupCatalogueService;
pub use self::ticket::{
    Evidence, LookupCount, PROBLEM_DESCRIPTION_MIN, ProblemDescription, Ticket, TicketDimension,
    TicketFilter, TicketId, TicketLookups, TicketValidationError,
};
pub use self::ticket_lifecycle::{HandlingWindow, apply_status_transition};
pub use self::ticket_service::TicketLifecycleService;
pub use self::trace_id::TraceId;
pub use self::user::{
    DirectoryUser, EMAIL_MAX, EmailAddress, PERSON_NAME_MAX, PersonName, PhotoUrl, UserId,
    UserSummary, UserValidationError,
};
