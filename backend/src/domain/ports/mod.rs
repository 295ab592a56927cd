//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`AssigneeSuggester`]) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`, [`LoginService`],
//! [`AssigneeSuggestion`]) are implemented by domain services and consumed by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod assignee_suggester;
mod assignee_suggestion;
mod login_service;
mod lookup_query;
mod lookup_repository;
mod ticket_command;
mod ticket_query;
mod ticket_repository;
mod user_directory_command;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use assignee_suggester::MockAssigneeSuggester;
pub use assignee_suggester::{
    AssigneeSuggester, AssigneeSuggesterError, DisabledAssigneeSuggester, RawSuggestion,
};
#[cfg(test)]
pub use assignee_suggestion::MockAssigneeSuggestion;
pub use assignee_suggestion::AssigneeSuggestion;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use lookup_query::MockLookupQuery;
pub use lookup_query::LookupQuery;
#[cfg(test)]
pub use lookup_repository::MockLookupRepository;
pub use lookup_repository::{LookupRepository, LookupRepositoryError};
#[cfg(test)]
pub use ticket_command::MockTicketCommand;
pub use ticket_command::{CreateTicketRequest, TicketCommand, TicketFields, UpdateTicketRequest};
#[cfg(test)]
pub use ticket_query::MockTicketQuery;
pub use ticket_query::{TicketListQuery, TicketQuery};
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketRepository, TicketRepositoryError};
#[cfg(test)]
pub use user_directory_command::MockUserDirectoryCommand;
pub use user_directory_command::{CreateUserRequest, UpdateUserRequest, UserDirectoryCommand};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
