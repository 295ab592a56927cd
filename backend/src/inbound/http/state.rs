//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AssigneeSuggestion, LoginService, LookupQuery, TicketCommand, TicketQuery,
    UserDirectoryCommand, UsersQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub directory: Arc<dyn UserDirectoryCommand>,
    pub tickets: Arc<dyn TicketCommand>,
    pub tickets_query: Arc<dyn TicketQuery>,
    pub lookups: Arc<dyn LookupQuery>,
    pub suggestions: Arc<dyn AssigneeSuggestion>,
}
