//! Port abstraction for ticket persistence adapters and their errors.
//!
//! Repositories store tickets by lookup and user identity and hand them back
//! hydrated: every lookup reference carries its description and every user
//! reference its name and email.

use async_trait::async_trait;

use crate::domain::{LookupId, Ticket, TicketDimension, TicketFilter, TicketId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ticket repository query failed: {message}",
        /// The ticket to replace does not exist.
        NotFound { id: TicketId } => "ticket {id} not found",
        /// A lookup or user reference points at a missing record.
        MissingReference { message: String } => "ticket reference is dangling: {message}",
    }
}

/// Ticket storage port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a new ticket.
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Overwrite every mutable column of an existing ticket.
    ///
    /// Requester and creation time are never written by this call.
    async fn replace(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Fetch a ticket by identifier.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// Tickets matching `filter`, newest first.
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Ticket counts per lookup entry of `dimension`.
    ///
    /// Entries without tickets may be omitted.
    async fn count_by(
        &self,
        dimension: TicketDimension,
    ) -> Result<Vec<(LookupId, u64)>, TicketRepositoryError>;
}
