//! Driving port for ticket reads.

use async_trait::async_trait;

use crate::domain::{Error, LookupCount, Ticket, TicketDimension, TicketId};

/// Listing criteria as sent by clients.
///
/// Lookup criteria are descriptions; a description that does not resolve
/// matches no ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ticket_type: Option<String>,
    pub environment: Option<String>,
    pub origin: Option<String>,
    pub requester: Option<String>,
    pub assignee: Option<String>,
    pub text: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketQuery: Send + Sync {
    /// Fetch one ticket.
    async fn get(&self, id: &TicketId) -> Result<Ticket, Error>;

    /// Tickets matching `query`, newest first.
    async fn list(&self, query: TicketListQuery) -> Result<Vec<Ticket>, Error>;

    /// Ticket counts per catalogue entry of `dimension`, zero counts included.
    async fn stats(&self, dimension: TicketDimension) -> Result<Vec<LookupCount>, Error>;
}
