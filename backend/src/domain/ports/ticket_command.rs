//! Driving port for ticket writes.
//!
//! Requests carry raw client strings: lookup fields hold descriptions and the
//! assignee an email. The service validates and resolves all of them before
//! it writes anything.

use async_trait::async_trait;

use crate::domain::{CallerIdentity, Error, Ticket, TicketId};

/// Fields shared by ticket creation and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFields {
    pub problem_description: String,
    pub priority: String,
    pub ticket_type: String,
    pub environment: String,
    pub origin: String,
    /// Email of the assignee; `None` or blank means unassigned.
    pub assignee_email: Option<String>,
    pub evidence: String,
    pub attachments: Option<String>,
}

/// Request to open a ticket on behalf of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicketRequest {
    /// Becomes the requester.
    pub caller: CallerIdentity,
    pub fields: TicketFields,
}

/// Full replacement of a ticket's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTicketRequest {
    pub id: TicketId,
    pub fields: TicketFields,
    /// Status description.
    pub status: String,
    pub resolution_details: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketCommand: Send + Sync {
    /// Validate, resolve and persist a new ticket in the default status.
    async fn create(&self, request: CreateTicketRequest) -> Result<Ticket, Error>;

    /// Replace a ticket's fields and apply the status transition rule.
    async fn update(&self, request: UpdateTicketRequest) -> Result<Ticket, Error>;
}
