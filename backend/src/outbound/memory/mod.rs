//! In-process implementation of the repository ports.
//!
//! Backs the server when no database URL is configured and drives the HTTP
//! integration tests. It enforces the same constraints as the PostgreSQL
//! schema: unique emails, restricted deletes of referenced users, and
//! existing lookup and user references on ticket writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    LookupRepository, LookupRepositoryError, TicketRepository, TicketRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    DirectoryUser, EmailAddress, LookupEntry, LookupId, Ticket, TicketDimension, TicketFilter,
    TicketId, UserId, default_catalogue_entries,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, DirectoryUser>,
    lookups: HashMap<LookupId, LookupEntry>,
    tickets: HashMap<TicketId, Ticket>,
}

impl State {
    fn email_holder(&self, email: &EmailAddress) -> Option<&DirectoryUser> {
        self.users.values().find(|user| &user.email == email)
    }

    fn references(&self, id: &UserId) -> u64 {
        let count = self
            .tickets
            .values()
            .filter(|ticket| {
                ticket.requester.id == *id
                    || ticket.assignee.as_ref().is_some_and(|user| user.id == *id)
            })
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    fn check_references(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let lookups = &ticket.lookups;
        for entry in [
            &lookups.priority,
            &lookups.ticket_type,
            &lookups.environment,
            &lookups.origin,
            &lookups.status,
        ] {
            if !self.lookups.contains_key(&entry.id) {
                return Err(TicketRepositoryError::missing_reference(format!(
                    "lookup {}",
                    entry.id
                )));
            }
        }
        let users = std::iter::once(&ticket.requester).chain(ticket.assignee.as_ref());
        for user in users {
            if !self.users.contains_key(&user.id) {
                return Err(TicketRepositoryError::missing_reference(format!(
                    "user {}",
                    user.id
                )));
            }
        }
        Ok(())
    }

    /// Tickets store user references; names and emails are read live.
    fn hydrate(&self, ticket: &Ticket) -> Ticket {
        let mut ticket = ticket.clone();
        if let Some(user) = self.users.get(&ticket.requester.id) {
            ticket.requester = user.summary();
        }
        if let Some(assignee) = ticket.assignee.as_mut() {
            if let Some(user) = self.users.get(&assignee.id) {
                *assignee = user.summary();
            }
        }
        ticket
    }
}

/// Shared, cloneable in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Store seeded with the default lookup catalogue.
    pub fn seeded() -> Self {
        Self::with_lookups(
            default_catalogue_entries()
                .into_iter()
                .map(|(category, description)| LookupEntry::new(category, description)),
        )
    }

    pub fn with_lookups(entries: impl IntoIterator<Item = LookupEntry>) -> Self {
        let store = Self::default();
        store
            .lock()
            .lookups
            .extend(entries.into_iter().map(|entry| (entry.id, entry)));
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Each mutation is a single map operation, so poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if state.email_holder(&user.email).is_some() {
            return Err(UserPersistenceError::duplicate_email(user.email.as_ref()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &DirectoryUser) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if !state.users.contains_key(&user.id) {
            return Err(UserPersistenceError::not_found(user.id));
        }
        if state
            .email_holder(&user.email)
            .is_some_and(|holder| holder.id != user.id)
        {
            return Err(UserPersistenceError::duplicate_email(user.email.as_ref()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<DirectoryUser>, UserPersistenceError> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserPersistenceError> {
        Ok(self.lock().email_holder(email).cloned())
    }

    async fn list(&self) -> Result<Vec<DirectoryUser>, UserPersistenceError> {
        let mut users: Vec<DirectoryUser> = self.lock().users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.name
                .as_ref()
                .cmp(b.name.as_ref())
                .then_with(|| a.email.as_ref().cmp(b.email.as_ref()))
        });
        Ok(users)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if !state.users.contains_key(id) {
            return Err(UserPersistenceError::not_found(*id));
        }
        if state.references(id) > 0 {
            return Err(UserPersistenceError::referenced(*id));
        }
        state.users.remove(id);
        Ok(())
    }

    async fn count_ticket_references(&self, id: &UserId) -> Result<u64, UserPersistenceError> {
        Ok(self.lock().references(id))
    }
}

#[async_trait]
impl LookupRepository for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<LookupEntry>, LookupRepositoryError> {
        Ok(self.lock().lookups.values().cloned().collect())
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut state = self.lock();
        state.check_references(ticket)?;
        if state.tickets.contains_key(&ticket.id) {
            return Err(TicketRepositoryError::query(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        state.tickets.insert(ticket.id, ticket.clone());
        debug!(ticket_id = %ticket.id, "ticket stored in memory");
        Ok(())
    }

    async fn replace(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut state = self.lock();
        state.check_references(ticket)?;
        let Some(stored) = state.tickets.get(&ticket.id) else {
            return Err(TicketRepositoryError::not_found(ticket.id));
        };
        let mut replacement = ticket.clone();
        replacement.requester = stored.requester.clone();
        replacement.created_at = stored.created_at;
        state.tickets.insert(ticket.id, replacement);
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let state = self.lock();
        Ok(state.tickets.get(id).map(|ticket| state.hydrate(ticket)))
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let state = self.lock();
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .map(|ticket| state.hydrate(ticket))
            .filter(|ticket| filter.matches(ticket))
            .collect();
        tickets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(tickets)
    }

    async fn count_by(
        &self,
        dimension: TicketDimension,
    ) -> Result<Vec<(LookupId, u64)>, TicketRepositoryError> {
        let state = self.lock();
        let mut counts: HashMap<LookupId, u64> = HashMap::new();
        for ticket in state.tickets.values() {
            let entry = match dimension {
                TicketDimension::Status => &ticket.lookups.status,
                TicketDimension::Priority => &ticket.lookups.priority,
                TicketDimension::TicketType => &ticket.lookups.ticket_type,
            };
            *counts.entry(entry.id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
