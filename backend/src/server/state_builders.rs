//! Builders wiring repositories into the domain services behind [`HttpState`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{
    AssigneeSuggestion, CreateUserRequest, DisabledAssigneeSuggester, LookupRepository,
    TicketRepository, UserDirectoryCommand, UserRepository,
};
use crate::domain::{
    AssigneeRoster, AssigneeSuggestionService, DirectoryLoginService, Error, ErrorCode,
    LookupCatalogueService, TicketLifecycleService, UserDirectoryService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryStore;
use crate::outbound::persistence::{
    DbPool, DieselLookupRepository, DieselTicketRepository, DieselUserRepository,
};
use crate::outbound::suggestion::{ChatCompletionsSuggester, SuggesterEndpoint};

use super::DomainConfig;

/// Wire the services over the given repositories.
pub fn build_http_state<U, L, T>(
    users: Arc<U>,
    lookups: Arc<L>,
    tickets: Arc<T>,
    domain: DomainConfig,
) -> HttpState
where
    U: UserRepository + 'static,
    L: LookupRepository + 'static,
    T: TicketRepository + 'static,
{
    let DomainConfig {
        policy,
        roster,
        clock,
        suggestions,
    } = domain;
    let directory = Arc::new(UserDirectoryService::new(
        Arc::clone(&users),
        policy,
        Arc::clone(&clock),
    ));
    let ticket_service = Arc::new(TicketLifecycleService::new(
        tickets,
        Arc::clone(&lookups),
        Arc::clone(&directory),
        Arc::clone(&directory),
        roster,
        clock,
    ));

    HttpState {
        login: Arc::new(DirectoryLoginService::new(users)),
        users: directory.clone(),
        directory,
        tickets: ticket_service.clone(),
        tickets_query: ticket_service,
        lookups: Arc::new(LookupCatalogueService::new(lookups)),
        suggestions,
    }
}

/// State over Diesel repositories when a pool exists, otherwise over a
/// seeded in-memory store.
pub fn build_configured_state(pool: Option<&DbPool>, domain: DomainConfig) -> HttpState {
    match pool {
        Some(pool) => build_http_state(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselLookupRepository::new(pool.clone())),
            Arc::new(DieselTicketRepository::new(pool.clone())),
            domain,
        ),
        None => {
            warn!("no database configured; data lives in memory and is lost on exit");
            let store = Arc::new(InMemoryStore::seeded());
            build_http_state(Arc::clone(&store), Arc::clone(&store), store, domain)
        }
    }
}

/// Create the configured first user unless its email is already registered.
///
/// This is how the first agent gets in: every directory endpoint sits behind
/// the session.
///
/// # Errors
/// Returns the directory error for anything but an existing account, such
/// as an email outside the allowlist or a short password.
pub async fn seed_bootstrap_user(
    directory: &dyn UserDirectoryCommand,
    request: CreateUserRequest,
) -> Result<(), Error> {
    let email = request.email.clone();
    match directory.create(request).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "bootstrap user created");
            Ok(())
        }
        Err(err) if err.code() == ErrorCode::Conflict => {
            info!(%email, "bootstrap user already exists; leaving it unchanged");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Suggestion port over the chat completions client, or one that reports
/// suggestions as unavailable when no endpoint is configured.
///
/// # Errors
/// Returns [`std::io::Error`] when the HTTP client cannot be built.
pub fn build_suggestions(
    endpoint: Option<SuggesterEndpoint>,
    roster: AssigneeRoster,
) -> std::io::Result<Arc<dyn AssigneeSuggestion>> {
    match endpoint {
        Some(endpoint) => {
            info!(url = %endpoint.url, model = %endpoint.model, "assignee suggestions enabled");
            let suggester = ChatCompletionsSuggester::new(endpoint).map_err(|err| {
                std::io::Error::other(format!("failed to build suggestion client: {err}"))
            })?;
            Ok(Arc::new(AssigneeSuggestionService::new(
                Arc::new(suggester),
                roster,
            )))
        }
        None => Ok(Arc::new(AssigneeSuggestionService::new(
            Arc::new(DisabledAssigneeSuggester),
            roster,
        ))),
    }
}
