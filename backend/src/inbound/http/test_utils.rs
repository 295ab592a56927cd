//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use super::session::SessionContext;
use super::session_config::SESSION_COOKIE_NAME;
use super::state::HttpState;
use crate::domain::ports::{
    MockAssigneeSuggestion, MockLoginService, MockLookupQuery, MockTicketCommand,
    MockTicketQuery, MockUserDirectoryCommand, MockUsersQuery,
};
use crate::domain::{CallerIdentity, EmailAddress, Error, PersonName, UserId};

/// Path of the helper route that signs the fixture caller in.
pub const TEST_LOGIN_PATH: &str = "/test/session";

/// Session middleware with a fresh key and the `Secure` flag off.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// The session cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Caller stored by [`login_route`].
pub fn fixture_caller() -> CallerIdentity {
    CallerIdentity {
        user_id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("id"),
        email: EmailAddress::new("ana@example.com").expect("email"),
        name: PersonName::new("Ana Souza").expect("name"),
    }
}

/// Register [`TEST_LOGIN_PATH`], which puts [`fixture_caller`] in the session.
pub fn login_route(cfg: &mut web::ServiceConfig) {
    cfg.route(
        TEST_LOGIN_PATH,
        web::post().to(|session: SessionContext| async move {
            session.persist_caller(&fixture_caller())?;
            Ok::<_, Error>(HttpResponse::Ok().finish())
        }),
    );
}

/// Sign in through [`login_route`] and return the session cookie.
pub async fn authenticated_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post().uri(TEST_LOGIN_PATH).to_request(),
    )
    .await;
    assert!(res.status().is_success(), "test login failed");
    session_cookie(&res)
}

/// State whose ports are strict mocks without expectations, adjusted by
/// `customise`. Any port the test did not configure panics when called.
pub fn state_with(customise: impl FnOnce(&mut HttpState)) -> HttpState {
    let mut state = HttpState {
        login: Arc::new(MockLoginService::new()),
        users: Arc::new(MockUsersQuery::new()),
        directory: Arc::new(MockUserDirectoryCommand::new()),
        tickets: Arc::new(MockTicketCommand::new()),
        tickets_query: Arc::new(MockTicketQuery::new()),
        lookups: Arc::new(MockLookupQuery::new()),
        suggestions: Arc::new(MockAssigneeSuggestion::new()),
    };
    customise(&mut state);
    state
}
