//! Session helpers keeping handlers free of framework-specific logic.
//!
//! The signed cookie carries the [`CallerIdentity`] established at login.
//! Ticket creation takes the requester from it without a directory lookup.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{CallerIdentity, Error};

pub(crate) const CALLER_KEY: &str = "caller";

/// Newtype wrapper exposing caller-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the authenticated caller, rotating the session identifier.
    pub fn persist_caller(&self, caller: &CallerIdentity) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(CALLER_KEY, caller)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The caller in the session, if any.
    ///
    /// An undecodable entry is treated as absent.
    pub fn caller(&self) -> Option<CallerIdentity> {
        self.0
            .get::<CallerIdentity>(CALLER_KEY)
            .unwrap_or_else(|error| {
                warn!(%error, "discarding unreadable caller in session cookie");
                None
            })
    }

    /// Require an authenticated caller or fail with `401 Unauthorized`.
    pub fn require_caller(&self) -> Result<CallerIdentity, Error> {
        self.caller()
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop every session entry and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
