//! Server harness and shared world for HTTP behaviour suites.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. The server runs the production
//! [`build_app`] over an in-memory store and a clock the steps can advance.
//! The agent is seeded the way the server seeds its bootstrap user.
//! `WorldFixture` stops the server even if a step panics.

use std::cell::RefCell;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{HttpServer, web};
use awc::Client;
use helpdesk::domain::ports::CreateUserRequest;
use helpdesk::domain::{AssigneeRoster, EmailDomainPolicy, TRACE_ID_HEADER};
use helpdesk::inbound::http::health::HealthState;
use helpdesk::inbound::http::session_config::SessionSettings;
use helpdesk::outbound::memory::InMemoryStore;
use helpdesk::server::{
    AppDependencies, DomainConfig, build_app, build_http_state, build_suggestions,
    seed_bootstrap_user,
};
use helpdesk::test_support::MutableClock;
use mockable::Clock;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;
use zeroize::Zeroizing;

pub(crate) const AGENT_NAME: &str = "Ana Souza";
pub(crate) const AGENT_EMAIL: &str = "ana@example.com";
pub(crate) const AGENT_PASSWORD: &str = "correct-horse-battery";
const ALLOWED_DOMAINS: &str = "example.com";
const ROSTER: &str = "ana@example.com=Ana Souza;bruno@example.com=Bruno Lima";

pub(crate) struct HelpdeskWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) clock: Arc<MutableClock>,
    pub(crate) session_cookie: Option<String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_trace_id: Option<String>,
    /// Latest ticket representation returned by the API.
    pub(crate) ticket: Option<Value>,
    /// Identifier of the user registered by the scenario.
    pub(crate) user_id: Option<String>,
    pub(crate) remembered_start: Option<Value>,
}

pub(crate) type SharedWorld = Rc<RefCell<HelpdeskWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        shutdown(self.world.clone());
    }
}

fn shutdown(world: SharedWorld) {
    // `LocalSet` must be driven on the thread that owns it, so we hold the
    // world borrow while calling `block_on`. The future must not borrow it.
    let ctx = world.borrow();
    let server = ctx.server.clone();
    ctx.local.block_on(&ctx.runtime, async move {
        server.stop(true).await;
    });
}

pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

/// One HTTP call made by a step.
pub(crate) struct RequestSpec<'a> {
    pub(crate) method: Method,
    pub(crate) path: &'a str,
    pub(crate) payload: Option<Value>,
    pub(crate) with_session: bool,
}

/// Send `spec` and record status, trace id and JSON body (`Null` when empty).
pub(crate) fn perform_request(world: &SharedWorld, spec: RequestSpec<'_>) {
    let RequestSpec {
        method,
        path,
        payload,
        with_session,
    } = spec;
    let cookie = with_session.then(|| session_cookie_pair(world));
    let label = format!("{method} {path}");
    let (status, trace_id, body, set_cookie) = with_world_async(world, |base_url| async move {
        let mut request = Client::default().request(method, format!("{base_url}{path}"));
        if let Some(cookie) = cookie {
            request = request.insert_header((header::COOKIE, cookie));
        }
        let mut response = match payload {
            Some(payload) => request.send_json(&payload).await.expect(&label),
            None => request.send().await.expect(&label),
        };
        let trace_id = response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let status = response.status().as_u16();
        let bytes = response.body().await.expect(&label);
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect(&label)
        };
        (status, trace_id, body, set_cookie)
    });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_trace_id = trace_id;
    ctx.last_body = Some(body);
    if let Some(cookie) = set_cookie {
        ctx.session_cookie = Some(cookie);
    }
}

fn session_cookie_pair(world: &SharedWorld) -> String {
    world
        .borrow()
        .session_cookie
        .clone()
        .expect("session cookie")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_owned()
}

/// Sign in with `password` for the seeded agent.
pub(crate) fn sign_in(world: &SharedWorld, password: &str) {
    perform_request(
        world,
        RequestSpec {
            method: Method::POST,
            path: "/api/v1/login",
            payload: Some(serde_json::json!({
                "email": AGENT_EMAIL,
                "password": password,
            })),
            with_session: false,
        },
    );
}

pub(crate) fn last_status(world: &SharedWorld) -> u16 {
    world.borrow().last_status.expect("a request was made")
}

pub(crate) fn last_body(world: &SharedWorld) -> Value {
    world.borrow().last_body.clone().expect("a response body")
}

fn create_runtime_and_local() -> (Runtime, LocalSet) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    (runtime, local)
}

async fn spawn_helpdesk_server(deps: AppDependencies) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let server = HttpServer::new(move || build_app(deps.clone()))
        .disable_signals()
        .workers(1)
        .listen(listener)
        .map_err(|err| err.to_string())?
        .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

pub(crate) fn world() -> WorldFixture {
    let (runtime, local) = create_runtime_and_local();
    let clock = Arc::new(MutableClock::at_fixture_instant());
    let roster = AssigneeRoster::parse(ROSTER).expect("roster");
    let store = Arc::new(InMemoryStore::seeded());
    let http_state = build_http_state(
        Arc::clone(&store),
        Arc::clone(&store),
        store,
        DomainConfig {
            policy: EmailDomainPolicy::parse(ALLOWED_DOMAINS),
            suggestions: build_suggestions(None, roster.clone()).expect("suggestions"),
            roster,
            clock: Arc::clone(&clock) as Arc<dyn Clock>,
        },
    );

    let directory = Arc::clone(&http_state.directory);
    local
        .block_on(&runtime, async move {
            seed_bootstrap_user(
                directory.as_ref(),
                CreateUserRequest {
                    name: AGENT_NAME.to_owned(),
                    email: AGENT_EMAIL.to_owned(),
                    password: Zeroizing::new(AGENT_PASSWORD.to_owned()),
                    photo_url: None,
                },
            )
            .await
        })
        .expect("seed agent");

    let deps = AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: web::Data::new(http_state),
        session: SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        },
    };
    let (base_url, server) = local
        .block_on(&runtime, spawn_helpdesk_server(deps))
        .expect("server should start");

    let world = Rc::new(RefCell::new(HelpdeskWorld {
        runtime,
        local,
        base_url,
        server,
        clock,
        session_cookie: None,
        last_status: None,
        last_body: None,
        last_trace_id: None,
        ticket: None,
        user_id: None,
        remembered_start: None,
    }));

    WorldFixture { world }
}
