//! Integration tests for `DieselUserRepository` against embedded PostgreSQL.
//!
//! Covers the constraint translations the directory service relies on: the
//! email unique key, the ticket foreign keys that keep referenced users from
//! being deleted, and nullable columns being cleared on update.

use helpdesk::domain::ports::{
    LookupRepository, TicketRepository, UserPersistenceError, UserRepository,
};
use helpdesk::domain::{
    DirectoryUser, EmailAddress, Evidence, HandlingWindow, LookupCategory, LookupEntry,
    PersonName, PhotoUrl, ProblemDescription, STATUS_TODO, Ticket, TicketId, TicketLookups,
    UserId,
};
use helpdesk::outbound::persistence::{
    DbPool, DieselLookupRepository, DieselTicketRepository, DieselUserRepository, PoolConfig,
};
use helpdesk::test_support::fixture_instant;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::{
    handle_cluster_setup_failure, provision_template_database, shared_cluster,
};

struct TestContext {
    runtime: Runtime,
    users: DieselUserRepository,
    tickets: DieselTicketRepository,
    lookups: Vec<LookupEntry>,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn lookup(&self, category: LookupCategory, description: &str) -> LookupEntry {
        self.lookups
            .iter()
            .find(|entry| entry.category == category && entry.description == description)
            .cloned()
            .unwrap_or_else(|| panic!("seeded lookup {category}/{description}"))
    }

    fn insert_user(&self, name: &str, email: &str) -> DirectoryUser {
        let user = directory_user(name, email);
        self.block_on(self.users.insert(&user)).expect("user insert");
        user
    }

    fn fetch(&self, id: &UserId) -> Option<DirectoryUser> {
        self.block_on(self.users.find_by_id(id)).expect("fetch succeeds")
    }

    /// Files a ticket by `requester`, optionally assigned to `assignee`.
    fn file_ticket(&self, requester: &DirectoryUser, assignee: Option<&DirectoryUser>) {
        let ticket = Ticket {
            id: TicketId::random(),
            problem_description: ProblemDescription::new("Login page returns 500")
                .expect("valid description"),
            lookups: TicketLookups {
                priority: self.lookup(LookupCategory::Priority, "High"),
                ticket_type: self.lookup(LookupCategory::TicketType, "Bug"),
                environment: self.lookup(LookupCategory::Environment, "Production"),
                origin: self.lookup(LookupCategory::Origin, "Email"),
                status: self.lookup(LookupCategory::Status, STATUS_TODO),
            },
            requester: requester.summary(),
            assignee: assignee.map(DirectoryUser::summary),
            evidence: Evidence::new("stack trace attached").expect("valid evidence"),
            attachments: None,
            resolution_details: None,
            created_at: fixture_instant(),
            updated_at: fixture_instant(),
            handling: HandlingWindow::unset(),
        };
        self.block_on(self.tickets.insert(&ticket))
            .expect("ticket insert");
    }
}

fn directory_user(name: &str, email: &str) -> DirectoryUser {
    DirectoryUser::minimal(
        PersonName::new(name).expect("valid name"),
        EmailAddress::new(email).expect("valid email"),
        fixture_instant(),
    )
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;

    let config = PoolConfig::new(database.url().to_string())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    let lookups = runtime
        .block_on(DieselLookupRepository::new(pool.clone()).list_all())
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        users: DieselUserRepository::new(pool.clone()),
        tickets: DieselTicketRepository::new(pool),
        lookups,
        _database: database,
    })
}

#[fixture]
fn diesel_world() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
#[case::as_requester(true)]
#[case::as_assignee(false)]
fn delete_of_referenced_user_is_refused(
    diesel_world: Option<TestContext>,
    #[case] requester: bool,
) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: delete_of_referenced_user_is_refused skipped");
        return;
    };
    let ana = ctx.insert_user("Ana Souza", "ana@example.com");
    let bruno = ctx.insert_user("Bruno Lima", "bruno@example.com");
    if requester {
        ctx.file_ticket(&bruno, None);
    } else {
        ctx.file_ticket(&ana, Some(&bruno));
    }

    let references = ctx
        .block_on(ctx.users.count_ticket_references(&bruno.id))
        .expect("count succeeds");
    assert_eq!(references, 1);

    let err = ctx
        .block_on(ctx.users.delete(&bruno.id))
        .expect_err("foreign key keeps the row");
    assert_eq!(err, UserPersistenceError::referenced(bruno.id));
    assert_eq!(ctx.fetch(&bruno.id), Some(bruno));
}

#[rstest]
fn delete_of_unreferenced_user_removes_it(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: delete_of_unreferenced_user_removes_it skipped");
        return;
    };
    let ana = ctx.insert_user("Ana Souza", "ana@example.com");

    let references = ctx
        .block_on(ctx.users.count_ticket_references(&ana.id))
        .expect("count succeeds");
    assert_eq!(references, 0);
    ctx.block_on(ctx.users.delete(&ana.id))
        .expect("delete succeeds");
    assert_eq!(ctx.fetch(&ana.id), None);

    let err = ctx
        .block_on(ctx.users.delete(&ana.id))
        .expect_err("already gone");
    assert_eq!(err, UserPersistenceError::not_found(ana.id));
}

#[rstest]
fn duplicate_email_is_rejected_on_insert_and_update(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!(
            "SKIP-TEST-CLUSTER: duplicate_email_is_rejected_on_insert_and_update skipped"
        );
        return;
    };
    ctx.insert_user("Ana Souza", "ana@example.com");
    let mut bruno = ctx.insert_user("Bruno Lima", "bruno@example.com");

    let twin = directory_user("Ana Clone", "ana@example.com");
    let err = ctx
        .block_on(ctx.users.insert(&twin))
        .expect_err("email is taken");
    assert_eq!(err, UserPersistenceError::duplicate_email("ana@example.com"));

    bruno.email = EmailAddress::new("ana@example.com").expect("valid email");
    let err = ctx
        .block_on(ctx.users.update(&bruno))
        .expect_err("email is taken");
    assert_eq!(err, UserPersistenceError::duplicate_email("ana@example.com"));
}

#[rstest]
fn update_persists_deactivation_and_cleared_photo(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!(
            "SKIP-TEST-CLUSTER: update_persists_deactivation_and_cleared_photo skipped"
        );
        return;
    };
    let mut ana = directory_user("Ana Souza", "ana@example.com");
    ana.photo_url = Some(PhotoUrl::new("https://cdn.example.com/ana.png").expect("valid url"));
    ctx.block_on(ctx.users.insert(&ana)).expect("user insert");

    ana.name = PersonName::new("Ana Clara Souza").expect("valid name");
    ana.photo_url = None;
    ana.active = false;
    ana.updated_at = fixture_instant() + chrono::Duration::minutes(10);
    ctx.block_on(ctx.users.update(&ana)).expect("update succeeds");

    assert_eq!(ctx.fetch(&ana.id), Some(ana.clone()));
    let listed = ctx.block_on(ctx.users.list()).expect("list succeeds");
    assert_eq!(listed, vec![ana]);
}

#[rstest]
fn update_of_unknown_user_is_not_found(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: update_of_unknown_user_is_not_found skipped");
        return;
    };
    let ghost = directory_user("Ghost", "ghost@example.com");

    let err = ctx
        .block_on(ctx.users.update(&ghost))
        .expect_err("nothing to update");
    assert_eq!(err, UserPersistenceError::not_found(ghost.id));
}

#[rstest]
fn find_by_email_returns_the_stored_record(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: find_by_email_returns_the_stored_record skipped");
        return;
    };
    let ana = ctx.insert_user("Ana Souza", "ana@example.com");

    let email = EmailAddress::new("ANA@example.com").expect("valid email");
    let found = ctx
        .block_on(ctx.users.find_by_email(&email))
        .expect("fetch succeeds");
    assert_eq!(found, Some(ana));
}
