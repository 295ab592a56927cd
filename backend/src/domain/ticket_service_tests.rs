//! Tests for the ticket lifecycle service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockLookupRepository, MockTicketRepository, MockUserDirectoryCommand, MockUsersQuery,
};
use crate::domain::{
    CallerIdentity, DirectoryUser, ErrorCode, KnownAssignee, PersonName, STATUS_DONE,
    STATUS_IN_PROGRESS, default_catalogue_entries,
};
use crate::test_support::{MutableClock, fixture_instant};

type Service = TicketLifecycleService<
    MockTicketRepository,
    MockLookupRepository,
    MockUserDirectoryCommand,
    MockUsersQuery,
>;

#[fixture]
fn entries() -> Vec<LookupEntry> {
    default_catalogue_entries()
        .into_iter()
        .map(|(category, description)| LookupEntry::new(category, description))
        .collect()
}

fn entry(entries: &[LookupEntry], category: LookupCategory, description: &str) -> LookupEntry {
    entries
        .iter()
        .find(|entry| entry.category == category && entry.description == description)
        .cloned()
        .expect("seeded entry")
}

fn lookups_returning(entries: &[LookupEntry]) -> MockLookupRepository {
    let entries = entries.to_vec();
    let mut lookups = MockLookupRepository::new();
    lookups
        .expect_list_all()
        .returning(move || Ok(entries.clone()));
    lookups
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::new(raw).expect("valid email")
}

fn caller() -> CallerIdentity {
    CallerIdentity {
        user_id: crate::domain::UserId::random(),
        email: email("ana@example.com"),
        name: PersonName::new("Ana Souza").expect("name"),
    }
}

/// Directory record for `id` as currently stored.
fn stored_user(id: &crate::domain::UserId, name: &str, active: bool) -> DirectoryUser {
    let mut user = DirectoryUser::minimal(
        PersonName::new(name).expect("name"),
        email("ana@example.com"),
        fixture_instant(),
    );
    user.id = *id;
    user.active = active;
    user
}

/// Users double answering every lookup with an active "Ana Souza".
fn active_users() -> MockUsersQuery {
    let mut users = MockUsersQuery::new();
    users
        .expect_get_user()
        .returning(|id| Ok(stored_user(id, "Ana Souza", true)));
    users
}

/// Directory double that echoes minimal users for every upsert.
fn echoing_directory(expected_upserts: usize) -> MockUserDirectoryCommand {
    let mut directory = MockUserDirectoryCommand::new();
    directory
        .expect_upsert_by_email()
        .times(expected_upserts)
        .returning(|email, name| {
            Ok(DirectoryUser::minimal(
                name.clone(),
                email.clone(),
                fixture_instant(),
            ))
        });
    directory
}

fn roster() -> AssigneeRoster {
    AssigneeRoster::new(vec![KnownAssignee {
        email: email("bruno@example.com"),
        name: PersonName::new("Bruno Lima").expect("name"),
    }])
}

fn make_service(
    tickets: MockTicketRepository,
    lookups: MockLookupRepository,
    directory: MockUserDirectoryCommand,
) -> Service {
    make_service_with_users(tickets, lookups, directory, active_users())
}

fn make_service_with_users(
    tickets: MockTicketRepository,
    lookups: MockLookupRepository,
    directory: MockUserDirectoryCommand,
    users: MockUsersQuery,
) -> Service {
    TicketLifecycleService::new(
        Arc::new(tickets),
        Arc::new(lookups),
        Arc::new(directory),
        Arc::new(users),
        roster(),
        Arc::new(MutableClock::at_fixture_instant()),
    )
}

#[fixture]
fn fields() -> TicketFields {
    TicketFields {
        problem_description: "Checkout page returns 502 for EU customers".into(),
        priority: "High".into(),
        ticket_type: "Bug".into(),
        environment: "Production".into(),
        origin: "Email".into(),
        assignee_email: Some("bruno@example.com".into()),
        evidence: "HAR capture attached to the email thread".into(),
        attachments: None,
    }
}

fn stored_ticket(entries: &[LookupEntry], status: &str, handling: HandlingWindow) -> Ticket {
    let created = fixture_instant() - Duration::days(2);
    Ticket {
        id: TicketId::random(),
        problem_description: ProblemDescription::new("Checkout page returns 502").expect("desc"),
        lookups: TicketLookups {
            priority: entry(entries, LookupCategory::Priority, "High"),
            ticket_type: entry(entries, LookupCategory::TicketType, "Bug"),
            environment: entry(entries, LookupCategory::Environment, "Production"),
            origin: entry(entries, LookupCategory::Origin, "Email"),
            status: entry(entries, LookupCategory::Status, status),
        },
        requester: DirectoryUser::minimal(
            PersonName::new("Ana Souza").expect("name"),
            email("ana@example.com"),
            created,
        )
        .summary(),
        assignee: None,
        evidence: Evidence::new("HAR capture").expect("evidence"),
        attachments: None,
        resolution_details: None,
        created_at: created,
        updated_at: created,
        handling,
    }
}

fn update_request(ticket: &Ticket, fields: TicketFields, status: &str) -> UpdateTicketRequest {
    UpdateTicketRequest {
        id: ticket.id,
        fields,
        status: status.into(),
        resolution_details: None,
    }
}

#[rstest]
#[tokio::test]
async fn create_persists_ticket_in_default_status(entries: Vec<LookupEntry>, fields: TicketFields) {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_insert()
        .withf(|ticket| ticket.lookups.status.description == STATUS_TODO)
        .times(1)
        .return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(1));

    let ticket = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect("ticket created");

    assert_eq!(ticket.created_at, ticket.updated_at);
    assert_eq!(ticket.created_at, fixture_instant());
    assert_eq!(ticket.handling, HandlingWindow::unset());
    assert_eq!(ticket.lookups.priority.description, "High");
    assert_eq!(ticket.requester.email.as_ref(), "ana@example.com");
    let assignee = ticket.assignee.expect("assignee set");
    assert_eq!(assignee.name.as_ref(), "Bruno Lima");
}

#[rstest]
#[tokio::test]
async fn create_without_assignee_upserts_nobody(
    entries: Vec<LookupEntry>,
    mut fields: TicketFields,
) {
    fields.assignee_email = Some("   ".into());
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let ticket = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect("ticket created");
    assert!(ticket.assignee.is_none());
}

#[rstest]
#[tokio::test]
async fn unknown_assignee_is_named_after_local_part(
    entries: Vec<LookupEntry>,
    mut fields: TicketFields,
) {
    fields.assignee_email = Some("carla.dias@example.com".into());
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(1));

    let ticket = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect("ticket created");
    assert_eq!(
        ticket.assignee.map(|assignee| assignee.name.as_ref().to_owned()),
        Some("carla.dias".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn create_takes_requester_from_current_directory_record(
    entries: Vec<LookupEntry>,
    fields: TicketFields,
) {
    let caller = caller();
    let caller_id = caller.user_id;
    let mut users = MockUsersQuery::new();
    users
        .expect_get_user()
        .withf(move |id| *id == caller_id)
        .times(1)
        .returning(|id| Ok(stored_user(id, "Ana S. Souza", true)));
    let mut directory = MockUserDirectoryCommand::new();
    directory
        .expect_upsert_by_email()
        .withf(|email, _| email.as_ref() == "bruno@example.com")
        .times(1)
        .returning(|email, name| {
            Ok(DirectoryUser::minimal(
                name.clone(),
                email.clone(),
                fixture_instant(),
            ))
        });
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().return_once(|_| Ok(()));
    let service =
        make_service_with_users(tickets, lookups_returning(&entries), directory, users);

    let ticket = service
        .create(CreateTicketRequest { caller, fields })
        .await
        .expect("ticket created");

    assert_eq!(ticket.requester.id, caller_id);
    assert_eq!(ticket.requester.name.as_ref(), "Ana S. Souza");
}

#[rstest]
#[case::deactivated(Ok(false))]
#[case::deleted(Err(()))]
#[tokio::test]
async fn create_by_unusable_caller_is_unauthorised(
    entries: Vec<LookupEntry>,
    fields: TicketFields,
    #[case] stored: Result<bool, ()>,
) {
    let mut users = MockUsersQuery::new();
    users.expect_get_user().return_once(move |id| match stored {
        Ok(active) => Ok(stored_user(id, "Ana Souza", active)),
        Err(()) => Err(Error::not_found(format!("user {id} not found"))),
    });
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().never();
    let service = make_service_with_users(
        tickets,
        lookups_returning(&entries),
        echoing_directory(0),
        users,
    );

    let err = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect_err("caller rejected");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn create_names_every_unknown_lookup_and_writes_nothing(
    entries: Vec<LookupEntry>,
    mut fields: TicketFields,
) {
    fields.priority = "Urgent".into();
    fields.ticket_type = "Epic".into();
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().never();
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let err = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect_err("validation fails");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.message().contains("priority"));
    assert!(err.message().contains("type"));
    let details = err.details().expect("details");
    assert_eq!(details["missingLookups"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[tokio::test]
async fn create_reports_field_and_lookup_failures_together(
    entries: Vec<LookupEntry>,
    mut fields: TicketFields,
) {
    fields.problem_description = "short".into();
    fields.evidence = " ".into();
    fields.origin = "Pigeon".into();
    fields.assignee_email = Some("not an email".into());
    let service = make_service(
        MockTicketRepository::new(),
        lookups_returning(&entries),
        echoing_directory(0),
    );

    let err = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect_err("validation fails");

    let details = err.details().expect("details");
    let failing: Vec<&str> = details["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .filter_map(|field| field["field"].as_str())
        .collect();
    assert_eq!(
        failing,
        ["problemDescription", "origin", "assigneeEmail", "evidence"]
    );
}

#[rstest]
#[tokio::test]
async fn update_of_missing_ticket_is_not_found(fields: TicketFields) {
    let mut tickets = MockTicketRepository::new();
    tickets.expect_find_by_id().return_once(|_| Ok(None));
    let service = make_service(tickets, MockLookupRepository::new(), echoing_directory(0));

    let err = service
        .update(UpdateTicketRequest {
            id: TicketId::random(),
            fields,
            status: STATUS_IN_PROGRESS.into(),
            resolution_details: None,
        })
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_starts_handling_and_preserves_requester(
    entries: Vec<LookupEntry>,
    fields: TicketFields,
) {
    let existing = stored_ticket(&entries, STATUS_TODO, HandlingWindow::unset());
    let request = update_request(&existing, fields, STATUS_IN_PROGRESS);
    let requester = existing.requester.clone();
    let created_at = existing.created_at;
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    tickets.expect_replace().times(1).return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(1));

    let ticket = service.update(request).await.expect("updated");

    assert_eq!(ticket.handling.started_at, Some(fixture_instant()));
    assert_eq!(ticket.handling.ended_at, None);
    assert_eq!(ticket.requester, requester);
    assert_eq!(ticket.created_at, created_at);
    assert_eq!(ticket.updated_at, fixture_instant());
}

#[rstest]
#[tokio::test]
async fn update_clears_assignee_and_sets_resolution(
    entries: Vec<LookupEntry>,
    mut fields: TicketFields,
) {
    fields.assignee_email = None;
    let started: DateTime<Utc> = fixture_instant() - Duration::hours(5);
    let mut existing = stored_ticket(
        &entries,
        STATUS_IN_PROGRESS,
        HandlingWindow {
            started_at: Some(started),
            ended_at: None,
        },
    );
    existing.assignee = Some(existing.requester.clone());
    let mut request = update_request(&existing, fields, STATUS_DONE);
    request.resolution_details = Some("Rolled back the gateway config".into());
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    tickets.expect_replace().return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let ticket = service.update(request).await.expect("updated");

    assert!(ticket.assignee.is_none());
    assert_eq!(ticket.handling.started_at, Some(started));
    assert_eq!(ticket.handling.ended_at, Some(fixture_instant()));
    assert_eq!(
        ticket.resolution_details.as_deref(),
        Some("Rolled back the gateway config")
    );
}

#[rstest]
#[tokio::test]
async fn reopening_a_resolved_ticket_clears_end(entries: Vec<LookupEntry>, fields: TicketFields) {
    let started = fixture_instant() - Duration::hours(5);
    let existing = stored_ticket(
        &entries,
        STATUS_DONE,
        HandlingWindow {
            started_at: Some(started),
            ended_at: Some(fixture_instant() - Duration::hours(1)),
        },
    );
    let request = update_request(&existing, fields, STATUS_IN_PROGRESS);
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    tickets.expect_replace().return_once(|_| Ok(()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(1));

    let ticket = service.update(request).await.expect("updated");
    assert_eq!(ticket.handling.started_at, Some(started));
    assert_eq!(ticket.handling.ended_at, None);
}

#[rstest]
#[tokio::test]
async fn update_rejects_unknown_status(entries: Vec<LookupEntry>, fields: TicketFields) {
    let existing = stored_ticket(&entries, STATUS_TODO, HandlingWindow::unset());
    let request = update_request(&existing, fields, "Archived");
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    tickets.expect_replace().never();
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let err = service.update(request).await.expect_err("invalid status");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.message().contains("unknown status 'Archived'"));
}

#[rstest]
#[tokio::test]
async fn list_with_unresolvable_filter_is_empty(entries: Vec<LookupEntry>) {
    let mut tickets = MockTicketRepository::new();
    tickets.expect_list().never();
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let listed = service
        .list(TicketListQuery {
            status: Some("Archived".into()),
            ..TicketListQuery::default()
        })
        .await
        .expect("listing");
    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn list_passes_resolved_filter(entries: Vec<LookupEntry>) {
    let high = entry(&entries, LookupCategory::Priority, "High");
    let high_id = high.id;
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_list()
        .withf(move |filter| {
            filter.priority.as_ref().map(|entry| entry.id) == Some(high_id)
                && filter.text.as_deref() == Some("checkout")
                && filter
                    .requester
                    .as_ref()
                    .is_some_and(|email| email.as_ref() == "ana@example.com")
        })
        .return_once(|_| Ok(Vec::new()));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    service
        .list(TicketListQuery {
            priority: Some("High".into()),
            requester: Some("Ana@Example.com".into()),
            text: Some("  checkout ".into()),
            ..TicketListQuery::default()
        })
        .await
        .expect("listing");
}

#[rstest]
#[tokio::test]
async fn stats_include_zero_counts_in_description_order(entries: Vec<LookupEntry>) {
    let todo = entry(&entries, LookupCategory::Status, STATUS_TODO).id;
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_count_by()
        .withf(|dimension| *dimension == TicketDimension::Status)
        .return_once(move |_| Ok(vec![(todo, 4)]));
    let service = make_service(tickets, lookups_returning(&entries), echoing_directory(0));

    let stats = service
        .stats(TicketDimension::Status)
        .await
        .expect("stats");
    let summary: Vec<(&str, u64)> = stats
        .iter()
        .map(|count| (count.entry.description.as_str(), count.count))
        .collect();
    assert_eq!(
        summary,
        [("In Progress", 0), ("Resolved", 0), ("To Do", 4), ("Waiting", 0)]
    );
}

#[rstest]
#[tokio::test]
async fn lookup_outage_maps_to_service_unavailable(fields: TicketFields) {
    let mut lookups = MockLookupRepository::new();
    lookups
        .expect_list_all()
        .return_once(|| Err(LookupRepositoryError::connection("pool exhausted")));
    let service = make_service(MockTicketRepository::new(), lookups, echoing_directory(0));

    let err = service
        .create(CreateTicketRequest {
            caller: caller(),
            fields,
        })
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
