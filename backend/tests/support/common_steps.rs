//! Steps shared by the HTTP behaviour suites.

use actix_web::http::Method;
use rstest_bdd_macros::{given, then, when};
use serde_json::{Value, json};

use crate::harness::{
    AGENT_PASSWORD, RequestSpec, SharedWorld, WorldFixture, last_body, last_status,
    perform_request, sign_in,
};

/// Create-ticket payload using catalogue descriptions.
pub(crate) fn ticket_payload(priority: &str, ticket_type: &str, assignee: Option<&str>) -> Value {
    json!({
        "problemDescription": "Invoices fail to export to PDF since this morning",
        "priority": priority,
        "type": ticket_type,
        "environment": "Production",
        "origin": "Email",
        "assigneeEmail": assignee,
        "evidence": "Screenshot of the export error dialog",
    })
}

/// Create a ticket and remember it when the API accepts it.
pub(crate) fn report_ticket(world: &SharedWorld, payload: Value) {
    perform_request(
        world,
        RequestSpec {
            method: Method::POST,
            path: "/api/v1/tickets",
            payload: Some(payload),
            with_session: true,
        },
    );
    if last_status(world) == 201 {
        world.borrow_mut().ticket = Some(last_body(world));
    }
}

#[given("a running helpdesk")]
fn a_running_helpdesk(world: &WorldFixture) {
    let _ = world;
}

#[given("the agent is signed in")]
fn the_agent_is_signed_in(world: &WorldFixture) {
    let world = world.world();
    sign_in(&world, AGENT_PASSWORD);
    assert_eq!(last_status(&world), 200, "agent login should succeed");
}

#[when("the agent reports a ticket with priority {priority} and type {ticket_type}")]
fn the_agent_reports_a_ticket(world: &WorldFixture, priority: String, ticket_type: String) {
    report_ticket(
        &world.world(),
        ticket_payload(
            priority.trim_matches('"'),
            ticket_type.trim_matches('"'),
            None,
        ),
    );
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &WorldFixture, status: u16) {
    let world = world.world();
    assert_eq!(
        last_status(&world),
        status,
        "unexpected body: {}",
        last_body(&world)
    );
}
