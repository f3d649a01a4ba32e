//! End-to-end ticket flows through the HTTP API.

mod common;

use axum::http::StatusCode;
use common::{next_matching, TestFixture};
use kds_core::{OrderStatus, Station, TicketStatus};
use kds_server::api::WsMessage;
use serde_json::{json, Value};

fn ticket_id(outcome: &Value, station: &str) -> String {
    outcome["created"]
        .as_array()
        .unwrap()
        .iter()
        .chain(outcome["existing"].as_array().unwrap())
        .find(|t| t["station"] == station)
        .map(|t| t["id"].as_str().unwrap().to_string())
        .unwrap_or_else(|| panic!("no {} ticket in {}", station, outcome))
}

async fn transition(
    fixture: &TestFixture,
    id: &str,
    expected: &str,
    next: &str,
) -> common::TestResponse {
    fixture
        .post(
            &format!("/api/v1/tickets/{}/transition", id),
            json!({ "expected": expected, "next": next }),
        )
        .await
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn test_fanout_creates_one_ticket_per_station() {
    let fixture = TestFixture::new().await;

    let response = fixture.place_mixed_order("order-1").await;
    assert_status!(response, StatusCode::CREATED);

    let created = response.body["created"].as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["station"], "KITCHEN");
    assert_eq!(created[1]["station"], "BAR");
    assert!(created.iter().all(|t| t["status"] == "NEW"));
    assert!(response.body["existing"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fanout_replay_is_idempotent() {
    let fixture = TestFixture::new().await;

    let first = fixture.place_mixed_order("order-1").await;
    let replay = fixture.place_mixed_order("order-1").await;

    assert_status!(replay, StatusCode::OK);
    assert!(replay.body["created"].as_array().unwrap().is_empty());
    assert_eq!(replay.body["existing"].as_array().unwrap().len(), 2);
    assert_eq!(
        ticket_id(&first.body, "KITCHEN"),
        ticket_id(&replay.body, "KITCHEN")
    );

    let tickets = fixture.get("/api/v1/orders/order-1/tickets").await;
    assert_eq!(tickets.body["tickets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_fanout_adds_missing_station_only() {
    let fixture = TestFixture::new().await;

    let kitchen_only = fixture
        .post(
            "/api/v1/orders/order-1/fanout",
            json!({ "lines": [{ "menu_item_id": "burger" }] }),
        )
        .await;
    assert_status!(kitchen_only, StatusCode::CREATED);

    let response = fixture.place_mixed_order("order-1").await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["created"][0]["station"], "BAR");
    assert_eq!(response.body["existing"][0]["station"], "KITCHEN");
}

#[tokio::test]
async fn test_fanout_rejects_empty_order() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/orders/order-1/fanout", json!({ "lines": [] }))
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("order-1"));
}

// ============================================================================
// Transitions
// ============================================================================

#[tokio::test]
async fn test_transition_happy_path() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "KITCHEN");

    let started = transition(&fixture, &id, "NEW", "IN_PROGRESS").await;
    assert_status!(started, StatusCode::OK);
    assert_eq!(started.body["status"], "IN_PROGRESS");

    let done = transition(&fixture, &id, "IN_PROGRESS", "COMPLETED").await;
    assert_status!(done, StatusCode::OK);

    let fetched = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_eq!(fetched.body["status"], "COMPLETED");
}

#[tokio::test]
async fn test_stale_transition_returns_conflict_and_leaves_ticket() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "BAR");

    // Two screens both saw NEW; the first one wins
    let winner = transition(&fixture, &id, "NEW", "IN_PROGRESS").await;
    assert_status!(winner, StatusCode::OK);

    let loser = transition(&fixture, &id, "NEW", "CANCELLED").await;
    assert_status!(loser, StatusCode::CONFLICT);
    assert_eq!(loser.body["expected"], "NEW");
    assert_eq!(loser.body["actual"], "IN_PROGRESS");
    assert_eq!(loser.body["ticket_id"], id.as_str());

    let fetched = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_eq!(fetched.body["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn test_invalid_edge_is_unprocessable() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "KITCHEN");

    let response = transition(&fixture, &id, "NEW", "COMPLETED").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = transition(&fixture, &id, "NEW", "DONE").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("DONE"));
}

#[tokio::test]
async fn test_terminal_ticket_cannot_move() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "KITCHEN");

    transition(&fixture, &id, "NEW", "CANCELLED").await;

    let response = transition(&fixture, &id, "CANCELLED", "IN_PROGRESS").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/tickets/does-not-exist").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = transition(&fixture, "does-not-exist", "NEW", "IN_PROGRESS").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recall_cycle() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "KITCHEN");

    for (expected, next) in [
        ("NEW", "IN_PROGRESS"),
        ("IN_PROGRESS", "RECALLED"),
        ("RECALLED", "IN_PROGRESS"),
        ("IN_PROGRESS", "COMPLETED"),
    ] {
        let response = transition(&fixture, &id, expected, next).await;
        assert_status!(response, StatusCode::OK);
    }
}

// ============================================================================
// Station queues
// ============================================================================

#[tokio::test]
async fn test_station_queue_is_fifo_and_hides_done() {
    let fixture = TestFixture::new().await;

    let mut kitchen_ids = Vec::new();
    for order_id in ["order-1", "order-2", "order-3"] {
        let order = fixture.place_mixed_order(order_id).await;
        kitchen_ids.push(ticket_id(&order.body, "KITCHEN"));
    }

    transition(&fixture, &kitchen_ids[0], "NEW", "IN_PROGRESS").await;
    transition(&fixture, &kitchen_ids[0], "IN_PROGRESS", "COMPLETED").await;

    let active = fixture.get("/api/v1/stations/kitchen/tickets").await;
    assert_status!(active, StatusCode::OK);
    assert_eq!(active.body["station"], "KITCHEN");
    let orders: Vec<&str> = active.body["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["order_id"].as_str().unwrap())
        .collect();
    assert_eq!(orders, vec!["order-2", "order-3"]);

    let all = fixture
        .get("/api/v1/stations/KITCHEN/tickets?include_done=true")
        .await;
    let orders: Vec<&str> = all.body["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["order_id"].as_str().unwrap())
        .collect();
    assert_eq!(orders, vec!["order-1", "order-2", "order-3"]);
}

#[tokio::test]
async fn test_station_queue_excludes_other_station() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/v1/orders/order-1/fanout",
            json!({ "lines": [{ "menu_item_id": "burger" }] }),
        )
        .await;

    let bar = fixture.get("/api/v1/stations/bar/tickets").await;
    assert!(bar.body["tickets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_station_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/stations/terrace/tickets").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// ============================================================================
// Order summary and indicator
// ============================================================================

#[tokio::test]
async fn test_summary_before_fanout_is_pending() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/orders/order-9/summary").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "PENDING");
    assert_eq!(response.body["ready_for_pickup"], false);
    assert!(response.body["indicator"]["dots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_tracks_both_stations() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let kitchen = ticket_id(&order.body, "KITCHEN");
    let bar = ticket_id(&order.body, "BAR");

    transition(&fixture, &kitchen, "NEW", "IN_PROGRESS").await;
    transition(&fixture, &kitchen, "IN_PROGRESS", "COMPLETED").await;

    let partial = fixture.get("/api/v1/orders/order-1/summary").await;
    assert_eq!(partial.body["status"], "IN_PROGRESS");
    assert_eq!(partial.body["ready_for_pickup"], false);

    transition(&fixture, &bar, "NEW", "IN_PROGRESS").await;
    transition(&fixture, &bar, "IN_PROGRESS", "COMPLETED").await;

    let ready = fixture.get("/api/v1/orders/order-1/summary").await;
    assert_eq!(ready.body["status"], "READY");
    assert_eq!(ready.body["ready_for_pickup"], true);

    let dots = ready.body["indicator"]["dots"].as_array().unwrap();
    assert_eq!(dots.len(), 2);
    assert_eq!(dots[0]["station"], "KITCHEN");
    assert_eq!(dots[0]["ring"], false);
    assert_eq!(dots[1]["station"], "BAR");
    assert_eq!(dots[1]["ring"], true);
    assert!(dots.iter().all(|d| d["color"] == "green"));
}

#[tokio::test]
async fn test_indicator_renders_arbitrary_pairs() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/indicator",
            json!({
                "tickets": [
                    { "station": "BAR", "status": "ON_FIRE" },
                    { "station": "KITCHEN", "status": "IN_PROGRESS" }
                ]
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let dots = response.body["dots"].as_array().unwrap();
    assert_eq!(dots[0]["station"], "KITCHEN");
    assert_eq!(dots[0]["color"], "yellow");
    assert_eq!(dots[0]["tooltip"], "Kitchen: In Progress");
    assert_eq!(dots[1]["color"], "neutral");
    assert_eq!(dots[1]["label"], "ON_FIRE");
    assert!(!response.body["text"].as_str().unwrap().is_empty());

    let empty = fixture
        .post("/api/v1/indicator", json!({ "tickets": null }))
        .await;
    assert_status!(empty, StatusCode::OK);
    assert!(empty.body["dots"].as_array().unwrap().is_empty());
    assert_eq!(empty.body["text"], "");
}

// ============================================================================
// Audit, push updates and ambient endpoints
// ============================================================================

#[tokio::test]
async fn test_transitions_are_audited_with_operator() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "KITCHEN");

    let response = fixture
        .post_as(
            "grill-2",
            &format!("/api/v1/tickets/{}/transition", id),
            json!({ "expected": "NEW", "next": "IN_PROGRESS" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    assert!(fixture.wait_for_audit("ticket_transitioned", 1).await);

    let audit = fixture
        .get("/api/v1/audit?order_id=order-1&event_type=ticket_transitioned")
        .await;
    assert_status!(audit, StatusCode::OK);
    assert_eq!(audit.body["total"], 1);
    assert_eq!(audit.body["events"][0]["actor"], "grill-2");
    assert_eq!(audit.body["events"][0]["ticket_id"], id.as_str());
}

#[tokio::test]
async fn test_conflicts_are_audited() {
    let fixture = TestFixture::new().await;
    let order = fixture.place_mixed_order("order-1").await;
    let id = ticket_id(&order.body, "BAR");

    transition(&fixture, &id, "NEW", "IN_PROGRESS").await;
    transition(&fixture, &id, "NEW", "IN_PROGRESS").await;

    assert!(fixture.wait_for_audit("transition_conflict", 1).await);
    let audit = fixture
        .get("/api/v1/audit?event_type=transition_conflict")
        .await;
    assert_eq!(audit.body["events"][0]["actor"], "anonymous");
}

#[tokio::test]
async fn test_order_ready_is_pushed() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.ws_broadcaster.subscribe();

    let order = fixture
        .post(
            "/api/v1/orders/order-1/fanout",
            json!({ "lines": [{ "menu_item_id": "lager", "category": "drinks" }] }),
        )
        .await;
    let id = ticket_id(&order.body, "BAR");

    transition(&fixture, &id, "NEW", "IN_PROGRESS").await;
    transition(&fixture, &id, "IN_PROGRESS", "COMPLETED").await;

    let update = next_matching(&mut rx, |msg| {
        matches!(msg, WsMessage::TicketUpdate { ticket, .. } if ticket.status == TicketStatus::Completed)
    })
    .await;
    assert!(update.is_some());

    let ready = next_matching(&mut rx, |msg| {
        matches!(msg, WsMessage::OrderStatus { status: OrderStatus::Ready, .. })
    })
    .await
    .expect("order ready was not pushed");

    match ready {
        WsMessage::OrderStatus {
            order_id,
            ready_for_pickup,
            indicator,
            ..
        } => {
            assert_eq!(order_id, "order-1");
            assert!(ready_for_pickup);
            assert_eq!(indicator.dots[0].station, Station::Bar);
        }
        other => panic!("unexpected message: {:?}", other),
    }

    // Ready orders are settled and no longer tracked
    assert_eq!(fixture.reconciler.last_status("order-1"), None);
    assert_eq!(fixture.reconciler.tracked_orders(), 0);
}

#[tokio::test]
async fn test_health_config_and_metrics() {
    let fixture = TestFixture::new().await;

    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let config = fixture.get("/api/v1/config").await;
    assert_eq!(config.body["routing"]["categories"]["drinks"], "BAR");

    fixture.place_mixed_order("order-1").await;
    let metrics = fixture.get("/api/v1/metrics").await;
    assert_status!(metrics, StatusCode::OK);
    let text = metrics.body.as_str().unwrap();
    assert!(text.contains("kds_http_requests_total"));
    assert!(text.contains("kds_fanouts_total"));
    assert!(text.contains("kds_tickets_by_status"));
}
