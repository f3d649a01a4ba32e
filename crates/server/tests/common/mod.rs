//! In-process test fixture.
//!
//! Builds the full router over a temporary SQLite database with the
//! reconciler running, so requests exercise the same wiring as the binary.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::ServiceExt;

use kds_core::{
    create_audit_system, AuditStore, Config, DatabaseConfig, OrderFanout, OrderReconciler,
    OrderSummary, OrderUpdateCallback, RoutingConfig, SqliteAuditStore, SqliteTicketStore,
    Station, StationRouter, TicketService,
};
use kds_server::api::{create_router, WsBroadcaster, WsMessage};
use kds_server::state::AppState;

pub use kds_core::testing::fixtures;

pub struct TestFixture {
    pub router: Router,
    pub tickets: TicketService,
    pub reconciler: Arc<OrderReconciler>,
    pub ws_broadcaster: WsBroadcaster,
    pub audit_store: Arc<dyn AuditStore>,
    /// Keeps the database alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Drinks route to the bar, everything else to the kitchen.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut routing = RoutingConfig::default();
        routing.categories.insert("drinks".to_string(), Station::Bar);

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            routing: routing.clone(),
            ..Default::default()
        };

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let ticket_store =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let tickets = TicketService::new(ticket_store).with_audit(audit_handle.clone());
        let fanout = OrderFanout::new(tickets.clone(), StationRouter::new(routing))
            .with_audit(audit_handle.clone());

        let ws_broadcaster = WsBroadcaster::default();
        ws_broadcaster.forward_ticket_events(&tickets);

        let broadcaster = ws_broadcaster.clone();
        let on_update: OrderUpdateCallback = Arc::new(move |summary: &OrderSummary| {
            broadcaster.order_status(summary);
        });
        let reconciler = Arc::new(OrderReconciler::new(
            tickets.clone(),
            Some(audit_handle),
            Some(on_update),
        ));
        reconciler.start().await;

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&audit_store),
            tickets.clone(),
            fanout,
            Some(Arc::clone(&reconciler)),
            ws_broadcaster.clone(),
        ));

        Self {
            router: create_router(state),
            tickets,
            reconciler,
            ws_broadcaster,
            audit_store,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// POST on behalf of an operator named in the `X-Operator` header.
    pub async fn post_as(&self, operator: &str, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), Some(operator)).await
    }

    /// Fan out a drink and a burger for `order_id`.
    pub async fn place_mixed_order(&self, order_id: &str) -> TestResponse {
        self.post(
            &format!("/api/v1/orders/{}/fanout", order_id),
            serde_json::json!({
                "lines": [
                    { "menu_item_id": "burger", "category": "mains" },
                    { "menu_item_id": "lager", "category": "drinks", "quantity": 2 }
                ]
            }),
        )
        .await
    }

    /// Wait until the audit writer has persisted at least `count` events of a type.
    pub async fn wait_for_audit(&self, event_type: &str, count: i64) -> bool {
        let filter = kds_core::AuditFilter::new().with_event_type(event_type);
        for _ in 0..50 {
            if self.audit_store.count(&filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        operator: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(operator) = operator {
            request_builder = request_builder.header("X-Operator", operator);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

/// Receive WebSocket messages until one matches, or time out.
pub async fn next_matching<F>(rx: &mut broadcast::Receiver<WsMessage>, mut pred: F) -> Option<WsMessage>
where
    F: FnMut(&WsMessage) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let msg = tokio::time::timeout_at(deadline, rx.recv()).await.ok()?.ok()?;
        if pred(&msg) {
            return Some(msg);
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
