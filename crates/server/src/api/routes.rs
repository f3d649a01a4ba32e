use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{audit, handlers, indicator, orders, stations, tickets, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Orders
        .route("/orders/{id}/fanout", post(orders::fan_out_order))
        .route("/orders/{id}/tickets", get(orders::order_tickets))
        .route("/orders/{id}/summary", get(orders::order_summary))
        // Station queues
        .route("/stations/{station}/tickets", get(stations::station_tickets))
        // Tickets
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/transition", post(tickets::transition_ticket))
        // Display
        .route("/indicator", post(indicator::render_indicator))
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
