//! Order fan-out and order-level views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use kds_core::{summarize, FanoutError, FanoutOutcome, OrderLine, OrderSummary, PlaceOrder, Ticket};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::tickets::{ticket_error, ApiResult, ErrorResponse};
use crate::state::AppState;

/// Request body for fanning out an order.
#[derive(Debug, Deserialize)]
pub struct FanoutBody {
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
pub struct OrderTicketsResponse {
    pub order_id: String,
    pub tickets: Vec<Ticket>,
}

fn fanout_error(e: FanoutError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        FanoutError::EmptyOrder(_) | FanoutError::MissingOrderId => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(e.to_string())),
        ),
        FanoutError::Ticket(inner) => ticket_error(inner),
    }
}

/// Create the station tickets an order needs.
///
/// Replays are safe: stations that already have a ticket are reported under
/// `existing`. Responds 201 when at least one ticket was created.
pub async fn fan_out_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(body): Json<FanoutBody>,
) -> ApiResult<(StatusCode, Json<FanoutOutcome>)> {
    let order = PlaceOrder::new(order_id, body.lines);
    let outcome = state.fanout().fan_out(&order).map_err(fanout_error)?;

    let status = if outcome.created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

/// All tickets of an order, oldest first.
pub async fn order_tickets(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderTicketsResponse>> {
    let tickets = state
        .tickets()
        .order_tickets(&order_id)
        .map_err(ticket_error)?;
    Ok(Json(OrderTicketsResponse { order_id, tickets }))
}

/// Derived order status plus the station indicator.
///
/// An order without tickets summarizes as PENDING, not 404.
pub async fn order_summary(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderSummary>> {
    let tickets = state
        .tickets()
        .order_tickets(&order_id)
        .map_err(ticket_error)?;
    Ok(Json(summarize(&order_id, tickets)))
}
