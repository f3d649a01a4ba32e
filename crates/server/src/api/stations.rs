use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use kds_core::{Station, Ticket};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::tickets::{ticket_error, ApiResult, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StationTicketsParams {
    /// Include COMPLETED and CANCELLED tickets.
    #[serde(default)]
    pub include_done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StationTicketsResponse {
    pub station: Station,
    pub tickets: Vec<Ticket>,
}

/// One station's queue, oldest first.
pub async fn station_tickets(
    State(state): State<Arc<AppState>>,
    Path(station): Path<String>,
    Query(params): Query<StationTicketsParams>,
) -> ApiResult<Json<StationTicketsResponse>> {
    let station: Station = station.parse().map_err(|e: kds_core::TicketError| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    let tickets = state
        .tickets()
        .station_tickets(station, params.include_done)
        .map_err(ticket_error)?;

    Ok(Json(StationTicketsResponse { station, tickets }))
}
