//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use kds_core::{Ticket, TicketError, TicketStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

/// Header a station screen may use to identify the operator.
pub const OPERATOR_HEADER: &str = "x-operator";

/// Actor recorded when the request does not name one.
const ANONYMOUS: &str = "anonymous";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a status change.
///
/// Statuses are taken as raw strings so unknown values are reported as
/// such rather than as a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    /// Status the screen believes the ticket is in.
    pub expected: String,
    /// Requested status.
    pub next: String,
    /// Operator performing the change.
    pub actor: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<TicketStatus>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ticket_id: None,
            expected: None,
            actual: None,
        }
    }
}

/// Handler result with a JSON error body.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Map a ticket error onto its HTTP status.
pub(crate) fn ticket_error(e: TicketError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        TicketError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string())),
        ),
        TicketError::ConflictingTransition {
            ref ticket_id,
            expected,
            actual,
        } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
                ticket_id: Some(ticket_id.clone()),
                expected: Some(expected),
                actual: Some(actual),
            }),
        ),
        TicketError::InvalidTransition { .. }
        | TicketError::UnknownStatus(_)
        | TicketError::UnknownStation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(e.to_string())),
        ),
        TicketError::DuplicateFanout { .. } | TicketError::Database(_) => {
            error!("Ticket operation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        }
    }
}

/// Resolve the acting operator from the body, then the header.
fn actor(body: Option<&str>, headers: &HeaderMap) -> String {
    body.or_else(|| {
        headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
    })
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .unwrap_or(ANONYMOUS)
    .to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Ticket>> {
    match state.tickets().get(&id) {
        Ok(Some(ticket)) => Ok(Json(ticket)),
        Ok(None) => Err(ticket_error(TicketError::NotFound(id))),
        Err(e) => Err(ticket_error(e)),
    }
}

/// Compare-and-set a ticket's status.
///
/// Responds 409 with the stored status when `expected` is stale, so the
/// screen can refresh and let the operator retry.
pub async fn transition_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TransitionBody>,
) -> ApiResult<Json<Ticket>> {
    let expected: TicketStatus = body.expected.parse().map_err(ticket_error)?;
    let next: TicketStatus = body.next.parse().map_err(ticket_error)?;
    let actor = actor(body.actor.as_deref(), &headers);

    state
        .tickets()
        .transition(&id, expected, next, &actor)
        .map(Json)
        .map_err(ticket_error)
}
