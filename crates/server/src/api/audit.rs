//! Audit trail queries.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use kds_core::{AuditError, AuditFilter, AuditRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::tickets::{ApiResult, ErrorResponse};
use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for the audit endpoint. All filters combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub ticket_id: Option<String>,
    pub order_id: Option<String>,
    /// e.g. `ticket_transitioned`, `transition_conflict`
    pub event_type: Option<String>,
    /// Operator named on the transition
    pub actor: Option<String>,
    /// Events at or after this time (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Events at or before this time (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    /// Page size, clamped to 1..=1000
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    /// Filter without pagination, shared by the page query and the total.
    fn filter(&self) -> AuditFilter {
        let mut filter = AuditFilter::new();
        if let Some(ref ticket_id) = self.ticket_id {
            filter = filter.with_ticket_id(ticket_id);
        }
        if let Some(ref order_id) = self.order_id {
            filter = filter.with_order_id(order_id);
        }
        if let Some(ref event_type) = self.event_type {
            filter = filter.with_event_type(event_type);
        }
        if let Some(ref actor) = self.actor {
            filter = filter.with_actor(actor);
        }
        if self.from.is_some() || self.to.is_some() {
            filter = filter.with_time_range(self.from, self.to);
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    /// Newest first
    pub events: Vec<AuditRecord>,
    /// Matching events ignoring pagination
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn audit_error(e: AuditError) -> (StatusCode, Json<ErrorResponse>) {
    error!("Audit query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!(
            "Failed to query audit events: {}",
            e
        ))),
    )
}

pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> ApiResult<Json<AuditQueryResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let base_filter = params.filter();
    let page_filter = base_filter.clone().with_limit(limit).with_offset(offset);

    let events = state.audit_store().query(&page_filter).map_err(audit_error)?;
    let total = state.audit_store().count(&base_filter).map_err(audit_error)?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
