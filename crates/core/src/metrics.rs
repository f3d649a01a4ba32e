//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket lifecycle (creation, transitions, compare-and-set conflicts)
//! - Order fan-out and status reconciliation
//! - Station feed polling

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Tickets created, by station.
pub static TICKETS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kds_tickets_created_total", "Total station tickets created"),
        &["station"],
    )
    .unwrap()
});

/// Ticket status transitions.
pub static TICKET_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kds_ticket_transitions_total",
            "Ticket status transitions applied",
        ),
        &["station", "from_status", "to_status"],
    )
    .unwrap()
});

/// Transitions rejected because the expected status was stale.
pub static TRANSITION_CONFLICTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kds_transition_conflicts_total",
            "Compare-and-set transition conflicts",
        ),
        &["station"],
    )
    .unwrap()
});

// =============================================================================
// Order Metrics
// =============================================================================

/// Fan-out invocations by result.
pub static FANOUTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kds_fanouts_total", "Order fan-out invocations"),
        &["result"], // "created", "partial", "noop", "rejected"
    )
    .unwrap()
});

/// Derived order status changes.
pub static ORDER_STATUS_CHANGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kds_order_status_changes_total",
            "Derived order status changes observed by the reconciler",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Station Feed Metrics
// =============================================================================

/// Feed polls by station and result.
pub static FEED_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kds_feed_polls_total", "Station feed polls"),
        &["station", "result"], // result: "success", "timeout", "error"
    )
    .unwrap()
});

/// Feed poll duration in seconds.
pub static FEED_POLL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("kds_feed_poll_duration_seconds", "Station feed poll latency")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["station"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tickets
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKET_TRANSITIONS.clone()),
        Box::new(TRANSITION_CONFLICTS.clone()),
        // Orders
        Box::new(FANOUTS.clone()),
        Box::new(ORDER_STATUS_CHANGES.clone()),
        // Feed
        Box::new(FEED_POLLS.clone()),
        Box::new(FEED_POLL_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        TICKETS_CREATED.with_label_values(&["KITCHEN"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"kds_tickets_created_total".to_string()));
    }
}
