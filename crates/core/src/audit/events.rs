use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;
use crate::ticket::{Station, TicketStatus};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Ticket lifecycle
    TicketCreated {
        ticket_id: String,
        order_id: String,
        station: Station,
    },
    /// An order was handed to the stations.
    OrderFannedOut {
        order_id: String,
        /// Stations that got a new ticket on this call
        created: Vec<Station>,
        /// Stations that already had a ticket
        existing: Vec<Station>,
    },
    TicketTransitioned {
        ticket_id: String,
        order_id: String,
        station: Station,
        from: TicketStatus,
        to: TicketStatus,
        actor: String,
    },
    /// A transition lost a race with another writer.
    TransitionConflict {
        ticket_id: String,
        expected: TicketStatus,
        actual: TicketStatus,
        requested: TicketStatus,
        actor: String,
    },

    // Order events
    OrderStatusChanged {
        order_id: String,
        /// None the first time an order is seen
        from: Option<OrderStatus>,
        to: OrderStatus,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketCreated { .. } => "ticket_created",
            Self::OrderFannedOut { .. } => "order_fanned_out",
            Self::TicketTransitioned { .. } => "ticket_transitioned",
            Self::TransitionConflict { .. } => "transition_conflict",
            Self::OrderStatusChanged { .. } => "order_status_changed",
        }
    }

    /// Extract ticket_id if this event is ticket-related
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::TicketTransitioned { ticket_id, .. }
            | Self::TransitionConflict { ticket_id, .. } => Some(ticket_id),
            _ => None,
        }
    }

    /// Extract order_id if this event is order-related
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { order_id, .. }
            | Self::OrderFannedOut { order_id, .. }
            | Self::TicketTransitioned { order_id, .. }
            | Self::OrderStatusChanged { order_id, .. } => Some(order_id),
            _ => None,
        }
    }

    /// Extract the operator who caused this event, if any
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::TicketTransitioned { actor, .. } | Self::TransitionConflict { actor, .. } => {
                Some(actor)
            }
            _ => None,
        }
    }
}

/// Stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub order_id: Option<String>,
    pub actor: Option<String>,
    pub data: AuditEvent,
}
