use std::fmt;

use serde::{Deserialize, Serialize};

use crate::display::Indicator;
use crate::ticket::{Ticket, TicketStatus};

/// Aggregate status of an order across its station tickets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// No tickets yet.
    Pending,
    New,
    InProgress,
    /// Every station that is still preparing something has completed it.
    Ready,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::New => "NEW",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// No ticket of the order can change again until it is fanned out anew.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Ready | OrderStatus::Cancelled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive an order's status from its ticket statuses.
///
/// A cancelled ticket only removes its own station's portion; the rest of
/// the order is judged on the remaining tickets.
pub fn derive_order_status(statuses: &[TicketStatus]) -> OrderStatus {
    if statuses.is_empty() {
        return OrderStatus::Pending;
    }

    let live: Vec<TicketStatus> = statuses
        .iter()
        .copied()
        .filter(|s| *s != TicketStatus::Cancelled)
        .collect();

    if live.is_empty() {
        OrderStatus::Cancelled
    } else if live.iter().all(|s| *s == TicketStatus::Completed) {
        OrderStatus::Ready
    } else if live.iter().all(|s| *s == TicketStatus::New) {
        OrderStatus::New
    } else {
        OrderStatus::InProgress
    }
}

/// Everything an order list row needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub order_id: String,
    pub status: OrderStatus,
    pub ready_for_pickup: bool,
    pub indicator: Indicator,
    /// Tickets in station order.
    pub tickets: Vec<Ticket>,
}

/// Build the summary for `order_id` from its tickets.
pub fn summarize(order_id: &str, mut tickets: Vec<Ticket>) -> OrderSummary {
    tickets.sort_by_key(|t| t.station);

    let statuses: Vec<TicketStatus> = tickets.iter().map(|t| t.status).collect();
    let status = derive_order_status(&statuses);

    OrderSummary {
        order_id: order_id.to_string(),
        status,
        ready_for_pickup: status == OrderStatus::Ready,
        indicator: Indicator::from_tickets(&tickets),
        tickets,
    }
}
