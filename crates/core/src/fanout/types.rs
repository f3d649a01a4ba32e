//! Order placement types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::{Ticket, TicketError};

/// A single line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Menu item identifier.
    pub menu_item_id: String,
    /// Menu category, used when the item itself has no routing entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl OrderLine {
    pub fn new(menu_item_id: impl Into<String>) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            category: None,
            quantity: 1,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// An order as handed over at placement time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrder {
    pub order_id: String,
    pub lines: Vec<OrderLine>,
}

impl PlaceOrder {
    pub fn new(order_id: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: order_id.into(),
            lines,
        }
    }
}

/// Result of fanning out an order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FanoutOutcome {
    pub order_id: String,
    /// Tickets created by this call.
    pub created: Vec<Ticket>,
    /// Tickets that already existed from an earlier call.
    pub existing: Vec<Ticket>,
}

impl FanoutOutcome {
    /// Every ticket of the order, in station order.
    pub fn tickets(&self) -> Vec<&Ticket> {
        let mut all: Vec<&Ticket> = self.created.iter().chain(self.existing.iter()).collect();
        all.sort_by_key(|t| t.station);
        all
    }

    /// True if this call changed nothing.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("Order {0} has no lines")]
    EmptyOrder(String),

    #[error("Order id must not be empty")]
    MissingOrderId,

    #[error(transparent)]
    Ticket(#[from] TicketError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_line_defaults() {
        let line: OrderLine = serde_json::from_str(r#"{"menu_item_id":"burger"}"#).unwrap();
        assert_eq!(line.quantity, 1);
        assert!(line.category.is_none());
    }

    #[test]
    fn test_order_line_builder() {
        let line = OrderLine::new("negroni").with_category("cocktails").with_quantity(2);
        assert_eq!(line.menu_item_id, "negroni");
        assert_eq!(line.category.as_deref(), Some("cocktails"));
        assert_eq!(line.quantity, 2);
    }
}
