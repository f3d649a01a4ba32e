//! Ticket storage trait and types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ticket::{Station, Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// A status value outside the closed set.
    #[error("Unknown ticket status: {0}")]
    UnknownStatus(String),

    /// A station value outside the closed set.
    #[error("Unknown station: {0}")]
    UnknownStation(String),

    /// The requested edge does not exist in the state machine.
    #[error("Cannot move ticket from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// Compare-and-set failed: someone else changed the ticket first.
    #[error("Ticket {ticket_id} is {actual}, expected {expected}")]
    ConflictingTransition {
        ticket_id: String,
        expected: TicketStatus,
        actual: TicketStatus,
    },

    /// A ticket already exists for this (order, station) pair.
    #[error("Order {order_id} already has a {station} ticket")]
    DuplicateFanout { order_id: String, station: Station },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl TicketError {
    /// Returns true if re-fetching and retrying may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, TicketError::ConflictingTransition { .. })
    }
}

/// Filter for listing tickets.
#[derive(Debug, Clone)]
pub struct TicketFilter {
    /// Only tickets for this station.
    pub station: Option<Station>,
    /// Only tickets for this order.
    pub order_id: Option<String>,
    /// Only tickets in this status.
    pub status: Option<TicketStatus>,
    /// Include COMPLETED and CANCELLED tickets.
    pub include_terminal: bool,
    /// Only COMPLETED and CANCELLED tickets.
    pub terminal_only: bool,
    /// Only tickets changed at or after this time.
    pub updated_since: Option<DateTime<Utc>>,
    /// Return the newest tickets first instead of FIFO.
    pub newest_first: bool,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketFilter {
    /// Create a new filter with defaults (all tickets, first 100).
    pub fn new() -> Self {
        Self {
            station: None,
            order_id: None,
            status: None,
            include_terminal: true,
            terminal_only: false,
            updated_since: None,
            newest_first: false,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_station(mut self, station: Station) -> Self {
        self.station = Some(station);
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only NEW, IN_PROGRESS and RECALLED tickets.
    pub fn active_only(mut self) -> Self {
        self.include_terminal = false;
        self
    }

    /// Only COMPLETED and CANCELLED tickets.
    pub fn terminal_only(mut self) -> Self {
        self.include_terminal = true;
        self.terminal_only = true;
        self
    }

    pub fn with_updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
///
/// Implementations must enforce at most one ticket per (order, station) and
/// apply transitions as an atomic compare-and-set on the current status.
pub trait TicketStore: Send + Sync {
    /// Create a NEW ticket for a station of an order.
    ///
    /// Fails with [`TicketError::DuplicateFanout`] if the pair already exists.
    fn create(&self, order_id: &str, station: Station) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Get the ticket for an (order, station) pair.
    fn find(&self, order_id: &str, station: Station) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter, oldest first unless `newest_first` is set.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter (ignores limit/offset).
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Move a ticket from `expected` to `next`.
    ///
    /// Rejects edges the state machine does not allow, and rejects with
    /// [`TicketError::ConflictingTransition`] if the stored status is not
    /// `expected`, leaving the ticket unchanged.
    fn transition(
        &self,
        id: &str,
        expected: TicketStatus,
        next: TicketStatus,
    ) -> Result<Ticket, TicketError>;

    /// Permanently delete all tickets of an order. Returns how many were removed.
    fn delete_order(&self, order_id: &str) -> Result<usize, TicketError>;
}
