//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TicketError;

// ============================================================================
// Station
// ============================================================================

/// A physical preparation area with its own display and ticket queue.
///
/// The serialized values (`KITCHEN`, `BAR`) are shared with persisted data and
/// existing clients and must not change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    Kitchen,
    Bar,
}

impl Station {
    /// All stations, in display order.
    pub const ALL: [Station; 2] = [Station::Kitchen, Station::Bar];

    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Station::Kitchen => "KITCHEN",
            Station::Bar => "BAR",
        }
    }

    /// Human-readable name used in tooltips.
    pub fn display_name(&self) -> &'static str {
        match self {
            Station::Kitchen => "Kitchen",
            Station::Bar => "Bar",
        }
    }

    /// Lowercase form used in URL paths.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Station::Kitchen => "kitchen",
            Station::Bar => "bar",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Station {
    type Err = TicketError;

    /// Accepts the wire value or the lowercase path form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KITCHEN" | "kitchen" => Ok(Station::Kitchen),
            "BAR" | "bar" => Ok(Station::Bar),
            other => Err(TicketError::UnknownStation(other.to_string())),
        }
    }
}

// ============================================================================
// Ticket Status
// ============================================================================

/// Preparation status of a single station ticket.
///
/// ```text
/// NEW ──────────► IN_PROGRESS ──────► COMPLETED
///  │               │     ▲
///  │               ▼     │
///  │             RECALLED
///  │               │
///  └───────────────┴──────────────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    New,
    InProgress,
    Completed,
    Recalled,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::Recalled,
        TicketStatus::Cancelled,
    ];

    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "NEW",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Completed => "COMPLETED",
            TicketStatus::Recalled => "RECALLED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// Returns true if the station is (or will again be) working on the ticket.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// States reachable in one step from this one.
    pub fn allowed_transitions(&self) -> &'static [TicketStatus] {
        match self {
            TicketStatus::New => &[TicketStatus::InProgress, TicketStatus::Cancelled],
            TicketStatus::InProgress => &[
                TicketStatus::Completed,
                TicketStatus::Recalled,
                TicketStatus::Cancelled,
            ],
            TicketStatus::Recalled => &[TicketStatus::InProgress, TicketStatus::Cancelled],
            TicketStatus::Completed | TicketStatus::Cancelled => &[],
        }
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TicketError::UnknownStatus(s.to_string()))
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// One station's unit of preparation work for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID).
    pub id: String,

    /// Owning order.
    pub order_id: String,

    /// Station preparing this ticket. Never changes after creation.
    pub station: Station,

    /// Current status.
    pub status: TicketStatus,

    /// When the ticket was fanned out.
    pub created_at: DateTime<Utc>,

    /// Last status change.
    pub updated_at: DateTime<Utc>,
}
