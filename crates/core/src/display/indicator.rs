//! Compact per-station status summary for order list views.

use serde::{Deserialize, Serialize};

use crate::ticket::{Station, Ticket};

use super::{status_color, status_label, StatusColor};

/// One (station, status) pair as known for an order.
///
/// The status is kept as the raw wire value so an unexpected value from a
/// concurrent writer still renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationStatus {
    pub station: Station,
    pub status: String,
}

impl StationStatus {
    pub fn new(station: Station, status: impl Into<String>) -> Self {
        Self {
            station,
            status: status.into(),
        }
    }
}

impl From<&Ticket> for StationStatus {
    fn from(ticket: &Ticket) -> Self {
        Self::new(ticket.station, ticket.status.as_str())
    }
}

/// A single station dot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndicatorDot {
    pub station: Station,
    pub color: StatusColor,
    pub label: String,
    /// Hover / assistive text, e.g. "Kitchen: In Progress".
    pub tooltip: String,
    /// Drawn with an outline ring so bar stays distinguishable from kitchen
    /// when both share a color.
    pub ring: bool,
}

/// Read-only projection of an order's tickets to station dots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Indicator {
    pub dots: Vec<IndicatorDot>,
}

impl Indicator {
    /// Build the indicator. Absent or empty input renders nothing.
    ///
    /// Kitchen always precedes bar regardless of input order. If a station
    /// appears more than once the first entry wins.
    pub fn render(tickets: Option<&[StationStatus]>) -> Self {
        let tickets = tickets.unwrap_or_default();

        let dots = Station::ALL
            .iter()
            .filter_map(|station| {
                tickets
                    .iter()
                    .find(|t| t.station == *station)
                    .map(|t| dot(*station, &t.status))
            })
            .collect();

        Self { dots }
    }

    /// Build the indicator straight from stored tickets.
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let pairs: Vec<StationStatus> = tickets.iter().map(StationStatus::from).collect();
        Self::render(Some(&pairs))
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    /// Terminal rendering: `●` for kitchen, `◎` (ringed) for bar.
    pub fn render_text(&self) -> String {
        self.dots
            .iter()
            .map(|d| {
                let glyph = if d.ring { '◎' } else { '●' };
                format!("{}{}", glyph, d.color.token())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn dot(station: Station, raw_status: &str) -> IndicatorDot {
    let label = status_label(raw_status).into_owned();
    IndicatorDot {
        station,
        color: status_color(raw_status),
        tooltip: format!("{}: {}", station.display_name(), label),
        label,
        ring: station == Station::Bar,
    }
}
