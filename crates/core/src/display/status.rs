//! Color and label lookups for ticket statuses.
//!
//! Both lookups are total over arbitrary input: a value written by a newer
//! client, or garbage from a broken one, degrades to a neutral rendering
//! instead of failing the display.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::ticket::TicketStatus;

/// Color token for a status dot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Blue,
    Yellow,
    Green,
    Orange,
    Gray,
    /// Fallback for values outside the known status set.
    Neutral,
}

impl StatusColor {
    pub fn token(&self) -> &'static str {
        match self {
            StatusColor::Blue => "blue",
            StatusColor::Yellow => "yellow",
            StatusColor::Green => "green",
            StatusColor::Orange => "orange",
            StatusColor::Gray => "gray",
            StatusColor::Neutral => "neutral",
        }
    }
}

impl TicketStatus {
    pub fn color(&self) -> StatusColor {
        match self {
            TicketStatus::New => StatusColor::Blue,
            TicketStatus::InProgress => StatusColor::Yellow,
            TicketStatus::Completed => StatusColor::Green,
            TicketStatus::Recalled => StatusColor::Orange,
            TicketStatus::Cancelled => StatusColor::Gray,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Completed => "Done",
            TicketStatus::Recalled => "Recalled",
            TicketStatus::Cancelled => "Cancelled",
        }
    }
}

/// Color for a raw status value. Unknown values map to [`StatusColor::Neutral`].
pub fn status_color(raw: &str) -> StatusColor {
    match raw.parse::<TicketStatus>() {
        Ok(status) => status.color(),
        Err(_) => StatusColor::Neutral,
    }
}

/// Label for a raw status value. Unknown values are returned unchanged.
pub fn status_label(raw: &str) -> Cow<'_, str> {
    match raw.parse::<TicketStatus>() {
        Ok(status) => Cow::Borrowed(status.label()),
        Err(_) => Cow::Borrowed(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_colors() {
        assert_eq!(status_color("NEW"), StatusColor::Blue);
        assert_eq!(status_color("IN_PROGRESS"), StatusColor::Yellow);
        assert_eq!(status_color("COMPLETED"), StatusColor::Green);
        assert_eq!(status_color("RECALLED"), StatusColor::Orange);
        assert_eq!(status_color("CANCELLED"), StatusColor::Gray);
    }

    #[test]
    fn test_known_labels() {
        assert_eq!(status_label("NEW"), "New");
        assert_eq!(status_label("IN_PROGRESS"), "In Progress");
        assert_eq!(status_label("COMPLETED"), "Done");
        assert_eq!(status_label("RECALLED"), "Recalled");
        assert_eq!(status_label("CANCELLED"), "Cancelled");
    }

    #[test]
    fn test_unknown_value_falls_back() {
        for raw in ["ON_FIRE", "", "new", "Completed ", "🔥"] {
            assert_eq!(status_color(raw), StatusColor::Neutral);
            assert_eq!(status_label(raw), raw);
        }
    }

    #[test]
    fn test_cancelled_and_unknown_are_distinct() {
        assert_ne!(status_color("CANCELLED"), status_color("UNKNOWN"));
    }

    #[test]
    fn test_typed_and_raw_lookups_agree() {
        for status in TicketStatus::ALL {
            assert_eq!(status_color(status.as_str()), status.color());
            assert_eq!(status_label(status.as_str()), status.label());
        }
    }

    #[test]
    fn test_color_tokens() {
        assert_eq!(StatusColor::Yellow.token(), "yellow");
        assert_eq!(StatusColor::Neutral.token(), "neutral");
        assert_eq!(serde_json::to_string(&StatusColor::Gray).unwrap(), "\"gray\"");
    }
}
