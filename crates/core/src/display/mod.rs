//! Presentation projections of ticket state. Nothing here mutates or fails.

mod indicator;
mod status;

pub use indicator::{Indicator, IndicatorDot, StationStatus};
pub use status::{status_color, status_label, StatusColor};
