//! Station display feed.
//!
//! Each display polls for its own station's tickets and keeps showing the
//! last good snapshot when a poll fails.

mod config;
mod source;
mod station;

pub use config::{FeedConfig, TerminalDisplay};
pub use source::{FeedError, HttpTicketSource, StoreTicketSource, TicketSource};
pub use station::{StationFeed, StationSnapshot};
