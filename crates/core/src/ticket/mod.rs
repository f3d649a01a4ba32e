//! Station tickets: the per-station unit of preparation work for an order.

mod service;
mod sqlite_store;
mod store;
mod types;

pub use service::{TicketEvent, TicketService, QUEUE_LIMIT, RECENT_DONE_LIMIT};
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketStore};
pub use types::{Station, Ticket, TicketStatus};
