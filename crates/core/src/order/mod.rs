//! Order-level view derived from station tickets.

mod reconciler;
mod status;

pub use reconciler::{OrderReconciler, OrderUpdateCallback};
pub use status::{derive_order_status, summarize, OrderStatus, OrderSummary};
