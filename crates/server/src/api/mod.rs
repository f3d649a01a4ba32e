pub mod audit;
pub mod handlers;
pub mod indicator;
pub mod middleware;
pub mod orders;
pub mod routes;
pub mod stations;
pub mod tickets;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
