pub mod audit;
pub mod config;
pub mod display;
pub mod fanout;
pub mod feed;
pub mod metrics;
pub mod order;
pub mod testing;
pub mod ticket;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ReconcilerConfig, ServerConfig,
};
pub use display::{status_color, status_label, Indicator, IndicatorDot, StationStatus, StatusColor};
pub use fanout::{
    FanoutError, FanoutOutcome, OrderFanout, OrderLine, PlaceOrder, RoutingConfig, StationRouter,
};
pub use feed::{
    FeedConfig, FeedError, HttpTicketSource, StationFeed, StationSnapshot, StoreTicketSource,
    TerminalDisplay, TicketSource,
};
pub use order::{
    derive_order_status, summarize, OrderReconciler, OrderStatus, OrderSummary,
    OrderUpdateCallback,
};
pub use ticket::{
    SqliteTicketStore, Station, Ticket, TicketError, TicketEvent, TicketFilter, TicketService,
    TicketStatus, TicketStore, QUEUE_LIMIT, RECENT_DONE_LIMIT,
};
