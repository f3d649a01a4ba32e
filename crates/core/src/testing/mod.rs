//! Testing utilities shared by unit and integration tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use kds_core::testing::{fixtures, MockTicketSource};
//!
//! let source = MockTicketSource::new();
//! source.set_tickets(vec![fixtures::ticket("o-1", Station::Kitchen, TicketStatus::New)]).await;
//! let feed = StationFeed::new(Station::Kitchen, Arc::new(source), FeedConfig::default());
//! ```

mod mock_ticket_source;

pub use mock_ticket_source::MockTicketSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, Utc};

    use crate::fanout::{OrderLine, PlaceOrder};
    use crate::ticket::{Station, Ticket, TicketStatus};

    /// A ticket created now.
    pub fn ticket(order_id: &str, station: Station, status: TicketStatus) -> Ticket {
        ticket_at(order_id, station, status, Utc::now())
    }

    /// A ticket created at a fixed time, for ordering tests.
    pub fn ticket_at(
        order_id: &str,
        station: Station,
        status: TicketStatus,
        created_at: DateTime<Utc>,
    ) -> Ticket {
        Ticket {
            id: format!("{}-{}", order_id, station.path_segment()),
            order_id: order_id.to_string(),
            station,
            status,
            created_at,
            updated_at: created_at,
        }
    }

    /// `count` NEW tickets for one station, one second apart, oldest first.
    pub fn queue(station: Station, count: usize) -> Vec<Ticket> {
        let start = Utc::now() - Duration::seconds(count as i64);
        (0..count)
            .map(|i| {
                ticket_at(
                    &format!("order-{}", i),
                    station,
                    TicketStatus::New,
                    start + Duration::seconds(i as i64),
                )
            })
            .collect()
    }

    /// A burger and a beer.
    pub fn mixed_order(order_id: &str) -> PlaceOrder {
        PlaceOrder::new(
            order_id,
            vec![
                OrderLine::new("burger").with_category("mains"),
                OrderLine::new("lager").with_category("drinks"),
            ],
        )
    }
}
