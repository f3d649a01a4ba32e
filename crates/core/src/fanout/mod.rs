//! Order fan-out: one ticket per station involved in an order.
//!
//! Fan-out is idempotent per (order, station). Replaying a placement, or a
//! second writer racing the first, finds the existing ticket instead of
//! creating a duplicate.

mod config;
mod router;
mod types;

pub use config::RoutingConfig;
pub use router::StationRouter;
pub use types::{FanoutError, FanoutOutcome, OrderLine, PlaceOrder};

use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::FANOUTS;
use crate::ticket::{Station, Ticket, TicketError, TicketService};

/// Creates station tickets for placed orders.
#[derive(Clone)]
pub struct OrderFanout {
    tickets: TicketService,
    router: StationRouter,
    audit: Option<AuditHandle>,
}

impl OrderFanout {
    pub fn new(tickets: TicketService, router: StationRouter) -> Self {
        Self {
            tickets,
            router,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn router(&self) -> &StationRouter {
        &self.router
    }

    /// Create the missing station tickets for `order`.
    ///
    /// A ticket that already exists for a station counts as success and is
    /// reported in [`FanoutOutcome::existing`].
    pub fn fan_out(&self, order: &PlaceOrder) -> Result<FanoutOutcome, FanoutError> {
        if order.order_id.trim().is_empty() {
            FANOUTS.with_label_values(&["rejected"]).inc();
            return Err(FanoutError::MissingOrderId);
        }
        if order.lines.is_empty() {
            FANOUTS.with_label_values(&["rejected"]).inc();
            return Err(FanoutError::EmptyOrder(order.order_id.clone()));
        }

        let mut outcome = FanoutOutcome {
            order_id: order.order_id.clone(),
            created: Vec::new(),
            existing: Vec::new(),
        };

        for station in self.router.stations_for(&order.lines) {
            match self.tickets.create(&order.order_id, station) {
                Ok(ticket) => outcome.created.push(ticket),
                Err(TicketError::DuplicateFanout { .. }) => {
                    debug!(order_id = %order.order_id, %station, "Ticket already fanned out");
                    outcome
                        .existing
                        .push(self.existing_ticket(&order.order_id, station)?);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let result = match (outcome.created.is_empty(), outcome.existing.is_empty()) {
            (true, _) => "noop",
            (false, true) => "created",
            (false, false) => "partial",
        };
        FANOUTS.with_label_values(&[result]).inc();

        info!(
            order_id = %outcome.order_id,
            created = outcome.created.len(),
            existing = outcome.existing.len(),
            "Order fanned out"
        );

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::OrderFannedOut {
                order_id: outcome.order_id.clone(),
                created: outcome.created.iter().map(|t| t.station).collect(),
                existing: outcome.existing.iter().map(|t| t.station).collect(),
            });
        }

        Ok(outcome)
    }

    fn existing_ticket(&self, order_id: &str, station: Station) -> Result<Ticket, TicketError> {
        self.tickets
            .store()
            .find(order_id, station)?
            .ok_or_else(|| TicketError::NotFound(format!("{}/{}", order_id, station)))
    }
}
