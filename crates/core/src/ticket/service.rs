//! Ticket service: the single write path for ticket changes.
//!
//! Every successful create or transition is published on a broadcast channel
//! so station displays and the order reconciler can re-derive their views
//! instead of being refreshed imperatively.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::{TICKETS_CREATED, TICKET_TRANSITIONS, TRANSITION_CONFLICTS};

use super::{Station, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore};

/// Capacity of the change notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Upper bound on tickets returned for a single station or order view.
pub const QUEUE_LIMIT: i64 = 500;

/// Finished tickets shown alongside a station's active queue, most recent only.
pub const RECENT_DONE_LIMIT: i64 = 50;

/// Change notification for a single ticket.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// A ticket was fanned out.
    Created { ticket: Ticket },
    /// A ticket moved from `from` to `ticket.status`.
    Transitioned { ticket: Ticket, from: TicketStatus },
}

impl TicketEvent {
    pub fn ticket(&self) -> &Ticket {
        match self {
            TicketEvent::Created { ticket } | TicketEvent::Transitioned { ticket, .. } => ticket,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.ticket().order_id
    }
}

/// Wraps a [`TicketStore`] with change notifications, audit and metrics.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
    audit: Option<AuditHandle>,
    events: broadcast::Sender<TicketEvent>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            audit: None,
            events,
        }
    }

    /// Record creates, transitions and conflicts in the audit trail.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    /// Subscribe to ticket change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: TicketEvent) {
        // No receivers is fine: nobody is watching yet
        let _ = self.events.send(event);
    }

    fn audit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.try_emit(event);
        }
    }

    /// Create a NEW ticket for one station of an order.
    pub fn create(&self, order_id: &str, station: Station) -> Result<Ticket, TicketError> {
        let ticket = self.store.create(order_id, station)?;

        debug!(ticket_id = %ticket.id, order_id, %station, "Ticket created");
        TICKETS_CREATED.with_label_values(&[station.as_str()]).inc();
        self.audit(AuditEvent::TicketCreated {
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            station,
        });
        self.publish(TicketEvent::Created {
            ticket: ticket.clone(),
        });

        Ok(ticket)
    }

    pub fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        self.store.get(id)
    }

    /// Compare-and-set a ticket's status on behalf of `actor`.
    pub fn transition(
        &self,
        id: &str,
        expected: TicketStatus,
        next: TicketStatus,
        actor: &str,
    ) -> Result<Ticket, TicketError> {
        match self.store.transition(id, expected, next) {
            Ok(ticket) => {
                info!(
                    ticket_id = %ticket.id,
                    order_id = %ticket.order_id,
                    station = %ticket.station,
                    from = %expected,
                    to = %next,
                    actor,
                    "Ticket transitioned"
                );
                TICKET_TRANSITIONS
                    .with_label_values(&[ticket.station.as_str(), expected.as_str(), next.as_str()])
                    .inc();
                self.audit(AuditEvent::TicketTransitioned {
                    ticket_id: ticket.id.clone(),
                    order_id: ticket.order_id.clone(),
                    station: ticket.station,
                    from: expected,
                    to: next,
                    actor: actor.to_string(),
                });
                self.publish(TicketEvent::Transitioned {
                    ticket: ticket.clone(),
                    from: expected,
                });
                Ok(ticket)
            }
            Err(TicketError::ConflictingTransition {
                ticket_id,
                expected,
                actual,
            }) => {
                warn!(
                    ticket_id = %ticket_id,
                    %expected,
                    %actual,
                    requested = %next,
                    actor,
                    "Transition conflict"
                );
                let station = self
                    .store
                    .get(&ticket_id)
                    .ok()
                    .flatten()
                    .map(|t| t.station.as_str())
                    .unwrap_or("unknown");
                TRANSITION_CONFLICTS.with_label_values(&[station]).inc();
                self.audit(AuditEvent::TransitionConflict {
                    ticket_id: ticket_id.clone(),
                    expected,
                    actual,
                    requested: next,
                    actor: actor.to_string(),
                });
                Err(TicketError::ConflictingTransition {
                    ticket_id,
                    expected,
                    actual,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Tickets for one station, oldest first.
    ///
    /// The active queue is always read in full up to [`QUEUE_LIMIT`]. With
    /// `include_terminal`, the [`RECENT_DONE_LIMIT`] most recently created
    /// finished tickets are merged in, so old history never pushes new
    /// tickets out of the view.
    pub fn station_tickets(
        &self,
        station: Station,
        include_terminal: bool,
    ) -> Result<Vec<Ticket>, TicketError> {
        let mut tickets = self.store.list(
            &TicketFilter::new()
                .with_station(station)
                .active_only()
                .with_limit(QUEUE_LIMIT),
        )?;
        if !include_terminal {
            return Ok(tickets);
        }

        let done = self.store.list(
            &TicketFilter::new()
                .with_station(station)
                .terminal_only()
                .newest_first()
                .with_limit(RECENT_DONE_LIMIT),
        )?;
        tickets.extend(done.into_iter().rev());
        tickets.sort_by_key(|t| t.created_at);
        Ok(tickets)
    }

    /// Orders with at least one ticket changed at or after `since`.
    pub fn orders_updated_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<BTreeSet<String>, TicketError> {
        let mut orders = BTreeSet::new();
        let mut offset = 0;
        loop {
            let page = self.store.list(
                &TicketFilter::new()
                    .with_updated_since(since)
                    .with_limit(QUEUE_LIMIT)
                    .with_offset(offset),
            )?;
            let fetched = page.len() as i64;
            orders.extend(page.into_iter().map(|t| t.order_id));
            if fetched < QUEUE_LIMIT {
                return Ok(orders);
            }
            offset += fetched;
        }
    }

    /// All tickets of one order, oldest first.
    pub fn order_tickets(&self, order_id: &str) -> Result<Vec<Ticket>, TicketError> {
        self.store.list(
            &TicketFilter::new()
                .with_order_id(order_id)
                .with_limit(QUEUE_LIMIT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::SqliteTicketStore;
    use tokio::sync::mpsc;

    fn service() -> TicketService {
        TicketService::new(Arc::new(SqliteTicketStore::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_create_publishes_event() {
        let service = service();
        let mut rx = service.subscribe();

        let ticket = service.create("order-1", Station::Bar).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, TicketEvent::Created { ticket });
        assert_eq!(event.order_id(), "order-1");
    }

    #[tokio::test]
    async fn test_transition_publishes_event() {
        let service = service();
        let ticket = service.create("order-1", Station::Kitchen).unwrap();
        let mut rx = service.subscribe();

        service
            .transition(&ticket.id, TicketStatus::New, TicketStatus::InProgress, "chef")
            .unwrap();

        match rx.recv().await.unwrap() {
            TicketEvent::Transitioned { ticket, from } => {
                assert_eq!(from, TicketStatus::New);
                assert_eq!(ticket.status, TicketStatus::InProgress);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_conflict_does_not_publish() {
        let service = service();
        let ticket = service.create("order-1", Station::Kitchen).unwrap();
        service
            .transition(&ticket.id, TicketStatus::New, TicketStatus::InProgress, "a")
            .unwrap();

        let mut rx = service.subscribe();
        let err = service
            .transition(&ticket.id, TicketStatus::New, TicketStatus::Cancelled, "b")
            .unwrap_err();

        assert!(err.is_retriable());
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_audit_records_conflict() {
        let (tx, mut audit_rx) = mpsc::channel(16);
        let service = service().with_audit(AuditHandle::new(tx));
        let ticket = service.create("order-1", Station::Bar).unwrap();

        service
            .transition(&ticket.id, TicketStatus::New, TicketStatus::InProgress, "a")
            .unwrap();
        let _ = service.transition(&ticket.id, TicketStatus::New, TicketStatus::InProgress, "b");

        let mut types = Vec::new();
        while let Ok(envelope) = audit_rx.try_recv() {
            types.push(envelope.event.event_type());
        }
        assert_eq!(
            types,
            vec!["ticket_created", "ticket_transitioned", "transition_conflict"]
        );
    }

    #[test]
    fn test_station_tickets_hides_terminal_on_request() {
        let service = service();
        let a = service.create("order-1", Station::Kitchen).unwrap();
        service.create("order-2", Station::Kitchen).unwrap();
        service.create("order-2", Station::Bar).unwrap();
        service
            .transition(&a.id, TicketStatus::New, TicketStatus::Cancelled, "chef")
            .unwrap();

        assert_eq!(service.station_tickets(Station::Kitchen, true).unwrap().len(), 2);
        let active = service.station_tickets(Station::Kitchen, false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_id, "order-2");
    }

    #[test]
    fn test_station_tickets_keeps_new_tickets_behind_long_history() {
        let service = service();
        for i in 0..QUEUE_LIMIT {
            let ticket = service.create(&format!("old-{}", i), Station::Kitchen).unwrap();
            service
                .transition(&ticket.id, TicketStatus::New, TicketStatus::Cancelled, "chef")
                .unwrap();
        }
        let fresh = service.create("fresh", Station::Kitchen).unwrap();

        let tickets = service.station_tickets(Station::Kitchen, true).unwrap();
        assert_eq!(tickets.len() as i64, RECENT_DONE_LIMIT + 1);
        assert_eq!(tickets.last().map(|t| t.id.as_str()), Some(fresh.id.as_str()));

        let active = service.station_tickets(Station::Kitchen, false).unwrap();
        assert_eq!(active, vec![fresh]);
    }

    #[test]
    fn test_orders_updated_since() {
        let service = service();
        service.create("order-1", Station::Kitchen).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let since = Utc::now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        service.create("order-2", Station::Kitchen).unwrap();
        service.create("order-2", Station::Bar).unwrap();
        service.create("order-3", Station::Bar).unwrap();

        let orders: Vec<_> = service.orders_updated_since(since).unwrap().into_iter().collect();
        assert_eq!(orders, vec!["order-2".to_string(), "order-3".to_string()]);
    }

    #[test]
    fn test_order_tickets() {
        let service = service();
        service.create("order-1", Station::Kitchen).unwrap();
        service.create("order-1", Station::Bar).unwrap();
        service.create("order-2", Station::Bar).unwrap();

        let tickets = service.order_tickets("order-1").unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.order_id == "order-1"));
    }
}
