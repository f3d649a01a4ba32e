//! Keeps order-level status in step with station tickets.
//!
//! The reconciler listens to ticket change notifications and re-derives the
//! affected order's summary. Consumers are only called when the derived
//! status actually changes. Only unsettled orders are tracked; READY,
//! CANCELLED and PENDING orders drop out of the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::ORDER_STATUS_CHANGES;
use crate::ticket::{TicketError, TicketService};

use super::{summarize, OrderStatus, OrderSummary};

/// How far before the last seen event a resync after lag starts looking.
const RESYNC_MARGIN_MS: i64 = 1000;

/// Invoked with the new summary whenever an order's status changes.
pub type OrderUpdateCallback = Arc<dyn Fn(&OrderSummary) + Send + Sync>;

struct Shared {
    tickets: TicketService,
    audit: Option<AuditHandle>,
    on_update: Option<OrderUpdateCallback>,
    last_status: Mutex<HashMap<String, OrderStatus>>,
}

impl Shared {
    fn reconcile(&self, order_id: &str) -> Result<Option<OrderSummary>, TicketError> {
        let summary = summarize(order_id, self.tickets.order_tickets(order_id)?);

        let previous = {
            let mut cache = self
                .last_status
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if summary.status.is_settled() {
                cache.remove(order_id)
            } else {
                cache.insert(order_id.to_string(), summary.status)
            }
        };

        if previous == Some(summary.status) {
            debug!(order_id, status = %summary.status, "Order status unchanged");
            return Ok(None);
        }

        info!(
            order_id,
            from = ?previous,
            to = %summary.status,
            ready_for_pickup = summary.ready_for_pickup,
            "Order status changed"
        );
        ORDER_STATUS_CHANGES
            .with_label_values(&[summary.status.as_str()])
            .inc();

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::OrderStatusChanged {
                order_id: order_id.to_string(),
                from: previous,
                to: summary.status,
            });
        }
        if let Some(ref callback) = self.on_update {
            callback(&summary);
        }

        Ok(Some(summary))
    }

    /// Re-derive every order touched at or after `since`. Returns how many
    /// orders were checked.
    fn resync(&self, since: DateTime<Utc>) -> Result<usize, TicketError> {
        let orders = self.tickets.orders_updated_since(since)?;
        for order_id in &orders {
            if let Err(e) = self.reconcile(order_id) {
                warn!(order_id = %order_id, "Failed to reconcile order: {}", e);
            }
        }
        Ok(orders.len())
    }
}

/// Run a single-order reconcile on the blocking pool.
async fn reconcile_blocking(shared: &Arc<Shared>, order_id: String) {
    let shared = Arc::clone(shared);
    let result = tokio::task::spawn_blocking(move || {
        let result = shared.reconcile(&order_id);
        (order_id, result)
    })
    .await;

    match result {
        Ok((_, Ok(_))) => {}
        Ok((order_id, Err(e))) => {
            warn!(order_id = %order_id, "Failed to reconcile order: {}", e);
        }
        Err(e) => warn!("Reconcile task failed: {}", e),
    }
}

/// Recover from missed events by re-deriving recently touched orders.
async fn resync_blocking(shared: &Arc<Shared>, since: DateTime<Utc>) {
    let shared = Arc::clone(shared);
    match tokio::task::spawn_blocking(move || shared.resync(since)).await {
        Ok(Ok(checked)) => info!(checked, since = %since, "Order reconciler resynced"),
        Ok(Err(e)) => warn!("Order reconciler resync failed: {}", e),
        Err(e) => warn!("Resync task failed: {}", e),
    }
}

/// Background task deriving order status from ticket events.
pub struct OrderReconciler {
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl OrderReconciler {
    pub fn new(
        tickets: TicketService,
        audit: Option<AuditHandle>,
        on_update: Option<OrderUpdateCallback>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shared: Arc::new(Shared {
                tickets,
                audit,
                on_update,
                last_status: Mutex::new(HashMap::new()),
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Last derived status for an order still being tracked.
    ///
    /// Settled orders (READY, CANCELLED, PENDING) are not tracked.
    pub fn last_status(&self, order_id: &str) -> Option<OrderStatus> {
        self.shared
            .last_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(order_id)
            .copied()
    }

    /// Number of orders currently tracked.
    pub fn tracked_orders(&self) -> usize {
        self.shared
            .last_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Re-derive one order now. Returns the summary if its status changed.
    pub fn reconcile(&self, order_id: &str) -> Result<Option<OrderSummary>, TicketError> {
        self.shared.reconcile(order_id)
    }

    /// Subscribe to ticket events and start reconciling in the background.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Order reconciler already running");
            return;
        }

        let mut events = self.shared.tickets.subscribe();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(async move {
            info!("Order reconciler started");
            let margin = Duration::milliseconds(RESYNC_MARGIN_MS);
            let mut synced_at = Utc::now() - margin;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Order reconciler received shutdown signal");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(event) => {
                            synced_at = synced_at.max(event.ticket().updated_at);
                            reconcile_blocking(&shared, event.order_id().to_string()).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Order reconciler lagged behind ticket events");
                            resync_blocking(&shared, synced_at - margin).await;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            info!("Order reconciler stopped");
        });

        *self.task.lock().await = Some(handle);
    }

    /// Stop the background task and wait for it to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Order reconciler not running");
            return;
        }

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.task.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Order reconciler task failed: {}", e);
            }
        }
    }
}
