use std::sync::Arc;

use kds_core::{AuditStore, Config, OrderFanout, OrderReconciler, TicketService};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    audit_store: Arc<dyn AuditStore>,
    tickets: TicketService,
    fanout: OrderFanout,
    reconciler: Option<Arc<OrderReconciler>>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        audit_store: Arc<dyn AuditStore>,
        tickets: TicketService,
        fanout: OrderFanout,
        reconciler: Option<Arc<OrderReconciler>>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            audit_store,
            tickets,
            fanout,
            reconciler,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn tickets(&self) -> &TicketService {
        &self.tickets
    }

    pub fn fanout(&self) -> &OrderFanout {
        &self.fanout
    }

    /// The order status reconciler, if enabled.
    pub fn reconciler(&self) -> Option<&Arc<OrderReconciler>> {
        self.reconciler.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
