//! WebSocket push of ticket and order updates to station screens.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use kds_core::{Indicator, OrderStatus, OrderSummary, Ticket, TicketEvent, TicketService, TicketStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A ticket was created or changed status.
    TicketUpdate {
        ticket: Ticket,
        /// Status before the change, absent for new tickets.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<TicketStatus>,
    },
    /// The derived status of an order changed.
    OrderStatus {
        order_id: String,
        status: OrderStatus,
        ready_for_pickup: bool,
        indicator: Indicator,
    },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::TicketUpdate { .. } => "ticket_update",
            WsMessage::OrderStatus { .. } => "order_status",
        }
    }
}

impl From<TicketEvent> for WsMessage {
    fn from(event: TicketEvent) -> Self {
        match event {
            TicketEvent::Created { ticket } => WsMessage::TicketUpdate { ticket, from: None },
            TicketEvent::Transitioned { ticket, from } => WsMessage::TicketUpdate {
                ticket,
                from: Some(from),
            },
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means no screen is connected
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Broadcast a derived order status.
    pub fn order_status(&self, summary: &OrderSummary) {
        self.broadcast(WsMessage::OrderStatus {
            order_id: summary.order_id.clone(),
            status: summary.status,
            ready_for_pickup: summary.ready_for_pickup,
            indicator: summary.indicator.clone(),
        });
    }

    /// Forward every ticket event to connected clients until the service's
    /// event channel closes.
    pub fn forward_ticket_events(&self, tickets: &TicketService) -> JoinHandle<()> {
        let mut events = tickets.subscribe();
        let broadcaster = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => broadcaster.broadcast(event.into()),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Ticket event forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Ticket event forwarder stopped");
        })
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // The screen re-syncs from the next poll
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only send pings and close frames
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring client text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
