//! Mock ticket source for testing station feeds.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::feed::{FeedError, TicketSource};
use crate::ticket::{Station, Ticket};

/// Mock implementation of the TicketSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve a fixed ticket list (every station, unfiltered)
/// - Script a sequence of failures before the next success
/// - Delay responses to exercise timeouts
///
/// # Example
///
/// ```rust,ignore
/// use kds_core::testing::{fixtures, MockTicketSource};
///
/// let source = MockTicketSource::new();
/// source.set_tickets(vec![fixtures::ticket("o-1", Station::Kitchen, TicketStatus::New)]).await;
/// source.fail_next(FeedError::Source("connection reset".into())).await;
/// ```
#[derive(Debug, Default)]
pub struct MockTicketSource {
    tickets: Arc<RwLock<Vec<Ticket>>>,
    failures: Arc<RwLock<VecDeque<FeedError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    fetches: AtomicUsize,
}

impl MockTicketSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tickets returned by subsequent fetches.
    pub async fn set_tickets(&self, tickets: Vec<Ticket>) {
        *self.tickets.write().await = tickets;
    }

    /// Fail the next fetch with `error`. Calls queue up in order.
    pub async fn fail_next(&self, error: FeedError) {
        self.failures.write().await.push_back(error);
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Number of fetches attempted so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketSource for MockTicketSource {
    async fn fetch(&self, _station: Station) -> Result<Vec<Ticket>, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.write().await.pop_front() {
            return Err(error);
        }

        Ok(self.tickets.read().await.clone())
    }
}
