//! Per-station ticket feed with last-known-good retention.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::metrics::{FEED_POLLS, FEED_POLL_DURATION};
use crate::ticket::{Station, Ticket};

use super::{FeedConfig, FeedError, TerminalDisplay, TicketSource};

/// What a station display shows right now.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationSnapshot {
    pub station: Station,
    /// NEW, IN_PROGRESS and RECALLED tickets, oldest first.
    pub active: Vec<Ticket>,
    /// COMPLETED and CANCELLED tickets, oldest first. Empty when hidden.
    pub done: Vec<Ticket>,
    /// True if the last poll failed and the tickets above may be outdated.
    pub stale: bool,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    /// Time of the last successful poll.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StationSnapshot {
    fn empty(station: Station) -> Self {
        Self {
            station,
            active: Vec::new(),
            done: Vec::new(),
            stale: false,
            last_error: None,
            consecutive_failures: 0,
            refreshed_at: None,
        }
    }

    /// False until the first successful poll.
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

/// Polls a [`TicketSource`] for one station and publishes snapshots.
pub struct StationFeed {
    station: Station,
    source: Arc<dyn TicketSource>,
    config: FeedConfig,
    tx: watch::Sender<StationSnapshot>,
}

impl StationFeed {
    pub fn new(station: Station, source: Arc<dyn TicketSource>, config: FeedConfig) -> Self {
        let (tx, _) = watch::channel(StationSnapshot::empty(station));
        Self {
            station,
            source,
            config,
            tx,
        }
    }

    pub fn station(&self) -> Station {
        self.station
    }

    /// Receiver notified whenever the visible snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<StationSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> StationSnapshot {
        self.tx.borrow().clone()
    }

    /// Fetch once and update the snapshot.
    ///
    /// On failure the previous tickets are kept and the snapshot is marked
    /// stale. The error is returned for the caller's backoff.
    pub async fn poll_once(&self) -> Result<(), FeedError> {
        let station = self.station.as_str();
        let started = Instant::now();

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let result = match tokio::time::timeout(timeout, self.source.fetch(self.station)).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(self.config.request_timeout_ms)),
        };

        FEED_POLL_DURATION
            .with_label_values(&[station])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(tickets) => {
                FEED_POLLS.with_label_values(&[station, "success"]).inc();
                let (active, done) = self.partition(tickets);
                let changed = self.tx.send_if_modified(move |snap| {
                    let changed = !snap.is_loaded()
                        || snap.stale
                        || snap.active != active
                        || snap.done != done;
                    snap.active = active;
                    snap.done = done;
                    snap.stale = false;
                    snap.last_error = None;
                    snap.consecutive_failures = 0;
                    snap.refreshed_at = Some(Utc::now());
                    changed
                });
                if changed {
                    debug!(station, "Station snapshot updated");
                }
                Ok(())
            }
            Err(e) => {
                let label = match e {
                    FeedError::Timeout(_) => "timeout",
                    _ => "error",
                };
                FEED_POLLS.with_label_values(&[station, label]).inc();

                let message = e.to_string();
                let mut failures = 0;
                self.tx.send_if_modified(|snap| {
                    let changed = !snap.stale || snap.last_error.as_deref() != Some(message.as_str());
                    snap.stale = true;
                    snap.last_error = Some(message.clone());
                    snap.consecutive_failures = snap.consecutive_failures.saturating_add(1);
                    failures = snap.consecutive_failures;
                    changed
                });
                warn!(station, failures, "Station feed poll failed, keeping last snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// Delay before the next poll: the poll interval, doubled per consecutive
    /// failure and capped at `max_backoff_ms`.
    pub fn next_delay(&self) -> Duration {
        let failures = self.tx.borrow().consecutive_failures;
        let base = self.config.poll_interval_ms;
        if failures == 0 {
            return Duration::from_millis(base);
        }
        let factor = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor).min(self.config.max_backoff_ms))
    }

    /// Poll until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(station = self.station.as_str(), "Station feed started");
        loop {
            // Errors are already recorded in the snapshot
            let _ = self.poll_once().await;
            let delay = self.next_delay();
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!(station = self.station.as_str(), "Station feed stopped");
    }

    fn partition(&self, mut tickets: Vec<Ticket>) -> (Vec<Ticket>, Vec<Ticket>) {
        let before = tickets.len();
        tickets.retain(|t| t.station == self.station);
        if tickets.len() != before {
            debug!(
                station = self.station.as_str(),
                dropped = before - tickets.len(),
                "Ignoring tickets for other stations"
            );
        }

        // Stable: ties keep the source's order
        tickets.sort_by_key(|t| t.created_at);

        let (active, done): (Vec<Ticket>, Vec<Ticket>) =
            tickets.into_iter().partition(|t| t.status.is_active());

        match self.config.terminal_display {
            TerminalDisplay::Hide => (active, Vec::new()),
            TerminalDisplay::Separate => (active, done),
        }
    }
}
