//! Where a station display gets its tickets from.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::ticket::{Station, Ticket, TicketService};

/// A failed read. Always transient from the display's point of view.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Fetch timed out after {0}ms")]
    Timeout(u64),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Source returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
}

/// Read side of the station ticket queue.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Every ticket for `station`, terminal ones included.
    async fn fetch(&self, station: Station) -> Result<Vec<Ticket>, FeedError>;
}

/// Reads straight from the in-process ticket service.
pub struct StoreTicketSource {
    tickets: TicketService,
}

impl StoreTicketSource {
    pub fn new(tickets: TicketService) -> Self {
        Self { tickets }
    }
}

#[async_trait]
impl TicketSource for StoreTicketSource {
    async fn fetch(&self, station: Station) -> Result<Vec<Ticket>, FeedError> {
        let tickets = self.tickets.clone();
        tokio::task::spawn_blocking(move || tickets.station_tickets(station, true))
            .await
            .map_err(|e| FeedError::Source(e.to_string()))?
            .map_err(|e| FeedError::Source(e.to_string()))
    }
}

#[derive(Deserialize)]
struct StationTicketsBody {
    tickets: Vec<Ticket>,
}

/// Polls a remote kds server over HTTP.
pub struct HttpTicketSource {
    client: Client,
    base_url: String,
}

impl HttpTicketSource {
    /// `base_url` is the server root, e.g. `http://10.0.0.5:8080`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Source(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TicketSource for HttpTicketSource {
    async fn fetch(&self, station: Station) -> Result<Vec<Ticket>, FeedError> {
        let url = format!(
            "{}/api/v1/stations/{}/tickets",
            self.base_url,
            station.path_segment()
        );
        debug!(%url, "Fetching station tickets");

        let response = self
            .client
            .get(&url)
            .query(&[("include_done", "true")])
            .send()
            .await
            .map_err(|e| FeedError::Source(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FeedError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: StationTicketsBody = response
            .json()
            .await
            .map_err(|e| FeedError::Source(format!("Failed to parse tickets: {}", e)))?;

        Ok(body.tickets)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ticket::SqliteTicketStore;

    #[tokio::test]
    async fn test_store_source_returns_station_tickets() {
        let service = TicketService::new(Arc::new(SqliteTicketStore::in_memory().unwrap()));
        service.create("o-1", Station::Kitchen).unwrap();
        service.create("o-1", Station::Bar).unwrap();
        service.create("o-2", Station::Kitchen).unwrap();

        let source = StoreTicketSource::new(service);
        let kitchen = source.fetch(Station::Kitchen).await.unwrap();

        assert_eq!(kitchen.len(), 2);
        assert!(kitchen.iter().all(|t| t.station == Station::Kitchen));
        assert_eq!(kitchen[0].order_id, "o-1");
    }

    #[tokio::test]
    async fn test_http_source_unreachable_is_source_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let source = HttpTicketSource::new("http://127.0.0.1:9/", Duration::from_millis(200)).unwrap();
        let result = source.fetch(Station::Bar).await;
        assert!(matches!(result, Err(FeedError::Source(_))));
    }

    #[test]
    fn test_http_source_trims_base_url() {
        let source = HttpTicketSource::new("http://kds.local:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url, "http://kds.local:8080");
    }
}
