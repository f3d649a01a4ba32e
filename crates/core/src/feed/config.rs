use serde::{Deserialize, Serialize};

/// How a station display treats completed and cancelled tickets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminalDisplay {
    /// Drop terminal tickets from the snapshot.
    #[default]
    Hide,
    /// Keep them in a separate "done" section.
    Separate,
}

/// Station display feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Delay between successful polls (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single fetch (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Cap for the retry delay after consecutive failures (ms).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default)]
    pub terminal_display: TerminalDisplay,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    1500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            terminal_display: TerminalDisplay::default(),
        }
    }
}
