use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Feed intervals are non-zero and the backoff cap is not below the poll interval
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let feed = &config.feed;
    if feed.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "feed.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if feed.request_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "feed.request_timeout_ms cannot be 0".to_string(),
        ));
    }
    if feed.max_backoff_ms < feed.poll_interval_ms {
        return Err(ConfigError::ValidationError(format!(
            "feed.max_backoff_ms ({}) must be at least feed.poll_interval_ms ({})",
            feed.max_backoff_ms, feed.poll_interval_ms
        )));
    }

    Ok(())
}
