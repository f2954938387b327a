//! Configuration for the queue-admission client.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ticket server (e.g. `http://localhost:8000/ticketchief`).
    pub base_url: String,
    /// Delay between non-terminal poll iterations in milliseconds.
    ///
    /// Exists to bound request rate against the server, not for correctness.
    pub poll_interval_ms: u64,
    /// Interval between event-metadata refreshes in milliseconds.
    pub refresh_interval_ms: u64,
    /// Per-request timeout in seconds; a hit surfaces as a transport error.
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("TICKETCHIEF_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/ticketchief".to_string()),
            poll_interval_ms: env::var("TICKETCHIEF_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            refresh_interval_ms: env::var("TICKETCHIEF_REFRESH_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            request_timeout_secs: env::var("TICKETCHIEF_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Poll throttle as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Metadata refresh interval as a [`Duration`].
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/ticketchief".to_string(),
            poll_interval_ms: 500,
            refresh_interval_ms: 1000,
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_client_timing() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.refresh_interval(), Duration::from_millis(1000));
    }
}
