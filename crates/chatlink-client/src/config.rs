//! Streamer configuration.

use std::time::Duration;

use chatlink_core::STREAM_ENDPOINT;
use url::Url;

use crate::error::StreamError;

/// Default cap on automatic reconnection attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default heartbeat interval.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Exponential backoff schedule for reconnection attempts.
///
/// The first retry waits `initial_delay`; each subsequent retry multiplies
/// the previous delay by `multiplier`, capped at `max_delay`. The schedule
/// resets whenever a connection is successfully established.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    /// Delay before retry number `attempt` (zero-based).
    ///
    /// Saturates at `max_delay`; the product is computed in seconds so large
    /// attempt numbers cannot overflow a `Duration`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.min(63) as i32).max(0.0);
        let secs = (self.initial_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Configuration for a [`Streamer`](crate::Streamer).
///
/// `base_url` is the service root (e.g. `wss://api.example.com`); the
/// streaming endpoint path and credentials are appended when the stream URL
/// is built.
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Service base URL. Must use the `ws` or `wss` scheme.
    pub base_url: String,
    /// Session to attach to.
    pub session_id: String,
    /// API key presented as a query parameter.
    pub api_key: String,
    /// Cap on automatic reconnection attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Bound on a single connection attempt.
    pub connect_timeout: Duration,
    /// Interval between heartbeat pings while connected.
    pub ping_interval: Duration,
    /// Reconnection backoff schedule.
    pub reconnect_backoff: ExponentialBackoff,
}

impl StreamerConfig {
    /// Create a configuration with default timeouts and backoff.
    pub fn new(
        base_url: impl Into<String>,
        session_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            session_id: session_id.into(),
            api_key: api_key.into(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            reconnect_backoff: ExponentialBackoff::default(),
        }
    }

    /// Set the reconnection attempt cap.
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the heartbeat interval.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set the reconnection backoff schedule.
    #[must_use]
    pub fn with_reconnect_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Build the full stream URL: endpoint path plus credential and session
    /// query parameters.
    pub fn stream_url(&self) -> Result<Url, StreamError> {
        let mut url = Url::parse(&self.base_url)?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(StreamError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        }

        let path = format!("{}{STREAM_ENDPOINT}", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("session_id", &self.session_id);

        Ok(url)
    }
}
