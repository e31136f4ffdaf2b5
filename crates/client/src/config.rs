//! Session configuration.
//!
//! The hosting application supplies the endpoint and tuning here; this layer
//! never reads process environment itself.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

/// Reconnection attempts before the session gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme: {0} (expected ws or wss)")]
    UnsupportedScheme(String),
}

/// Connection settings for one [`Session`](crate::session::Session).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl ClientConfig {
    /// Parse and validate the realtime endpoint; reconnect tuning starts at
    /// the documented defaults (5000 ms, 5 attempts).
    pub fn new(server_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(server_url)?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        Ok(Self {
            server_url: url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ws_and_wss() {
        assert!(ClientConfig::new("ws://localhost:4000/rt").is_ok());
        assert!(ClientConfig::new("wss://play.example.com/rt").is_ok());
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = ClientConfig::new("http://localhost:4000/rt").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "http"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("ws://localhost:4000/rt").unwrap();
        assert_eq!(config.reconnect_delay, Duration::from_millis(5_000));
        assert_eq!(config.max_reconnect_attempts, 5);
    }
}
