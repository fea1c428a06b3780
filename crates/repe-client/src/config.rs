//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for a REPE client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,

    /// Default per-request deadline; individual requests may override it
    pub timeout: Duration,

    /// Set TCP_NODELAY on connect
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5510,
            timeout: Duration::from_secs(30),
            nodelay: true,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("Timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_host_and_zero_timeout() {
        assert!(ClientConfig::new("", 5510).validate().is_err());
        assert!(ClientConfig::new("127.0.0.1", 5510)
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
