//! Fleet configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behavior for per-node calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per call, including the first
    pub max_attempts: u32,
    /// Sleep between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Declarative node description for fleet construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub tags: Vec<String>,
    /// Per-node request deadline; zero falls back to the fleet default
    pub timeout: Duration,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            tags: Vec::new(),
            timeout: Duration::ZERO,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate configuration. A zero timeout is allowed: it means the
    /// fleet-wide default applies.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Node name cannot be empty".to_string());
        }
        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(NodeConfig::new("a", "127.0.0.1", 5510).validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(RetryPolicy::new(0, Duration::ZERO).validate().is_err());
        assert!(NodeConfig::new("", "127.0.0.1", 5510).validate().is_err());
        assert!(NodeConfig::new("a", "", 5510).validate().is_err());
    }
}
