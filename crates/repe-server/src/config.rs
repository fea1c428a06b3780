//! Server configuration

use serde::{Deserialize, Serialize};

/// Listen configuration for a REPE TCP server.
///
/// The host follows the resolution rules of the stack: `""`, `"*"`, and
/// `"0.0.0.0"` listen on all IPv4 interfaces, `"::"` on all IPv6
/// interfaces, anything else is name-resolved (IPv4 preferred).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Largest accepted frame payload (query + body) in bytes.
    /// `None` = unlimited. Headers declaring more are rejected before
    /// anything is allocated for them.
    pub max_message_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            max_message_size: Some(10 * 1024 * 1024), // 10 MB default
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the maximum accepted frame payload size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Accept frames of any size.
    pub fn with_unlimited_message_size(mut self) -> Self {
        self.max_message_size = None;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max_size) = self.max_message_size {
            if max_size == 0 {
                return Err("Maximum message size must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_cap() {
        let config = ServerConfig::new("127.0.0.1", 0).with_max_message_size(0);
        assert!(config.validate().is_err());
        assert!(ServerConfig::new("127.0.0.1", 0)
            .with_unlimited_message_size()
            .validate()
            .is_ok());
    }
}
