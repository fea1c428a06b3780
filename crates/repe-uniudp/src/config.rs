//! UniUDP transport configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by the UniUDP sender, server, and fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniUdpConfig {
    /// How many times each data/parity packet is transmitted
    pub redundancy: u16,

    /// Payload bytes per data chunk
    pub chunk_size: u16,

    /// Data chunks covered by one XOR parity chunk; 1 disables FEC
    pub fec_group_size: u16,

    /// Pause between consecutive packet transmissions
    pub delay: Duration,

    /// Receive wait bound between packets of one message
    pub inactivity_timeout: Duration,

    /// Total receive deadline for one message
    pub overall_timeout: Duration,
}

impl Default for UniUdpConfig {
    fn default() -> Self {
        Self {
            redundancy: 1,
            chunk_size: 1024,
            fec_group_size: 1,
            delay: Duration::ZERO,
            inactivity_timeout: Duration::from_secs(1),
            overall_timeout: Duration::from_secs(10),
        }
    }
}

impl UniUdpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redundancy(mut self, redundancy: u16) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_fec_group_size(mut self, fec_group_size: u16) -> Self {
        self.fec_group_size = fec_group_size;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.redundancy == 0 {
            return Err("redundancy must be at least 1".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be at least 1".to_string());
        }
        if self.fec_group_size == 0 || self.fec_group_size > 0x7FFF {
            return Err("fec_group_size must be in 1..=32767".to_string());
        }
        Ok(())
    }
}
