//! # repe-fleet
//!
//! Parallel fan-out over a named set of REPE nodes. Each node owns one
//! multiplexing client and a tag set; broadcasts reach exactly the nodes
//! whose tags contain every requested tag, with per-node retries and
//! structured per-node results.

pub mod config;
pub mod error;
pub mod fleet;

pub use config::{NodeConfig, RetryPolicy};
pub use error::{FleetError, Result};
pub use fleet::{
    ConnectReport, Fleet, NodeHealth, RemoteResult, DEFAULT_HEALTH_ENDPOINT, HEALTH_CHECK_TIMEOUT,
};
