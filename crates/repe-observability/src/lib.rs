// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # repe-observability
//!
//! Unified logging initialization for the REPE stack. Library crates only
//! emit `tracing` events; this crate is where binaries and tests install
//! the subscriber, with per-component debug selection via `REPE_DEBUG`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::DebugFlags;
pub use init::{init_logging, init_logging_default};
