// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for the REPE stack
//!
//! Console logging through `tracing-subscriber`. A `RUST_LOG` setting is
//! used verbatim when present; otherwise the filter comes from the
//! [`DebugFlags`] selection.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::DebugFlags;

/// Initialize console logging.
///
/// Libraries never call this; binaries and tests do, once.
pub fn init_logging(flags: &DebugFlags) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) => EnvFilter::try_new(&spec)
            .map_err(|e| anyhow!("Invalid RUST_LOG '{}': {}", spec, e))?,
        Err(_) => EnvFilter::new(flags.to_filter_string()),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    Registry::default()
        .with(console_layer.boxed())
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

/// Initialize logging from the `REPE_DEBUG` environment selection.
pub fn init_logging_default() -> Result<()> {
    init_logging(&DebugFlags::from_env())
}
