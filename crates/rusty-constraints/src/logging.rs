// File: rusty-constraints/src/logging.rs
// Purpose: Tracing subscriber setup for applications and tests

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,rusty_constraints_core=debug";

/// Install a fmt subscriber honouring `RUST_LOG`
///
/// Fails if a global subscriber is already installed.
pub fn try_init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Like [`try_init`], ignoring an already installed subscriber
pub fn init() {
    if let Err(e) = try_init() {
        tracing::debug!("{}", e);
    }
}
