//! Tracing bootstrap for host applications.
//!
//! Library crates in this workspace only emit via `tracing`; whoever embeds
//! the pipeline decides where logs go. This helper wires up the common case:
//! a formatted subscriber filtered by `RUST_LOG`, defaulting to warnings
//! from the `slippi::*` targets.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber honoring `RUST_LOG`. Safe to call more
/// than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slippi=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
