//! Base Stack (workspace facade crate).
//!
//! A trio tile-matching puzzle: tiles are stacked on layers, free tiles are
//! clicked into a five-slot collection and three of a kind clear. The
//! implementation lives in dedicated crates under `crates/`; this package
//! re-exports them as `base_stack::{types,core,host,adapter}` and adds the
//! game-loop driver used by the binaries.

pub mod app;
pub mod config;

pub use base_stack_adapter as adapter;
pub use base_stack_core as core;
pub use base_stack_host as host;
pub use base_stack_types as types;

pub use app::App;
pub use config::{AppConfig, ConfigError};

/// Install the `tracing` fmt subscriber used by the binaries.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
