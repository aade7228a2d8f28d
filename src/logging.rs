//! Tracing setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt};

/// Install a `fmt` subscriber for the library and the calling binary crate
/// (`bin`, usually `env!("CARGO_CRATE_NAME")`).
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level
/// (0: info, 1: debug, 2+: trace).
pub fn init_tracing(bin: &str, verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("snapshot_cleaner={level},{bin}={level}")));

    fmt().with_env_filter(filter).with_target(false).init();
}
