//! Tracing infrastructure for debugging gridmix.
//!
//! Enable with `--features tracing`. All trace macros become no-ops when
//! the feature is disabled, ensuring zero overhead in production.

/// Initialize the tracing subscriber with timestamps.
///
/// Call this at the start of tests or the binaries to enable trace output.
/// Does nothing if the `tracing` feature is not enabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridmix=debug"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

// When tracing is enabled, re-export macros from the tracing crate.
#[cfg(feature = "tracing")]
pub(crate) use tracing::debug;

// When tracing is disabled, provide a no-op macro implementation.
#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
