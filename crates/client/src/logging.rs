//! Logging macros over `tracing`, plus the subscriber setup used by the
//! binary.
//!
//! Events keep the calling module as their target, so `RUST_LOG` filters
//! such as `souk_client::stores=debug` work as expected.

use tracing_subscriber::EnvFilter;

#[doc(hidden)]
pub use tracing as __tracing;

/// Install a formatting subscriber filtered by `RUST_LOG`, or `default_filter`
/// when it is unset.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second install (e.g. from tests) is not an error worth reporting.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::__tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::__tracing::error!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::__tracing::debug!($($arg)*)
    };
}
