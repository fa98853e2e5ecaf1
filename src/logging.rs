//! Tracing subscriber setup for the binary.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Output goes to stderr so JSON printed on stdout stays machine-readable.
///
/// # Errors
///
/// Returns `TryInitError` if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}
