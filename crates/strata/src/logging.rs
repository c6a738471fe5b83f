//! Tracing subscriber setup for the binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{SimulationError, SimulationResult};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// `RUST_LOG` if set and valid, else `fallback`, else [`DEFAULT_FILTER`].
#[must_use]
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global console subscriber.
///
/// # Errors
///
/// [`SimulationError::Logging`] if a global subscriber is already set.
pub fn init_logging(fallback: &str) -> SimulationResult<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(console_layer)
        .try_init()
        .map_err(|error| SimulationError::Logging(error.to_string()))
}
