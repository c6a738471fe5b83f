//! Simulation error types.

use std::path::PathBuf;

use strata_core::error::{ConfigError, EcsError};
use strata_networking::NetworkError;
use thiserror::Error;

/// Errors raised while setting up or running a simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// A config or template file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A config or template file is not valid TOML for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// Component kinds or systems were declared inconsistently.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Registry operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Replication traffic failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The logging subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl SimulationError {
    /// Returns true if the other side of the transport is gone.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Network(NetworkError::Disconnected))
    }
}

/// Result type for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;
