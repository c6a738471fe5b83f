//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every key is optional.
//!
//! ```toml
//! tick_rate = 60
//! log_filter = "info,strata_networking=debug"
//! templates = "config/templates.toml"
//!
//! [replication]
//! mode = "interpolated"
//! max_packet_size = 1200
//!
//! [registry]
//! render_delay_secs = 0.1
//!
//! [registry.system_runners]
//! movement = "authority"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_core::ecs::{ApplyMode, Runner, TemplateLibrary};
use strata_core::RegistryConfig;
use strata_shared::{MAX_PACKET_SIZE, TICK_RATE};

use crate::error::{SimulationError, SimulationResult};

/// How the peer side consumes replication traffic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Instant assignment or interpolation samples.
    pub mode: ApplyMode,
    /// Largest datagram the replicator emits.
    pub max_packet_size: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            mode: ApplyMode::Interpolated,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

/// Top-level simulation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed ticks per second on both sides.
    pub tick_rate: u32,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Template library file, if any.
    pub templates: Option<PathBuf>,
    /// Replication settings.
    pub replication: ReplicationConfig,
    /// Registry settings shared by both sides. The runner is set per side.
    pub registry: RegistryConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            log_filter: "info".to_owned(),
            templates: None,
            replication: ReplicationConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Parse`] for malformed input; `origin` names the
    /// source in the error.
    pub fn from_toml_str(source: &str, origin: &Path) -> SimulationResult<Self> {
        toml::from_str(source).map_err(|source| SimulationError::Parse {
            path: origin.to_owned(),
            source,
        })
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// IO and parse errors.
    pub fn load(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let path = path.as_ref();
        let source = read(path)?;
        Self::from_toml_str(&source, path)
    }

    /// Registry config for one side.
    #[must_use]
    pub fn registry_for(&self, runner: Runner) -> RegistryConfig {
        RegistryConfig {
            runner,
            ..self.registry.clone()
        }
    }

    /// Loads the configured template library, if any.
    ///
    /// # Errors
    ///
    /// IO and parse errors.
    pub fn load_templates(&self) -> SimulationResult<Option<TemplateLibrary>> {
        let Some(path) = &self.templates else {
            return Ok(None);
        };
        let source = read(path)?;
        TemplateLibrary::from_toml_str(&source)
            .map(Some)
            .map_err(|source| SimulationError::Parse {
                path: path.clone(),
                source,
            })
    }
}

fn read(path: &Path) -> SimulationResult<String> {
    std::fs::read_to_string(path).map_err(|source| SimulationError::Io {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ecs::RunsOn;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SimulationConfig::from_toml_str("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.replication.mode, ApplyMode::Interpolated);
    }

    #[test]
    fn test_nested_tables() {
        let config = SimulationConfig::from_toml_str(
            r#"
tick_rate = 30
templates = "templates.toml"

[replication]
mode = "instant"

[registry]
render_delay_secs = 0.25

[registry.system_runners]
movement = "both"
"#,
            Path::new("sim.toml"),
        )
        .unwrap();

        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.replication.mode, ApplyMode::Instant);
        assert_eq!(config.replication.max_packet_size, 1200);
        assert_eq!(config.templates.as_deref(), Some(Path::new("templates.toml")));

        let peer = config.registry_for(Runner::Peer);
        assert_eq!(peer.runner, Runner::Peer);
        assert!((peer.render_delay_secs - 0.25).abs() < f64::EPSILON);
        assert_eq!(peer.runner_override("movement"), Some(RunsOn::Both));
    }

    #[test]
    fn test_errors_name_the_file() {
        let error = SimulationConfig::from_toml_str("tick_rate = \"fast\"", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(error, SimulationError::Parse { ref path, .. } if path == Path::new("bad.toml")));

        let missing = SimulationConfig::load("/nonexistent/strata.toml").unwrap_err();
        assert!(matches!(missing, SimulationError::Io { .. }));
    }
}
