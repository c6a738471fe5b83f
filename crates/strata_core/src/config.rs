//! Registry configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strata_shared::{DEFAULT_NOTIFICATION_BACKLOG, DEFAULT_RENDER_DELAY_SECS};

use crate::ecs::{Runner, RunsOn};

/// Settings a [`Registry`](crate::ecs::Registry) is built with.
///
/// ```toml
/// runner = "peer"
/// render_delay_secs = 0.1
/// notification_backlog = 4096
///
/// [system_runners]
/// movement = "authority"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Side this registry runs on.
    pub runner: Runner,
    /// Delay between the newest sample and the rendered state.
    pub render_delay_secs: f64,
    /// Pending notifications past which the registry warns. Nothing is dropped.
    pub notification_backlog: usize,
    /// Runner affinity overrides by system name.
    pub system_runners: HashMap<String, RunsOn>,
}

impl RegistryConfig {
    /// Config for an authority registry.
    #[must_use]
    pub fn authority() -> Self {
        Self::default()
    }

    /// Config for a peer registry.
    #[must_use]
    pub fn peer() -> Self {
        Self {
            runner: Runner::Peer,
            ..Self::default()
        }
    }

    /// Affinity of the system named `name`, if overridden.
    #[must_use]
    pub fn runner_override(&self, name: &str) -> Option<RunsOn> {
        self.system_runners.get(name).copied()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            runner: Runner::Authority,
            render_delay_secs: DEFAULT_RENDER_DELAY_SECS,
            notification_backlog: DEFAULT_NOTIFICATION_BACKLOG,
            system_runners: HashMap::new(),
        }
    }
}
