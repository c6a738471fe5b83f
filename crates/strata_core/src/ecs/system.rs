//! # Systems & Phases
//!
//! ```text
//! tick N:  BeforeUpdate -> [flush destroyed] -> Update -> AfterUpdate -> Render
//! ```
//!
//! Every phase visits the active systems in registration order. A system
//! sees only entities holding all of its required components.

use serde::{Deserialize, Serialize};
use strata_shared::EntityId;

use super::registry::Registry;

/// Which side a registry runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runner {
    /// Simulation authority (server).
    #[default]
    Authority,
    /// Rendering peer (client).
    Peer,
}

/// Which side(s) a system executes on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunsOn {
    /// Authority only.
    Authority,
    /// Peer only.
    Peer,
    /// Both sides.
    #[default]
    Both,
}

impl RunsOn {
    /// Returns true if a system with this affinity runs on `runner`.
    #[must_use]
    pub const fn matches(self, runner: Runner) -> bool {
        matches!(
            (self, runner),
            (Self::Both, _) | (Self::Authority, Runner::Authority) | (Self::Peer, Runner::Peer)
        )
    }
}

/// Tick pipeline phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before simulation; destruction requests here take effect this tick.
    BeforeUpdate,
    /// Main simulation.
    Update,
    /// After simulation.
    AfterUpdate,
    /// Presentation.
    Render,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Self; 4] = [Self::BeforeUpdate, Self::Update, Self::AfterUpdate, Self::Render];
}

/// Timing of the tick being run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickTime {
    /// Tick number, starting at 1 for the first tick run.
    pub tick: u64,
    /// Seconds covered by this tick.
    pub delta: f64,
}

/// Handle of a registered system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub usize);

/// Per-tick logic over a filtered entity set.
///
/// All phase hooks default to no-ops. The registry is passed in, so
/// systems mutate state through the same API as everyone else.
pub trait System: Send {
    /// Stable system name, used for runner overrides and logs.
    fn name(&self) -> &str;

    /// Kind names an entity must hold to be visited.
    fn required_components(&self) -> Vec<&'static str>;

    /// Default runner affinity.
    fn runs_on(&self) -> RunsOn {
        RunsOn::Both
    }

    /// Phase hook.
    fn before_update(&mut self, _registry: &mut Registry, _entities: &[EntityId], _time: &TickTime) {}

    /// Phase hook.
    fn update(&mut self, _registry: &mut Registry, _entities: &[EntityId], _time: &TickTime) {}

    /// Phase hook.
    fn after_update(&mut self, _registry: &mut Registry, _entities: &[EntityId], _time: &TickTime) {}

    /// Phase hook.
    fn render(&mut self, _registry: &mut Registry, _entities: &[EntityId], _time: &TickTime) {}
}

pub(crate) fn run_phase_hook(
    system: &mut dyn System,
    phase: Phase,
    registry: &mut Registry,
    entities: &[EntityId],
    time: &TickTime,
) {
    match phase {
        Phase::BeforeUpdate => system.before_update(registry, entities, time),
        Phase::Update => system.update(registry, entities, time),
        Phase::AfterUpdate => system.after_update(registry, entities, time),
        Phase::Render => system.render(registry, entities, time),
    }
}
