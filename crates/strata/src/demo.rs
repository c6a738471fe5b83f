//! # Demo Content
//!
//! A small drone swarm used by the loopback binary and the end-to-end
//! tests. Both sides must call [`component_types`] so kind ids agree.
//!
//! ```text
//! AUTHORITY: Spawner ─> Expiry (before_update) ─> Movement (update)
//! PEER:      Census (render)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_core::codec::{PropertyValue, ValueKind};
use strata_core::ecs::{
    Component, ComponentType, ComponentTypes, Registry, RunsOn, SchemaBuilder, System, TemplateLibrary,
    TickTime,
};
use strata_core::error::TypeMismatch;
use strata_core::interpolation::InterpolationMode;
use strata_shared::{EntityId, NetworkPolicy, Vec2};
use tracing::{trace, warn};

use crate::error::SimulationResult;

/// Built-in templates, used when no template file is configured.
pub const DEMO_TEMPLATES: &str = r#"
[templates.drone]
[[templates.drone.components]]
kind = "Position"

[[templates.drone.components]]
kind = "Velocity"
value = [2.0, 0.0]

[[templates.drone.components]]
kind = "Lifetime"
remaining = 3.0

[templates.scout]
extends = "drone"
[[templates.scout.components]]
kind = "Velocity"
value = [0.0, 6.0]

[[templates.scout.components]]
kind = "Label"
text = "scout"
"#;

// ============================================================================
// COMPONENTS
// ============================================================================

// Property 0 maps onto a single `Copy` field.
macro_rules! single_property {
    ($($ty:ident.$field:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                fn get(&self, index: u8) -> Option<PropertyValue> {
                    (index == 0).then(|| self.$field.into())
                }

                fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
                    if index == 0 {
                        self.$field = value.try_into()?;
                    }
                    Ok(())
                }
            }
        )*
    };
}

single_property!(Position.value, Velocity.value, Lifetime.remaining);

/// Where an entity is. Interpolated on the peer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Position {
    /// World position.
    pub value: Vec2,
}

impl ComponentType for Position {
    const NAME: &'static str = "Position";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema.property("value", 0, ValueKind::Vec2);
    }
}

/// Units per second. Rarely changes, so sends are throttled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Velocity {
    /// Velocity vector.
    pub value: Vec2,
}

impl ComponentType for Velocity {
    const NAME: &'static str = "Velocity";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED.with_interval(6);

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema.property_with_mode("value", 0, ValueKind::Vec2, InterpolationMode::ToInstant);
    }
}

/// Display name. Sent once with the entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Label {
    /// Text shown above the entity.
    pub text: String,
}

impl Component for Label {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        (index == 0).then(|| self.text.clone().into())
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        if index == 0 {
            self.text = value.try_into()?;
        }
        Ok(())
    }
}

impl ComponentType for Label {
    const NAME: &'static str = "Label";
    const POLICY: NetworkPolicy = NetworkPolicy {
        notify_on_mutation: false,
        notify_on_create: true,
        min_update_interval: 0,
    };

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema.property("text", 0, ValueKind::Text);
    }
}

/// Seconds until despawn. Authority bookkeeping only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lifetime {
    /// Seconds left.
    pub remaining: f32,
}

impl ComponentType for Lifetime {
    const NAME: &'static str = "Lifetime";

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema.local("remaining", 0, ValueKind::F32);
    }
}

/// Registers the demo kinds in wire order.
///
/// # Errors
///
/// Configuration errors from kind registration.
pub fn component_types() -> SimulationResult<Arc<ComponentTypes>> {
    let mut types = ComponentTypes::with_builtins();
    types.register::<Position>()?;
    types.register::<Velocity>()?;
    types.register::<Label>()?;
    types.register::<Lifetime>()?;
    Ok(Arc::new(types))
}

/// Parses [`DEMO_TEMPLATES`].
///
/// # Errors
///
/// Only if the built-in TOML is malformed.
pub fn templates() -> Result<TemplateLibrary, toml::de::Error> {
    TemplateLibrary::from_toml_str(DEMO_TEMPLATES)
}

// ============================================================================
// SYSTEMS
// ============================================================================

#[allow(clippy::cast_possible_truncation)]
fn seconds(time: &TickTime) -> f32 {
    time.delta as f32
}

/// Integrates velocity into position.
#[derive(Debug, Default)]
pub struct Movement;

impl System for Movement {
    fn name(&self) -> &str {
        "movement"
    }

    fn required_components(&self) -> Vec<&'static str> {
        vec![Position::NAME, Velocity::NAME]
    }

    fn runs_on(&self) -> RunsOn {
        RunsOn::Authority
    }

    fn update(&mut self, registry: &mut Registry, entities: &[EntityId], time: &TickTime) {
        let dt = seconds(time);
        for &entity in entities {
            let Some(velocity) = registry.component::<Velocity>(entity).map(|v| v.value) else {
                continue;
            };
            if velocity == Vec2::ZERO {
                continue;
            }
            if let Some(position) = registry.component_mut::<Position>(entity) {
                position.value = position.value + velocity * dt;
            }
            if let Err(error) = registry.mark_changed(entity, Position::NAME, "value") {
                warn!(entity = %entity, %error, "Movement lost track of entity");
            }
        }
    }
}

/// Counts down lifetimes and destroys expired entities.
#[derive(Debug, Default)]
pub struct Expiry;

impl System for Expiry {
    fn name(&self) -> &str {
        "expiry"
    }

    fn required_components(&self) -> Vec<&'static str> {
        vec![Lifetime::NAME]
    }

    fn runs_on(&self) -> RunsOn {
        RunsOn::Authority
    }

    fn before_update(&mut self, registry: &mut Registry, entities: &[EntityId], time: &TickTime) {
        let dt = seconds(time);
        for &entity in entities {
            let Some(lifetime) = registry.component_mut::<Lifetime>(entity) else {
                continue;
            };
            lifetime.remaining -= dt;
            if lifetime.remaining <= 0.0 {
                trace!(entity = %entity, "Lifetime expired");
                let _ = registry.destroy_entity(entity);
            }
        }
    }
}

/// Spawns a template every `interval` ticks, alternating between two.
#[derive(Debug)]
pub struct Spawner {
    interval: u64,
    templates: [&'static str; 2],
    spawned: u64,
}

impl Spawner {
    /// Spawns `drone` and `scout` every `interval` ticks.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            templates: ["drone", "scout"],
            spawned: 0,
        }
    }
}

impl System for Spawner {
    fn name(&self) -> &str {
        "spawner"
    }

    fn required_components(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn runs_on(&self) -> RunsOn {
        RunsOn::Authority
    }

    fn after_update(&mut self, registry: &mut Registry, _entities: &[EntityId], time: &TickTime) {
        if time.tick % self.interval != 0 {
            return;
        }
        #[allow(clippy::cast_possible_truncation)]
        let template = self.templates[(self.spawned % 2) as usize];
        match registry.create_entity_from_template(template, None) {
            Ok(entity) => {
                self.spawned += 1;
                trace!(entity = %entity, template, "Spawned");
            }
            Err(error) => warn!(template, %error, "Spawn failed"),
        }
    }
}

/// Peer-side census of renderable entities.
#[derive(Debug, Default)]
pub struct Census {
    visible: Arc<AtomicUsize>,
}

impl Census {
    /// Census publishing into `visible`.
    #[must_use]
    pub fn new(visible: Arc<AtomicUsize>) -> Self {
        Self { visible }
    }
}

impl System for Census {
    fn name(&self) -> &str {
        "census"
    }

    fn required_components(&self) -> Vec<&'static str> {
        vec![Position::NAME]
    }

    fn runs_on(&self) -> RunsOn {
        RunsOn::Peer
    }

    fn render(&mut self, _registry: &mut Registry, entities: &[EntityId], _time: &TickTime) {
        self.visible.store(entities.len(), Ordering::Relaxed);
    }
}

/// Installs every demo system. Affinity picks what actually runs.
///
/// # Errors
///
/// Only if the demo kinds are not registered.
pub fn install_systems(registry: &mut Registry, visible: Arc<AtomicUsize>) -> SimulationResult<()> {
    registry.add_system(Spawner::new(20))?;
    registry.add_system(Expiry)?;
    registry.add_system(Movement)?;
    registry.add_system(Census::new(visible))?;
    Ok(())
}
