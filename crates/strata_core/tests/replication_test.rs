//! Integration test: authority and peer registries converge through
//! encoded payloads alone.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::codec::{PropertyValue, ValueKind};
use strata_core::ecs::{ApplyMode, Component, ComponentType, ComponentTypes, Registry, SchemaBuilder};
use strata_core::error::TypeMismatch;
use strata_core::{ManualClock, RegistryConfig};
use strata_shared::{Color, EntityUpdate, NetworkPolicy, Notification, Vec2};

#[derive(Clone, Debug, Default, PartialEq)]
struct Sprite {
    position: Vec2,
    tint: Color,
    frame: u16,
    name: String,
    layers: Vec<i32>,
}

impl Component for Sprite {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        match index {
            0 => Some(self.position.into()),
            2 => Some(self.tint.into()),
            4 => Some(self.frame.into()),
            9 => Some(self.name.clone().into()),
            12 => Some(PropertyValue::array(self.layers.clone())),
            _ => None,
        }
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        match index {
            0 => self.position = value.try_into()?,
            2 => self.tint = value.try_into()?,
            4 => self.frame = value.try_into()?,
            9 => self.name = value.try_into()?,
            12 => self.layers = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

impl ComponentType for Sprite {
    const NAME: &'static str = "Sprite";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema
            .property("position", 0, ValueKind::Vec2)
            .property("tint", 2, ValueKind::Color)
            .property("frame", 4, ValueKind::U16)
            .property("name", 9, ValueKind::Text)
            .property("layers", 12, ValueKind::array_of(ValueKind::I32));
    }
}

fn types() -> Arc<ComponentTypes> {
    let mut types = ComponentTypes::with_builtins();
    types.register::<Sprite>().unwrap();
    Arc::new(types)
}

fn sprite(i: u16) -> Sprite {
    let f = f32::from(i);
    Sprite {
        position: Vec2::new(f, f * 2.0),
        tint: Color::new(0.5, 0.25, 1.0, 1.0),
        frame: i,
        name: format!("sprite-{i}"),
        layers: vec![i32::from(i), -1],
    }
}

/// Full-state updates for every entity, as a replicator would send them.
fn full_state(registry: &Registry) -> Vec<EntityUpdate> {
    registry
        .entities()
        .map(|e| {
            e.components().iter().fold(EntityUpdate::new(e.id()), |update, c| {
                update.with_component(c.kind_id(), c.encode_all().unwrap())
            })
        })
        .collect()
}

/// Mirrors the authority's lifecycle notifications on the peer.
fn mirror_lifecycle(authority: &Registry, peer: &mut Registry) {
    for note in authority.drain_notifications() {
        match note {
            Notification::EntityAdded { entity } => {
                peer.create_entity(Some(entity)).unwrap();
            }
            Notification::EntityDestroyed { entity } => {
                peer.destroy_entity(entity).unwrap();
            }
            Notification::PropertyChanged { .. } => {}
        }
    }
}

#[test]
fn test_peer_converges_on_full_state() {
    let mut authority = Registry::new(types(), RegistryConfig::authority());
    let mut peer = Registry::new(types(), RegistryConfig::peer());

    for i in 0..32 {
        let e = authority.create_entity(None).unwrap();
        authority.add_component(e, sprite(i)).unwrap();
    }
    mirror_lifecycle(&authority, &mut peer);

    let report = peer.apply_batch(&full_state(&authority), ApplyMode::Instant);
    assert!(report.is_clean());
    assert_eq!(report.applied, 32);
    assert_eq!(peer.content_hash(), authority.content_hash());
    assert_eq!(peer.component::<Sprite>(authority.entities().next().unwrap().id()), Some(&sprite(0)));
}

#[test]
fn test_destruction_replicates() {
    let mut authority = Registry::new(types(), RegistryConfig::authority());
    let mut peer = Registry::new(types(), RegistryConfig::peer());
    let keep = authority.create_entity(None).unwrap();
    let doomed = authority.create_entity(None).unwrap();
    authority.add_component(keep, sprite(1)).unwrap();
    authority.add_component(doomed, sprite(2)).unwrap();
    mirror_lifecycle(&authority, &mut peer);
    peer.apply_batch(&full_state(&authority), ApplyMode::Instant);

    authority.destroy_entity(doomed).unwrap();
    authority.run_tick(1.0 / 60.0);
    mirror_lifecycle(&authority, &mut peer);
    peer.run_tick(1.0 / 60.0);

    assert!(!peer.contains(doomed));
    assert_eq!(peer.content_hash(), authority.content_hash());
}

#[test]
fn test_interpolated_peer_lags_by_render_delay() {
    let clock = Arc::new(ManualClock::new(0.0));
    let mut authority = Registry::new(types(), RegistryConfig::authority());
    let mut peer = Registry::new(types(), RegistryConfig::peer()).with_clock(clock.clone());

    let e = authority.create_entity(None).unwrap();
    authority.add_component(e, sprite(0)).unwrap();
    mirror_lifecycle(&authority, &mut peer);

    for step in 0..=10_u16 {
        clock.set(f64::from(step) * 0.1);
        authority
            .set_property(e, "Sprite", "position", Vec2::new(f32::from(step) * 10.0, 0.0))
            .unwrap();
        let report = peer.apply_batch(&full_state(&authority), ApplyMode::Interpolated);
        assert!(report.is_clean());
    }

    // Render at 0.95 - 0.1 = 0.85, between the samples at 0.8 and 0.9.
    clock.set(0.95);
    peer.apply_interpolation(0.1);
    let x = peer.component::<Sprite>(e).unwrap().position.x;
    assert!((x - 85.0).abs() < 1e-3, "x = {x}");
}

#[test]
fn test_truncated_payloads_never_apply() {
    let mut authority = Registry::new(types(), RegistryConfig::authority());
    let e = authority.create_entity(None).unwrap();
    authority.add_component(e, sprite(7)).unwrap();
    let payload = authority.entity(e).unwrap().components()[0]
        .encode_all()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..200 {
        let mut peer = Registry::new(types(), RegistryConfig::peer());
        peer.create_entity(Some(e)).unwrap();
        peer.add_component(e, Sprite::default()).unwrap();
        let before = peer.content_hash();

        let cut = rng.gen_range(0..payload.len());
        let update = EntityUpdate::new(e).with_component(0, payload[..cut].to_vec());
        assert!(peer.apply_entity_update_instantly(&update).is_err());
        assert_eq!(peer.content_hash(), before);
    }
}
