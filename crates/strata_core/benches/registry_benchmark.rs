//! # Registry Benchmark
//!
//! Measures the replication hot paths:
//! 1. Outbound: encode every component of 10k entities
//! 2. Inbound: apply a 10k-entity update batch
//! 3. Interpolation over 10k sampled entities

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::codec::{PropertyValue, ValueKind};
use strata_core::ecs::{ApplyMode, Component, ComponentType, ComponentTypes, Registry, SchemaBuilder};
use strata_core::error::TypeMismatch;
use strata_core::{ManualClock, RegistryConfig};
use strata_shared::{EntityUpdate, NetworkPolicy, Vec2};

const ENTITY_COUNT: u32 = 10_000;

#[derive(Clone, Debug, Default)]
struct Body {
    position: Vec2,
    heading: f32,
}

impl Component for Body {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        match index {
            0 => Some(self.position.into()),
            1 => Some(self.heading.into()),
            _ => None,
        }
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        match index {
            0 => self.position = value.try_into()?,
            1 => self.heading = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

impl ComponentType for Body {
    const NAME: &'static str = "Body";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema
            .property("position", 0, ValueKind::Vec2)
            .property("heading", 1, ValueKind::F32);
    }
}

fn populated(config: RegistryConfig) -> (Registry, Arc<ManualClock>) {
    let mut types = ComponentTypes::with_builtins();
    types.register::<Body>().unwrap();
    let clock = Arc::new(ManualClock::new(0.0));
    let mut registry = Registry::new(Arc::new(types), config).with_clock(clock.clone());
    for i in 0..ENTITY_COUNT {
        let e = registry.create_entity(None).unwrap();
        let f = i as f32;
        registry
            .add_component(
                e,
                Body {
                    position: Vec2::new(f, -f),
                    heading: f * 0.01,
                },
            )
            .unwrap();
    }
    let _ = registry.drain_notifications();
    (registry, clock)
}

fn updates(registry: &Registry) -> Vec<EntityUpdate> {
    registry
        .entities()
        .map(|e| {
            let c = &e.components()[0];
            EntityUpdate::new(e.id()).with_component(c.kind_id(), c.encode_all().unwrap())
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let (registry, _) = populated(RegistryConfig::authority());
    c.bench_function("encode_10k_components", |b| {
        b.iter(|| black_box(updates(&registry).len()));
    });
}

fn bench_apply_instant(c: &mut Criterion) {
    let (source, _) = populated(RegistryConfig::authority());
    let batch = updates(&source);
    let (mut target, _) = populated(RegistryConfig::peer());

    c.bench_function("apply_10k_updates_instant", |b| {
        b.iter(|| black_box(target.apply_batch(&batch, ApplyMode::Instant).applied));
    });
}

fn bench_interpolation(c: &mut Criterion) {
    let (source, _) = populated(RegistryConfig::authority());
    let batch = updates(&source);
    let (mut target, clock) = populated(RegistryConfig::peer());

    c.bench_function("interpolate_10k_entities", |b| {
        let mut now = 0.0;
        b.iter(|| {
            now += 0.05;
            clock.set(now);
            target.apply_batch(&batch, ApplyMode::Interpolated);
            black_box(target.apply_interpolation(0.1))
        });
    });
}

criterion_group!(benches, bench_encode, bench_apply_instant, bench_interpolation);
criterion_main!(benches);
