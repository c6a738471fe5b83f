//! # Authority-side Replication
//!
//! ```text
//! Registry ──notifications──> Replicator ──packets──> Transport
//!                               │
//!                               ├─ added      → EntityAdded + full baseline
//!                               ├─ dirty      → (entity, kind) → PropertyMask
//!                               └─ destroyed  → EntityDestroyed
//! ```
//!
//! Per flush, packets go out in that order: spawns, updates, destructions.
//! A dirty component whose throttle is not yet due stays dirty and is
//! retried on a later tick.

use std::collections::BTreeMap;

use strata_core::codec::PropertyMask;
use strata_core::ecs::{NotificationReceiver, Registry};
use strata_shared::{EntityId, EntityUpdate, KindId, Notification};
use tracing::{debug, trace, warn};

use crate::error::NetworkResult;
use crate::protocol::{encode_packet, pack_updates, Packet};
use crate::transport::Transport;

/// Outbound statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplicationStats {
    /// Packets handed to the transport.
    pub packets_sent: u64,
    /// Bytes handed to the transport.
    pub bytes_sent: u64,
    /// Entity updates packed.
    pub updates_sent: u64,
    /// Component sends deferred by their throttle.
    pub throttled: u64,
    /// Updates dropped for not fitting any packet.
    pub oversized: u64,
}

/// Turns registry notifications into replication packets.
#[derive(Debug)]
pub struct Replicator {
    notifications: NotificationReceiver,
    max_packet_size: usize,
    added: Vec<EntityId>,
    destroyed: Vec<EntityId>,
    dirty: BTreeMap<(EntityId, KindId), PropertyMask>,
    stats: ReplicationStats,
}

#[allow(clippy::cast_possible_truncation)]
const fn wire_tick(tick: u64) -> u32 {
    tick as u32
}

impl Replicator {
    /// Creates a replicator consuming `registry`'s notifications.
    ///
    /// It must be the only consumer: notifications drained elsewhere are
    /// never replicated.
    #[must_use]
    pub fn new(registry: &Registry, max_packet_size: usize) -> Self {
        Self {
            notifications: registry.notifications(),
            max_packet_size,
            added: Vec::new(),
            destroyed: Vec::new(),
            dirty: BTreeMap::new(),
            stats: ReplicationStats::default(),
        }
    }

    /// Outbound statistics.
    #[must_use]
    pub const fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    /// Components waiting to be sent.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Folds pending notifications into the outbound state.
    pub fn observe(&mut self, registry: &Registry) {
        for notification in self.notifications.drain() {
            match notification {
                Notification::EntityAdded { entity } => {
                    if !self.added.contains(&entity) {
                        self.added.push(entity);
                    }
                }
                Notification::EntityDestroyed { entity } => {
                    self.dirty.retain(|(e, _), _| *e != entity);
                    // Never announced: the peer need not hear about it at all.
                    if let Some(pos) = self.added.iter().position(|&e| e == entity) {
                        self.added.remove(pos);
                    } else {
                        self.destroyed.push(entity);
                    }
                }
                Notification::PropertyChanged {
                    entity,
                    component,
                    property,
                    ..
                } => {
                    let Some(schema) = registry.types().schema_by_name(component) else {
                        warn!(entity = %entity, component, "Change for unknown component kind");
                        continue;
                    };
                    let Some(descriptor) = schema.property(property) else {
                        continue;
                    };
                    self.dirty
                        .entry((entity, schema.kind_id()))
                        .or_default()
                        .insert(descriptor.index);
                }
            }
        }
    }

    /// Builds every packet due at `tick`.
    pub fn collect(&mut self, registry: &mut Registry, tick: u64) -> Vec<Packet> {
        self.observe(registry);
        let wire = wire_tick(tick);
        let mut packets = Vec::new();
        let mut updates = Vec::new();

        for entity in std::mem::take(&mut self.added) {
            packets.push(Packet::EntityAdded { tick: wire, entity });
            self.dirty.retain(|(e, _), _| *e != entity);
            if let Some(update) = baseline(registry, entity, tick) {
                updates.push(update);
            }
        }

        let mut current: Option<EntityUpdate> = None;
        let dirty = std::mem::take(&mut self.dirty);
        for ((entity, kind), mask) in dirty {
            let Some(name) = registry.types().schema(kind).map(|s| s.name()) else {
                continue;
            };
            let Ok(instance) = registry.component_instance_mut(entity, name) else {
                trace!(entity = %entity, component = name, "Dirty component gone");
                continue;
            };
            if !instance.should_send_update(tick) {
                self.stats.throttled += 1;
                self.dirty.insert((entity, kind), mask);
                continue;
            }
            let bytes = match instance.encode_mask(mask) {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(entity = %entity, component = name, %error, "Encode failed");
                    continue;
                }
            };
            match current.as_mut() {
                Some(update) if update.entity == entity => update.push(kind, bytes),
                _ => {
                    updates.extend(current.take());
                    current = Some(EntityUpdate::new(entity).with_component(kind, bytes));
                }
            }
        }
        updates.extend(current);

        self.stats.updates_sent += updates.len() as u64;
        let (update_packets, rejected) = pack_updates(wire, updates, self.max_packet_size);
        self.stats.oversized += rejected.len() as u64;
        packets.extend(update_packets);

        for entity in std::mem::take(&mut self.destroyed) {
            packets.push(Packet::EntityDestroyed { tick: wire, entity });
        }
        if !packets.is_empty() {
            debug!(tick, packets = packets.len(), "Replication flush");
        }
        packets
    }

    /// Collects and sends every packet due at `tick`. Returns the number
    /// of packets sent.
    ///
    /// # Errors
    ///
    /// The first transport error; packets after it are not sent.
    pub fn flush(
        &mut self,
        registry: &mut Registry,
        transport: &mut dyn Transport,
        tick: u64,
    ) -> NetworkResult<usize> {
        let packets = self.collect(registry, tick);
        let count = packets.len();
        for packet in packets {
            let bytes = encode_packet(&packet);
            transport.send(&bytes)?;
            self.stats.packets_sent += 1;
            self.stats.bytes_sent += bytes.len() as u64;
        }
        Ok(count)
    }

    /// Spawn packets and full baselines for every replicated entity, for a
    /// peer joining late. Does not touch throttles or pending state.
    #[must_use]
    pub fn full_state(&self, registry: &Registry, tick: u64) -> Vec<Packet> {
        let wire = wire_tick(tick);
        let mut packets: Vec<Packet> = registry
            .entities()
            .map(|e| Packet::EntityAdded {
                tick: wire,
                entity: e.id(),
            })
            .collect();
        let updates = registry
            .entities()
            .filter_map(|e| {
                let mut update = EntityUpdate::new(e.id());
                for c in e.components() {
                    if c.schema().policy().is_replicated() {
                        update.push(c.kind_id(), c.encode_all().ok()?);
                    }
                }
                (!update.is_empty()).then_some(update)
            })
            .collect();
        packets.extend(pack_updates(wire, updates, self.max_packet_size).0);
        packets
    }
}

/// Every replicated component of `entity`, fully encoded. Records the send
/// on each component's throttle.
fn baseline(registry: &mut Registry, entity: EntityId, tick: u64) -> Option<EntityUpdate> {
    let kinds: Vec<&'static str> = registry
        .entity(entity)?
        .components()
        .iter()
        .filter(|c| c.schema().policy().is_replicated())
        .map(|c| c.name())
        .collect();

    let mut update = EntityUpdate::new(entity);
    for name in kinds {
        let Ok(instance) = registry.component_instance_mut(entity, name) else {
            continue;
        };
        instance.should_send_update(tick);
        match instance.encode_all() {
            Ok(bytes) => update.push(instance.kind_id(), bytes),
            Err(error) => warn!(entity = %entity, component = name, %error, "Encode failed"),
        }
    }
    (!update.is_empty()).then_some(update)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_core::codec::{PropertyValue, ValueKind};
    use strata_core::ecs::{Component, ComponentType, ComponentTypes, SchemaBuilder};
    use strata_core::error::TypeMismatch;
    use strata_core::RegistryConfig;
    use strata_shared::NetworkPolicy;

    use super::*;
    use crate::transport::LoopbackTransport;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Marker {
        x: f32,
        y: f32,
    }

    impl Component for Marker {
        fn get(&self, index: u8) -> Option<PropertyValue> {
            match index {
                0 => Some(self.x.into()),
                1 => Some(self.y.into()),
                _ => None,
            }
        }

        fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
            match index {
                0 => self.x = value.try_into()?,
                1 => self.y = value.try_into()?,
                _ => {}
            }
            Ok(())
        }
    }

    impl ComponentType for Marker {
        const NAME: &'static str = "Marker";
        const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

        fn describe(schema: &mut SchemaBuilder<'_>) {
            schema
                .property("x", 0, ValueKind::F32)
                .property("y", 1, ValueKind::F32);
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Score {
        points: i32,
    }

    impl Component for Score {
        fn get(&self, index: u8) -> Option<PropertyValue> {
            (index == 0).then(|| self.points.into())
        }

        fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
            if index == 0 {
                self.points = value.try_into()?;
            }
            Ok(())
        }
    }

    impl ComponentType for Score {
        const NAME: &'static str = "Score";
        const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED.with_interval(2);

        fn describe(schema: &mut SchemaBuilder<'_>) {
            schema.property("points", 0, ValueKind::I32);
        }
    }

    fn authority() -> Registry {
        let mut types = ComponentTypes::with_builtins();
        types.register::<Marker>().unwrap();
        types.register::<Score>().unwrap();
        Registry::new(Arc::new(types), RegistryConfig::authority())
    }

    fn updates(packets: &[Packet]) -> Vec<&EntityUpdate> {
        packets
            .iter()
            .filter_map(|p| match p {
                Packet::EntityUpdates { updates, .. } => Some(updates),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn test_spawn_sends_baseline() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let e = registry.create_entity(None).unwrap();
        registry.add_component(e, Marker { x: 1.0, y: 2.0 }).unwrap();

        let packets = replicator.collect(&mut registry, 1);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0], Packet::EntityAdded { tick: 1, entity: e });
        let sent = updates(&packets);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].components[0].kind, 0);
        // Mask 0b11 then two f32s.
        assert_eq!(sent[0].components[0].bytes.len(), 10);
        assert_eq!(replicator.dirty_count(), 0);
        assert!(replicator.collect(&mut registry, 2).is_empty());
    }

    #[test]
    fn test_mutation_sends_only_changed_properties() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let e = registry.create_entity(None).unwrap();
        registry.add_component(e, Marker::default()).unwrap();
        replicator.collect(&mut registry, 1);

        registry.set_property(e, "Marker", "y", 4.0_f32).unwrap();
        let packets = replicator.collect(&mut registry, 2);
        assert_eq!(packets.len(), 1);
        let sent = updates(&packets);
        assert_eq!(sent[0].components[0].bytes, [0x02, 0x00, 0x00, 0x00, 0x80, 0x40]);
    }

    #[test]
    fn test_throttled_component_stays_dirty() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let e = registry.create_entity(None).unwrap();
        registry.add_component(e, Score::default()).unwrap();
        replicator.collect(&mut registry, 1);

        registry.set_property(e, "Score", "points", 5_i32).unwrap();
        assert!(replicator.collect(&mut registry, 2).is_empty());
        assert_eq!(replicator.dirty_count(), 1);
        assert_eq!(replicator.stats().throttled, 1);

        let packets = replicator.collect(&mut registry, 3);
        assert_eq!(updates(&packets).len(), 1);
        assert_eq!(replicator.dirty_count(), 0);
    }

    #[test]
    fn test_spawn_burst_past_backlog_is_fully_announced() {
        let mut types = ComponentTypes::with_builtins();
        types.register::<Marker>().unwrap();
        types.register::<Score>().unwrap();
        let config = RegistryConfig {
            notification_backlog: 16,
            ..RegistryConfig::authority()
        };
        let mut registry = Registry::new(Arc::new(types), config);
        let mut replicator = Replicator::new(&registry, 1200);
        for _ in 0..2000 {
            let e = registry.create_entity(None).unwrap();
            registry.add_component(e, Marker { x: 1.0, y: 2.0 }).unwrap();
        }
        assert!(registry.pending_notifications() >= 2000);

        let packets = replicator.collect(&mut registry, 1);
        let added = packets
            .iter()
            .filter(|p| matches!(p, Packet::EntityAdded { .. }))
            .count();
        assert_eq!(added, 2000);
        assert_eq!(updates(&packets).len(), 2000);
        assert_eq!(registry.pending_notifications(), 0);
    }

    #[test]
    fn test_short_lived_entity_is_never_announced() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let e = registry.create_entity(None).unwrap();
        registry.add_component(e, Marker::default()).unwrap();
        registry.destroy_entity(e).unwrap();
        registry.run_tick(1.0 / 60.0);

        assert!(replicator.collect(&mut registry, 1).is_empty());
    }

    #[test]
    fn test_destruction_goes_last() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let doomed = registry.create_entity(None).unwrap();
        let other = registry.create_entity(None).unwrap();
        registry.add_component(doomed, Marker::default()).unwrap();
        registry.add_component(other, Marker::default()).unwrap();
        replicator.collect(&mut registry, 1);

        registry.set_property(doomed, "Marker", "x", 1.0_f32).unwrap();
        registry.set_property(other, "Marker", "x", 1.0_f32).unwrap();
        registry.destroy_entity(doomed).unwrap();
        registry.run_tick(1.0 / 60.0);

        let packets = replicator.collect(&mut registry, 2);
        assert_eq!(packets.len(), 2);
        let sent = updates(&packets);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].entity, other);
        assert_eq!(packets[1], Packet::EntityDestroyed { tick: 2, entity: doomed });
    }

    #[test]
    fn test_updates_grouped_per_entity() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        let e = registry.create_entity(None).unwrap();
        registry.add_component(e, Marker::default()).unwrap();
        registry.add_component(e, Score::default()).unwrap();

        let packets = replicator.collect(&mut registry, 1);
        let sent = updates(&packets);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].components.len(), 2);
    }

    #[test]
    fn test_full_state_and_flush() {
        let mut registry = authority();
        let mut replicator = Replicator::new(&registry, 1200);
        for i in 0..3_u8 {
            let e = registry.create_entity(None).unwrap();
            registry.add_component(e, Marker { x: f32::from(i), y: 0.0 }).unwrap();
        }

        let late_join = replicator.full_state(&registry, 7);
        assert_eq!(late_join.len(), 4);
        assert!(late_join.iter().all(|p| p.tick() == 7));

        let (mut server, mut client) = LoopbackTransport::pair();
        let sent = replicator.flush(&mut registry, &mut server, 1).unwrap();
        assert_eq!(sent, 4);
        assert_eq!(replicator.stats().packets_sent, 4);
        assert_eq!(replicator.stats().bytes_sent, server.stats().bytes_sent);
        let mut received = 0;
        while client.recv().unwrap().is_some() {
            received += 1;
        }
        assert_eq!(received, 4);
    }
}
