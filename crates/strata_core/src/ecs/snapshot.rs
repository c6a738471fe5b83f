//! Immutable deep copies of the entity set.

use std::hash::Hasher;

use strata_shared::EntityId;

use super::entity::Entity;
use super::instance::stable_hasher;

/// Full entity state at one tick, for rollback and bulk transfer.
#[derive(Clone, Debug)]
pub struct Snapshot {
    tick: u64,
    next_id: EntityId,
    entities: Vec<Entity>,
}

impl Snapshot {
    pub(crate) fn new(tick: u64, next_id: EntityId, entities: Vec<Entity>) -> Self {
        Self {
            tick,
            next_id,
            entities,
        }
    }

    /// Tick the snapshot was taken at.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Id allocator position at capture time.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Captured entities in ascending id order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Captured entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, Entity::id)
            .ok()
            .map(|i| &self.entities[i])
    }

    /// Number of captured entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Hash over every entity, in id order.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        hash_entities(self.entities.iter())
    }
}

pub(crate) fn hash_entities<'a>(entities: impl Iterator<Item = &'a Entity>) -> u64 {
    let mut hasher = stable_hasher();
    for entity in entities {
        hasher.write_u32(entity.id().get());
        hasher.write_u64(entity.content_hash());
    }
    hasher.finish()
}
