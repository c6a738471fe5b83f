//! Replication records shared between authority and peer.
//!
//! These are the logical, pre-transport units of replication. Both sides
//! must agree on these definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable wire identifier of a component kind.
///
/// Assigned in registration order; both peers register kinds in the same
/// order, so the same kind resolves to the same id on both sides.
pub type KindId = u16;

/// Entity identifier, unique within one registry.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Returns the raw integer value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the id that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// One component's partial payload inside an [`EntityUpdate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentPayload {
    /// Kind of the component this payload belongs to.
    pub kind: KindId,
    /// Header bitmask followed by the included property values.
    pub bytes: Vec<u8>,
}

impl ComponentPayload {
    /// Creates a new payload.
    #[must_use]
    pub fn new(kind: KindId, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }
}

/// The logical unit of replication: one entity plus component payloads.
///
/// Used both for instant application and for interpolated (queued)
/// application on the receiving side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityUpdate {
    /// Target entity.
    pub entity: EntityId,
    /// Component payloads, in the order they should be applied.
    pub components: Vec<ComponentPayload>,
}

impl EntityUpdate {
    /// Creates an empty update for an entity.
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            components: Vec::new(),
        }
    }

    /// Appends a component payload (builder style).
    #[must_use]
    pub fn with_component(mut self, kind: KindId, bytes: Vec<u8>) -> Self {
        self.components.push(ComponentPayload::new(kind, bytes));
        self
    }

    /// Appends a component payload.
    pub fn push(&mut self, kind: KindId, bytes: Vec<u8>) {
        self.components.push(ComponentPayload::new(kind, bytes));
    }

    /// Returns true if the update carries no payloads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Total payload bytes carried by this update.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.components.iter().map(|c| c.bytes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_update_builder() {
        let update = EntityUpdate::new(EntityId(7))
            .with_component(0, vec![1, 0, 0, 0, 0, 0])
            .with_component(3, vec![0, 0]);

        assert_eq!(update.entity, EntityId(7));
        assert_eq!(update.components.len(), 2);
        assert_eq!(update.components[1].kind, 3);
        assert_eq!(update.payload_len(), 8);
        assert!(!update.is_empty());
    }

    #[test]
    fn test_entity_id_display_and_next() {
        assert_eq!(EntityId(41).next(), EntityId(42));
        assert_eq!(EntityId(3).to_string(), "#3");
    }
}
