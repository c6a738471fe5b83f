//! # Packet Definitions
//!
//! Every packet the authority sends to its peers.

use strata_shared::{EntityId, EntityUpdate};

/// Leading byte of every packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// An entity now exists on the authority.
    EntityAdded = 0,
    /// An entity was destroyed on the authority.
    EntityDestroyed = 1,
    /// Partial component state for one or more entities.
    EntityUpdates = 2,
}

impl PacketType {
    /// Parses a type byte.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::EntityAdded),
            1 => Some(Self::EntityDestroyed),
            2 => Some(Self::EntityUpdates),
            _ => None,
        }
    }
}

/// A decoded packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Spawn the entity with this authority-assigned id.
    EntityAdded {
        /// Authority tick.
        tick: u32,
        /// Entity id.
        entity: EntityId,
    },
    /// Destroy the entity (deferred on the receiving side).
    EntityDestroyed {
        /// Authority tick.
        tick: u32,
        /// Entity id.
        entity: EntityId,
    },
    /// Apply these updates.
    EntityUpdates {
        /// Authority tick.
        tick: u32,
        /// Updates in application order.
        updates: Vec<EntityUpdate>,
    },
}

impl Packet {
    /// Fixed bytes before the body: type byte plus tick.
    pub const PREAMBLE_SIZE: usize = 1 + 4;

    /// Fixed bytes before the first update of an updates packet.
    pub const UPDATES_OVERHEAD: usize = Self::PREAMBLE_SIZE + 2;

    /// Type byte of this packet.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        match self {
            Self::EntityAdded { .. } => PacketType::EntityAdded,
            Self::EntityDestroyed { .. } => PacketType::EntityDestroyed,
            Self::EntityUpdates { .. } => PacketType::EntityUpdates,
        }
    }

    /// Authority tick the packet was produced on.
    #[must_use]
    pub const fn tick(&self) -> u32 {
        match *self {
            Self::EntityAdded { tick, .. }
            | Self::EntityDestroyed { tick, .. }
            | Self::EntityUpdates { tick, .. } => tick,
        }
    }

    /// Exact encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::EntityAdded { .. } | Self::EntityDestroyed { .. } => Self::PREAMBLE_SIZE + 4,
            Self::EntityUpdates { updates, .. } => {
                Self::UPDATES_OVERHEAD + updates.iter().map(framed_update_len).sum::<usize>()
            }
        }
    }
}

/// Encoded size of one update inside an updates packet.
#[must_use]
pub fn framed_update_len(update: &EntityUpdate) -> usize {
    // entity id + component count, then kind id + length prefix per payload
    4 + 2
        + update
            .components
            .iter()
            .map(|c| 2 + 4 + c.bytes.len())
            .sum::<usize>()
}
