//! Notification types emitted by the registry.
//!
//! The transport layer observes these to decide what to broadcast.
//! The registry never sends anything itself.

use serde::{Deserialize, Serialize};

use crate::protocol::EntityId;

/// Per-kind networking policy declared by every component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPolicy {
    /// Every property mutation emits a change notification.
    pub notify_on_mutation: bool,
    /// Attaching the component emits one notification per declared property.
    pub notify_on_create: bool,
    /// Minimum number of ticks between two outbound sends of one component.
    pub min_update_interval: u64,
}

impl NetworkPolicy {
    /// Local-only component: never triggers outbound traffic.
    pub const LOCAL: Self = Self {
        notify_on_mutation: false,
        notify_on_create: false,
        min_update_interval: 0,
    };

    /// Fully replicated component, sendable every tick.
    pub const REPLICATED: Self = Self {
        notify_on_mutation: true,
        notify_on_create: true,
        min_update_interval: 0,
    };

    /// Returns a copy with a different minimum send interval.
    #[must_use]
    pub const fn with_interval(mut self, ticks: u64) -> Self {
        self.min_update_interval = ticks;
        self
    }

    /// Returns true if this policy ever produces outbound notifications.
    #[must_use]
    pub const fn is_replicated(self) -> bool {
        self.notify_on_mutation || self.notify_on_create
    }
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self::LOCAL
    }
}

/// Notifications emitted by the registry for the transport layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// An entity was created.
    EntityAdded {
        /// The new entity.
        entity: EntityId,
    },

    /// A deferred destruction was applied.
    EntityDestroyed {
        /// The removed entity.
        entity: EntityId,
    },

    /// A replicated property changed (or was created).
    PropertyChanged {
        /// Owning entity.
        entity: EntityId,
        /// Component kind name.
        component: &'static str,
        /// Property name.
        property: &'static str,
        /// Networking policy of the component kind.
        policy: NetworkPolicy,
    },
}

impl Notification {
    /// Entity this notification is about.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::EntityAdded { entity }
            | Self::EntityDestroyed { entity }
            | Self::PropertyChanged { entity, .. } => *entity,
        }
    }
}
