//! # Entity
//!
//! An id plus its components, kept in insertion order. At most one
//! component per kind.

use std::hash::Hasher;

use strata_shared::{EntityId, KindId};

use super::component::ComponentType;
use super::instance::{stable_hasher, ComponentInstance};
use crate::error::{EcsError, EcsResult};

/// An entity and its components.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    components: Vec<ComponentInstance>,
}

impl Entity {
    /// Creates an entity without components.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            components: Vec::new(),
        }
    }

    /// Entity id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Components in insertion order.
    #[must_use]
    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    /// Mutable components in insertion order.
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut ComponentInstance> {
        self.components.iter_mut()
    }

    /// Component by kind name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// Mutable component by kind name.
    pub fn component_mut(&mut self, name: &str) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.name() == name)
    }

    /// Component by wire id.
    #[must_use]
    pub fn component_by_kind(&self, kind: KindId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.kind_id() == kind)
    }

    /// Mutable component by wire id.
    pub fn component_by_kind_mut(&mut self, kind: KindId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.kind_id() == kind)
    }

    /// Typed component data.
    #[must_use]
    pub fn get<T: ComponentType>(&self) -> Option<&T> {
        self.component(T::NAME)?.data::<T>()
    }

    /// Mutable typed component data.
    pub fn get_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.component_mut(T::NAME)?.data_mut::<T>()
    }

    /// Returns true if a component of this kind is attached.
    #[must_use]
    pub fn has(&self, kind: KindId) -> bool {
        self.component_by_kind(kind).is_some()
    }

    /// Returns true if every listed kind is attached.
    #[must_use]
    pub fn has_all(&self, kinds: &[KindId]) -> bool {
        kinds.iter().all(|&k| self.has(k))
    }

    /// Number of attached components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if no component is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn insert(&mut self, component: ComponentInstance) -> EcsResult<&mut ComponentInstance> {
        if self.has(component.kind_id()) {
            return Err(EcsError::DuplicateComponent {
                entity: self.id,
                component: component.name(),
            });
        }
        self.components.push(component);
        let last = self.components.len() - 1;
        Ok(&mut self.components[last])
    }

    pub(crate) fn remove(&mut self, kind: KindId) -> Option<ComponentInstance> {
        let position = self.components.iter().position(|c| c.kind_id() == kind)?;
        Some(self.components.remove(position))
    }

    /// Order-stable hash of every replicated component's kind and content.
    /// Local-only kinds never reach a peer and are skipped.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = stable_hasher();
        for c in self.components.iter().filter(|c| c.schema().policy().is_replicated()) {
            hasher.write(c.name().as_bytes());
            hasher.write_u64(c.content_hash());
        }
        hasher.finish()
    }
}
