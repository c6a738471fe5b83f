//! # Component Contract
//!
//! Components are plain data bags. They expose their replicated fields
//! through index-addressed accessors; everything else (wire format,
//! interpolation, throttling) is driven by the kind's
//! [`ComponentSchema`](super::ComponentSchema).
//!
//! # Example
//!
//! ```rust
//! use strata_core::codec::{PropertyValue, ValueKind};
//! use strata_core::ecs::{Component, ComponentType, SchemaBuilder};
//! use strata_core::error::TypeMismatch;
//! use strata_shared::NetworkPolicy;
//!
//! #[derive(Clone, Debug, Default)]
//! struct Health {
//!     hp: i32,
//! }
//!
//! impl Component for Health {
//!     fn get(&self, index: u8) -> Option<PropertyValue> {
//!         match index {
//!             0 => Some(self.hp.into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
//!         if index == 0 {
//!             self.hp = value.try_into()?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl ComponentType for Health {
//!     const NAME: &'static str = "Health";
//!     const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;
//!
//!     fn describe(schema: &mut SchemaBuilder<'_>) {
//!         schema.property("hp", 0, ValueKind::I32);
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt::Debug;

use strata_shared::NetworkPolicy;

use super::schema::SchemaBuilder;
use crate::codec::PropertyValue;
use crate::error::TypeMismatch;

/// Object-safe component data.
pub trait Component: CloneComponent + Send + Sync + Debug + 'static {
    /// Reads the property at `index`. `None` if the index is not bound.
    fn get(&self, index: u8) -> Option<PropertyValue>;

    /// Writes the property at `index`. Unbound indices are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] if `value` is not of the field's kind.
    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch>;
}

/// Boxed cloning and downcasting, implemented for every `Clone` component.
pub trait CloneComponent {
    /// Deep copy behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn Component>;
    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component + Clone> CloneComponent for T {
    fn clone_boxed(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// A concrete, registrable component kind.
pub trait ComponentType: Component + Clone + Default {
    /// Stable kind name shared by every peer.
    const NAME: &'static str;

    /// Networking policy of the kind.
    const POLICY: NetworkPolicy = NetworkPolicy::LOCAL;

    /// Declares the kind's properties.
    fn describe(schema: &mut SchemaBuilder<'_>);
}
