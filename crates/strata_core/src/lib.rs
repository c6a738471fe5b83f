//! # STRATA Core
//!
//! Replicated entity-component model for an authority/peer game.
//!
//! - Components declare typed, indexed properties once at startup
//! - Any subset of a component's properties encodes to a compact,
//!   self-delimiting payload behind a 16-bit inclusion header
//! - Peers either apply payloads instantly or queue them as timestamped
//!   samples and render slightly in the past
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{ComponentTypes, Registry, RegistryConfig};
//!
//! let mut types = ComponentTypes::with_builtins();
//! types.register::<Transform>()?;
//! let mut registry = Registry::new(Arc::new(types), RegistryConfig::authority());
//! let e = registry.create_entity(None)?;
//! registry.add_component(e, Transform::default())?;
//! registry.run_tick(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod config;
pub mod ecs;
pub mod error;
pub mod interpolation;
pub mod sync;
pub mod time;

pub use codec::{CodecRegistry, PropertyCodec, PropertyMask, PropertyValue, ValueKind};
pub use config::RegistryConfig;
pub use ecs::{
    ApplyMode, ApplyReport, Component, ComponentInstance, ComponentType, ComponentTypes, Entity,
    Registry, SchemaBuilder, Snapshot, System, SystemId, TickTime,
};
pub use error::{CodecError, ConfigError, DecodeError, EcsError, EcsResult, TypeMismatch};
pub use interpolation::{InterpolationMode, InterpolationQueue, StrategyRegistry};
pub use sync::SharedRegistry;
pub use time::{Clock, ManualClock, SystemClock};
