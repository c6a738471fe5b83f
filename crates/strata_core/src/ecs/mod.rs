//! # Entity-Component Model
//!
//! ```text
//! ComponentTypes ──(frozen, Arc)──> Registry
//!   └─ ComponentSchema per kind        ├─ Entity ─ ComponentInstance ─ Box<dyn Component>
//!        └─ PropertyDescriptor         ├─ System slots + match caches
//!             codec / strategy / mode  └─ NotificationBus
//! ```

mod component;
mod entity;
mod instance;
mod kinds;
mod notify;
mod registry;
mod schema;
mod snapshot;
mod system;
mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use component::{CloneComponent, Component, ComponentType};
pub use entity::Entity;
pub use instance::{ComponentInstance, PropertyChange};
pub use kinds::ComponentTypes;
pub use notify::NotificationReceiver;
pub use registry::{ApplyMode, ApplyReport, Registry};
pub use schema::{ComponentSchema, PropertyDescriptor, SchemaBuilder};
pub use snapshot::Snapshot;
pub use system::{Phase, Runner, RunsOn, System, SystemId, TickTime};
pub use template::{
    Template, TemplateComponent, TemplateLibrary, TemplateResolver, TemplateValue,
};
