//! # Core Error Types
//!
//! All errors that can occur in the component model and the registry.
//!
//! ## Taxonomy
//!
//! | Class | Examples | Handling |
//! |-------|----------|----------|
//! | Configuration | missing codec, duplicate index | fatal, startup only |
//! | Decode | truncated payload, unknown index | drop one entity update |
//! | Lookup | unknown entity, kind, template | not-found, no mutation |
//! | Invariant | duplicate component on an entity | fatal, data-model bug |

use strata_shared::{EntityId, KindId};
use thiserror::Error;

use crate::codec::ValueKind;

/// A value did not have the kind its property declares.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct TypeMismatch {
    /// Kind the property declares.
    pub expected: ValueKind,
    /// Kind that was supplied.
    pub found: ValueKind,
}

/// Errors produced by property codecs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the value was complete.
    #[error("truncated payload: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the codec needed.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// A length or count prefix cannot fit in the remaining input.
    #[error("malformed length prefix: {length} does not fit in {remaining} remaining bytes")]
    MalformedLength {
        /// Declared length or element count.
        length: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// Text payload is not UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// Boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// Value handed to a codec of another kind.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
}

/// Startup configuration errors. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No codec is registered for a declared value kind.
    #[error("no codec registered for value kind {0}")]
    MissingCodec(ValueKind),

    /// No interpolation strategy is registered for a declared value kind.
    #[error("no interpolation strategy registered for value kind {0}")]
    MissingStrategy(ValueKind),

    /// A property names a strategy that was never registered.
    #[error("unknown interpolation strategy '{0}'")]
    UnknownStrategy(String),

    /// Two properties of one kind share an index.
    #[error("{component}: property index {index} declared twice")]
    DuplicatePropertyIndex {
        /// Component kind name.
        component: &'static str,
        /// Colliding index.
        index: u8,
    },

    /// Two properties of one kind share a name.
    #[error("{component}: property '{property}' declared twice")]
    DuplicatePropertyName {
        /// Component kind name.
        component: &'static str,
        /// Colliding name.
        property: &'static str,
    },

    /// Property index does not fit in the 16-bit header.
    #[error("{component}.{property}: index {index} is outside 0..=15")]
    PropertyIndexOutOfRange {
        /// Component kind name.
        component: &'static str,
        /// Property name.
        property: &'static str,
        /// Offending index.
        index: u8,
    },

    /// The component's accessor disagrees with its declared property kind.
    #[error("{component}.{property}: accessor does not produce a {expected} value")]
    PropertyBinding {
        /// Component kind name.
        component: &'static str,
        /// Property name.
        property: &'static str,
        /// Declared kind.
        expected: ValueKind,
    },

    /// A component kind name was registered twice.
    #[error("component kind '{0}' registered twice")]
    DuplicateComponentKind(&'static str),

    /// More kinds than fit in a 16-bit kind id.
    #[error("too many component kinds registered")]
    TooManyComponentKinds,

    /// A system requires a kind that was never registered.
    #[error("system '{system}' requires unregistered component kind '{component}'")]
    UnknownRequiredComponent {
        /// System name.
        system: String,
        /// Missing kind name.
        component: String,
    },
}

/// Errors decoding one component payload. Recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The inclusion header itself could not be read.
    #[error("{component}: {source}")]
    Header {
        /// Component kind name.
        component: &'static str,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The header references an index with no declared property.
    #[error("{component}: header references unknown property index {index}")]
    UnknownPropertyIndex {
        /// Component kind name.
        component: &'static str,
        /// Unknown index.
        index: u8,
    },

    /// A property value could not be decoded.
    #[error("{component}.{property}: {source}")]
    Property {
        /// Component kind name.
        component: &'static str,
        /// Property name.
        property: &'static str,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },
}

/// Errors surfaced by the registry and the component model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// No entity with this id.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    /// An explicit id is already taken.
    #[error("entity {0} already exists")]
    EntityExists(EntityId),

    /// No kind registered under this name.
    #[error("unknown component kind '{0}'")]
    UnknownComponentKind(String),

    /// No kind registered under this wire id.
    #[error("unknown component kind id {0}")]
    UnknownKindId(KindId),

    /// The entity does not hold this component.
    #[error("entity {entity} has no '{component}' component")]
    ComponentNotFound {
        /// Entity that was searched.
        entity: EntityId,
        /// Requested kind name.
        component: String,
    },

    /// The kind declares no property with this name.
    #[error("{component} declares no serialized property '{property}'")]
    UnknownProperty {
        /// Component kind name.
        component: &'static str,
        /// Requested property name.
        property: String,
    },

    /// No template registered under this name.
    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    /// A template extends itself, directly or transitively.
    #[error("template '{0}' extends itself")]
    TemplateCycle(String),

    /// A template value does not fit its property.
    #[error("template '{template}': {component}.{property} expects a {expected} value")]
    InvalidTemplateValue {
        /// Template name.
        template: String,
        /// Component kind name.
        component: &'static str,
        /// Property name.
        property: String,
        /// Declared kind.
        expected: ValueKind,
    },

    /// A second component of one kind was attached to an entity.
    #[error("entity {entity} already holds a '{component}' component")]
    DuplicateComponent {
        /// Entity.
        entity: EntityId,
        /// Kind name.
        component: &'static str,
    },

    /// No system with this id.
    #[error("unknown system id {0}")]
    UnknownSystem(usize),

    /// A payload for one entity failed to decode.
    #[error("update for entity {entity} dropped: {source}")]
    Decode {
        /// Entity whose update was dropped.
        entity: EntityId,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// A property value failed to encode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A value did not match its property's kind.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    /// Startup configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EcsError {
    /// Returns true for configuration errors and invariant violations.
    ///
    /// Everything else is scoped to a single call and safe to log and skip.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::DuplicateComponent { .. })
    }
}

/// Result type for registry operations.
pub type EcsResult<T> = Result<T, EcsError>;
