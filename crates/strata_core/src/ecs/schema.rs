//! # Component Schemas
//!
//! The statically registered property table of one component kind,
//! built once at startup by [`ComponentTypes::register`](super::ComponentTypes::register).
//!
//! ```text
//! Transform  kind #0  policy REPLICATED
//!   idx  name  kind  codec      strategy  mode
//!   0    x     f32   F32Codec   linear    Linear
//!   1    y     f32   F32Codec   linear    Linear
//! ```

use std::sync::Arc;

use strata_shared::{KindId, NetworkPolicy, MAX_PROPERTIES, MAX_PROPERTY_INDEX};

use super::component::{Component, ComponentType};
use crate::codec::{
    ByteReader, CodecRegistry, PropertyCodec, PropertyMask, PropertyValue, ValueKind,
};
use crate::error::{ConfigError, DecodeError};
use crate::interpolation::{InterpolationMode, InterpolationStrategy, StrategyRegistry};

/// One declared property.
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: &'static str,
    /// Header bit, `0..=15`.
    pub index: u8,
    /// Declared value kind.
    pub kind: ValueKind,
    /// Resolved codec.
    pub codec: Arc<dyn PropertyCodec>,
    /// Resolved interpolation strategy.
    pub strategy: InterpolationStrategy,
    /// Interpolation mode.
    pub mode: InterpolationMode,
    /// False for local-only properties that never go on the wire.
    pub serialized: bool,
}

/// Frozen property table of one component kind.
#[derive(Debug)]
pub struct ComponentSchema {
    name: &'static str,
    kind_id: KindId,
    policy: NetworkPolicy,
    properties: Vec<PropertyDescriptor>,
    by_index: [Option<usize>; MAX_PROPERTIES],
    factory: fn() -> Box<dyn Component>,
}

fn instantiate<T: ComponentType>() -> Box<dyn Component> {
    Box::new(T::default())
}

impl ComponentSchema {
    /// Kind name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Wire id of the kind.
    #[must_use]
    pub const fn kind_id(&self) -> KindId {
        self.kind_id
    }

    /// Networking policy of the kind.
    #[must_use]
    pub const fn policy(&self) -> NetworkPolicy {
        self.policy
    }

    /// Serialized properties in ascending index order.
    pub fn declared_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.serialized)
    }

    /// Every property, local ones included, in ascending index order.
    #[must_use]
    pub fn all_properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Property by name, local ones included.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Serialized property at header bit `index`.
    #[must_use]
    pub fn property_at(&self, index: u8) -> Option<&PropertyDescriptor> {
        let slot = (*self.by_index.get(usize::from(index))?)?;
        self.properties.get(slot).filter(|p| p.serialized)
    }

    /// Mask with every serialized property set.
    #[must_use]
    pub fn full_mask(&self) -> PropertyMask {
        self.declared_properties().map(|p| p.index).collect()
    }

    /// Creates a default-valued instance of the kind.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }

    /// Reads a header and the values it announces, without touching any
    /// instance. Returns the values in ascending index order and the total
    /// bytes consumed.
    ///
    /// # Errors
    ///
    /// Fails on a truncated header, an index with no serialized property,
    /// or a property payload its codec rejects.
    pub fn decode_values(
        &self,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(Vec<(u8, PropertyValue)>, usize), DecodeError> {
        let mut reader = ByteReader::at(bytes, offset);
        let start = reader.position();
        let mask = PropertyMask::read(&mut reader).map_err(|source| DecodeError::Header {
            component: self.name,
            source,
        })?;

        let mut values = Vec::with_capacity(mask.len() as usize);
        for index in mask.iter() {
            let descriptor = self
                .property_at(index)
                .ok_or(DecodeError::UnknownPropertyIndex {
                    component: self.name,
                    index,
                })?;
            let value =
                descriptor
                    .codec
                    .decode(&mut reader)
                    .map_err(|source| DecodeError::Property {
                        component: self.name,
                        property: descriptor.name,
                        source,
                    })?;
            values.push((index, value));
        }
        Ok((values, reader.position() - start))
    }
}

/// Collects property declarations for one kind.
///
/// Declarations never fail eagerly; the first problem is recorded and
/// reported when the schema is built.
#[derive(Debug)]
pub struct SchemaBuilder<'a> {
    component: &'static str,
    policy: NetworkPolicy,
    codecs: &'a mut CodecRegistry,
    strategies: &'a StrategyRegistry,
    properties: Vec<PropertyDescriptor>,
    error: Option<ConfigError>,
}

impl<'a> SchemaBuilder<'a> {
    pub(crate) fn new(
        component: &'static str,
        policy: NetworkPolicy,
        codecs: &'a mut CodecRegistry,
        strategies: &'a StrategyRegistry,
    ) -> Self {
        Self {
            component,
            policy,
            codecs,
            strategies,
            properties: Vec::new(),
            error: None,
        }
    }

    /// Declares a linearly interpolated property with the kind's default strategy.
    pub fn property(&mut self, name: &'static str, index: u8, kind: ValueKind) -> &mut Self {
        self.declare(name, index, kind, InterpolationMode::Linear, None, true)
    }

    /// Declares a property with an explicit interpolation mode.
    pub fn property_with_mode(
        &mut self,
        name: &'static str,
        index: u8,
        kind: ValueKind,
        mode: InterpolationMode,
    ) -> &mut Self {
        self.declare(name, index, kind, mode, None, true)
    }

    /// Declares a property bound to a named strategy.
    pub fn property_with_strategy(
        &mut self,
        name: &'static str,
        index: u8,
        kind: ValueKind,
        mode: InterpolationMode,
        strategy: &str,
    ) -> &mut Self {
        self.declare(name, index, kind, mode, Some(strategy), true)
    }

    /// Declares a local-only property: settable by name, never serialized,
    /// interpolated or hashed.
    pub fn local(&mut self, name: &'static str, index: u8, kind: ValueKind) -> &mut Self {
        self.declare(name, index, kind, InterpolationMode::FromInstant, None, false)
    }

    /// Overrides the kind's networking policy.
    pub fn policy(&mut self, policy: NetworkPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    fn fail(&mut self, error: ConfigError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn declare(
        &mut self,
        name: &'static str,
        index: u8,
        kind: ValueKind,
        mode: InterpolationMode,
        strategy: Option<&str>,
        serialized: bool,
    ) -> &mut Self {
        let component = self.component;
        if index > MAX_PROPERTY_INDEX {
            self.fail(ConfigError::PropertyIndexOutOfRange {
                component,
                property: name,
                index,
            });
            return self;
        }
        if self.properties.iter().any(|p| p.index == index) {
            self.fail(ConfigError::DuplicatePropertyIndex { component, index });
            return self;
        }
        if self.properties.iter().any(|p| p.name == name) {
            self.fail(ConfigError::DuplicatePropertyName {
                component,
                property: name,
            });
            return self;
        }

        let codec = match self.codecs.resolve(&kind) {
            Ok(codec) => codec,
            Err(err) => {
                self.fail(err);
                return self;
            }
        };
        let strategy = match strategy {
            Some(named) => self.strategies.resolve_named(named),
            None => self.strategies.resolve(&kind),
        };
        let strategy = match strategy {
            Ok(strategy) => strategy,
            Err(err) => {
                self.fail(err);
                return self;
            }
        };

        self.properties.push(PropertyDescriptor {
            name,
            index,
            kind,
            codec,
            strategy,
            mode,
            serialized,
        });
        self
    }

    /// Validates the declarations against `T` and freezes them.
    pub(crate) fn build<T: ComponentType>(
        mut self,
        kind_id: KindId,
    ) -> Result<ComponentSchema, ConfigError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        // Every accessor must produce a value of the declared kind.
        let blank = T::default();
        for p in &self.properties {
            let bound = blank.get(p.index).map_or(false, |v| v.is_kind(&p.kind));
            if !bound {
                return Err(ConfigError::PropertyBinding {
                    component: self.component,
                    property: p.name,
                    expected: p.kind.clone(),
                });
            }
        }

        self.properties.sort_by_key(|p| p.index);
        let mut by_index = [None; MAX_PROPERTIES];
        for (slot, p) in self.properties.iter().enumerate() {
            by_index[usize::from(p.index)] = Some(slot);
        }

        Ok(ComponentSchema {
            name: self.component,
            kind_id,
            policy: self.policy,
            properties: self.properties,
            by_index,
            factory: instantiate::<T>,
        })
    }
}
