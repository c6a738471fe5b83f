//! Component kind table: name and wire id to schema.

use std::collections::HashMap;
use std::sync::Arc;

use strata_shared::KindId;
use tracing::debug;

use super::component::ComponentType;
use super::schema::{ComponentSchema, SchemaBuilder};
use crate::codec::CodecRegistry;
use crate::error::ConfigError;
use crate::interpolation::StrategyRegistry;

/// Every component kind known to a registry.
///
/// Populated once at startup, then shared read-only. Both peers must
/// register kinds in the same order so wire ids agree.
#[derive(Debug, Default)]
pub struct ComponentTypes {
    codecs: CodecRegistry,
    strategies: StrategyRegistry,
    schemas: Vec<Arc<ComponentSchema>>,
    by_name: HashMap<&'static str, KindId>,
}

impl ComponentTypes {
    /// Creates a table over explicit codec and strategy registries.
    #[must_use]
    pub fn new(codecs: CodecRegistry, strategies: StrategyRegistry) -> Self {
        Self {
            codecs,
            strategies,
            schemas: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Creates a table over the built-in codecs and strategies.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new(CodecRegistry::with_builtins(), StrategyRegistry::with_builtins())
    }

    /// Codec registry, for registering custom codecs before any kind.
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Strategy registry, for registering custom strategies before any kind.
    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategies
    }

    /// Registers `T`, returning its wire id.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]: duplicate kinds, unresolvable codecs or
    /// strategies, index collisions or out-of-range indices.
    pub fn register<T: ComponentType>(&mut self) -> Result<KindId, ConfigError> {
        if self.by_name.contains_key(T::NAME) {
            return Err(ConfigError::DuplicateComponentKind(T::NAME));
        }
        let kind_id =
            KindId::try_from(self.schemas.len()).map_err(|_| ConfigError::TooManyComponentKinds)?;

        let mut builder = SchemaBuilder::new(T::NAME, T::POLICY, &mut self.codecs, &self.strategies);
        T::describe(&mut builder);
        let schema = builder.build::<T>(kind_id)?;

        debug!(
            component = T::NAME,
            kind_id,
            properties = schema.all_properties().len(),
            "Registered component kind"
        );
        self.by_name.insert(T::NAME, kind_id);
        self.schemas.push(Arc::new(schema));
        Ok(kind_id)
    }

    /// Schema for a wire id.
    #[must_use]
    pub fn schema(&self, kind_id: KindId) -> Option<&Arc<ComponentSchema>> {
        self.schemas.get(usize::from(kind_id))
    }

    /// Schema for a kind name.
    #[must_use]
    pub fn schema_by_name(&self, name: &str) -> Option<&Arc<ComponentSchema>> {
        self.by_name.get(name).and_then(|&id| self.schema(id))
    }

    /// Wire id of `T`, if registered.
    #[must_use]
    pub fn kind_id_of<T: ComponentType>(&self) -> Option<KindId> {
        self.by_name.get(T::NAME).copied()
    }

    /// All schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentSchema>> {
        self.schemas.iter()
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{PropertyValue, ValueKind};
    use crate::ecs::testing::{Health, Nameplate, Transform};
    use crate::ecs::{Component, SchemaBuilder};
    use crate::error::TypeMismatch;
    use crate::interpolation::{InterpolationMode, SNAP};

    macro_rules! broken_kind {
        ($name:ident, |$schema:ident| $describe:expr) => {
            #[derive(Clone, Debug, Default)]
            struct $name(f32);

            impl Component for $name {
                fn get(&self, index: u8) -> Option<PropertyValue> {
                    (index == 0).then(|| self.0.into())
                }

                fn set(&mut self, _: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
                    self.0 = value.try_into()?;
                    Ok(())
                }
            }

            impl ComponentType for $name {
                const NAME: &'static str = stringify!($name);

                fn describe($schema: &mut SchemaBuilder<'_>) {
                    $describe;
                }
            }
        };
    }

    broken_kind!(OutOfRange, |s| s.property("v", 16, ValueKind::F32));
    broken_kind!(Collision, |s| s
        .property("v", 0, ValueKind::F32)
        .property("w", 0, ValueKind::F32));
    broken_kind!(WrongKind, |s| s.property("v", 0, ValueKind::I32));
    broken_kind!(BadStrategy, |s| s.property_with_strategy(
        "v",
        0,
        ValueKind::F32,
        InterpolationMode::Linear,
        "cubic"
    ));

    #[test]
    fn test_ids_follow_registration_order() {
        let mut types = ComponentTypes::with_builtins();
        assert_eq!(types.register::<Transform>().unwrap(), 0);
        assert_eq!(types.register::<Health>().unwrap(), 1);
        assert_eq!(types.kind_id_of::<Health>(), Some(1));
        assert_eq!(types.schema(0).unwrap().name(), "Transform");
        assert_eq!(
            types.register::<Health>(),
            Err(ConfigError::DuplicateComponentKind("Health"))
        );
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_schema_layout() {
        let mut types = ComponentTypes::with_builtins();
        types.register::<Nameplate>().unwrap();
        let schema = types.schema_by_name("Nameplate").unwrap();

        let indices: Vec<u8> = schema.all_properties().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 3, 7, 15]);
        assert_eq!(schema.declared_properties().count(), 3);
        assert!(schema.property_at(15).is_none());
        assert!(schema.property("hover").is_some());
        assert_eq!(schema.full_mask().bits(), 0x0089);
        assert_eq!(schema.property("label").unwrap().strategy.name(), SNAP);
        assert_eq!(schema.policy().min_update_interval, 3);
    }

    #[test]
    fn test_invalid_declarations_rejected() {
        let mut types = ComponentTypes::with_builtins();
        assert!(matches!(
            types.register::<OutOfRange>(),
            Err(ConfigError::PropertyIndexOutOfRange { index: 16, .. })
        ));
        assert!(matches!(
            types.register::<Collision>(),
            Err(ConfigError::DuplicatePropertyIndex { index: 0, .. })
        ));
        assert!(matches!(
            types.register::<WrongKind>(),
            Err(ConfigError::PropertyBinding { property: "v", .. })
        ));
        assert_eq!(
            types.register::<BadStrategy>(),
            Err(ConfigError::UnknownStrategy("cubic".into()))
        );
        assert!(types.is_empty());
    }

    #[test]
    fn test_missing_codec_rejected() {
        let mut types = ComponentTypes::new(CodecRegistry::new(), StrategyRegistry::with_builtins());
        assert_eq!(
            types.register::<Transform>(),
            Err(ConfigError::MissingCodec(ValueKind::F32))
        );
    }
}
