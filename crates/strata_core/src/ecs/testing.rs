//! Component kinds shared by the unit tests.

use std::sync::Arc;

use strata_shared::NetworkPolicy;

use super::{Component, ComponentType, ComponentTypes, SchemaBuilder};
use crate::codec::{PropertyValue, ValueKind};
use crate::error::TypeMismatch;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Transform {
    pub x: f32,
    pub y: f32,
}

impl Component for Transform {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        match index {
            0 => Some(self.x.into()),
            1 => Some(self.y.into()),
            _ => None,
        }
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        match index {
            0 => self.x = value.try_into()?,
            1 => self.y = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

impl ComponentType for Transform {
    const NAME: &'static str = "Transform";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema
            .property("x", 0, ValueKind::F32)
            .property("y", 1, ValueKind::F32);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Health {
    pub hp: i32,
}

impl Component for Health {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        (index == 0).then(|| self.hp.into())
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        if index == 0 {
            self.hp = value.try_into()?;
        }
        Ok(())
    }
}

impl ComponentType for Health {
    const NAME: &'static str = "Health";

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema.property("hp", 0, ValueKind::I32);
    }
}

/// Sparse indices, a local-only field and a throttled policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Nameplate {
    pub label: String,
    pub visible: bool,
    pub tags: Vec<String>,
    pub hover: bool,
}

impl Component for Nameplate {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        match index {
            0 => Some(self.label.clone().into()),
            3 => Some(self.visible.into()),
            7 => Some(PropertyValue::array(self.tags.clone())),
            15 => Some(self.hover.into()),
            _ => None,
        }
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        match index {
            0 => self.label = value.try_into()?,
            3 => self.visible = value.try_into()?,
            7 => self.tags = value.try_into()?,
            15 => self.hover = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

impl ComponentType for Nameplate {
    const NAME: &'static str = "Nameplate";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED.with_interval(3);

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema
            .property("label", 0, ValueKind::Text)
            .property("visible", 3, ValueKind::Bool)
            .property("tags", 7, ValueKind::array_of(ValueKind::Text))
            .local("hover", 15, ValueKind::Bool);
    }
}

/// Three contiguous properties, for partial payloads with gaps.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Component for Tint {
    fn get(&self, index: u8) -> Option<PropertyValue> {
        match index {
            0 => Some(self.r.into()),
            1 => Some(self.g.into()),
            2 => Some(self.b.into()),
            _ => None,
        }
    }

    fn set(&mut self, index: u8, value: PropertyValue) -> Result<(), TypeMismatch> {
        match index {
            0 => self.r = value.try_into()?,
            1 => self.g = value.try_into()?,
            2 => self.b = value.try_into()?,
            _ => {}
        }
        Ok(())
    }
}

impl ComponentType for Tint {
    const NAME: &'static str = "Tint";
    const POLICY: NetworkPolicy = NetworkPolicy::REPLICATED;

    fn describe(schema: &mut SchemaBuilder<'_>) {
        schema
            .property("r", 0, ValueKind::F32)
            .property("g", 1, ValueKind::F32)
            .property("b", 2, ValueKind::F32);
    }
}

pub(crate) fn types() -> Arc<ComponentTypes> {
    let mut types = ComponentTypes::with_builtins();
    types.register::<Transform>().unwrap();
    types.register::<Health>().unwrap();
    types.register::<Nameplate>().unwrap();
    types.register::<Tint>().unwrap();
    Arc::new(types)
}
