//! # Templates
//!
//! Named component bundles, optionally extending another template.
//!
//! ```toml
//! [templates.creature]
//! [[templates.creature.components]]
//! kind = "Health"
//! hp = 50
//!
//! [templates.dragon]
//! extends = "creature"
//! [[templates.dragon.components]]
//! kind = "Health"
//! hp = 900
//! ```
//!
//! Materializing `dragon` yields one `Health` with `hp = 900`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strata_shared::{Color, Rect, Vec2};

use crate::codec::{PropertyValue, ValueKind};

/// Looks templates up by name.
pub trait TemplateResolver: Send + Sync {
    /// Template registered under `name`.
    fn resolve(&self, name: &str) -> Option<&Template>;
}

/// A raw property value as written in a template file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    Text(String),
    /// Array literal (vectors, rects, colors and arrays)
    List(Vec<TemplateValue>),
}

impl TemplateValue {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(i) => Some(i as f64),
            Self::Float(f) => Some(f),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn lanes<const N: usize>(&self) -> Option<[f32; N]> {
        let Self::List(items) = self else {
            return None;
        };
        if items.len() != N {
            return None;
        }
        let mut lanes = [0f32; N];
        for (lane, item) in lanes.iter_mut().zip(items) {
            *lane = item.as_f64()? as f32;
        }
        Some(lanes)
    }

    /// Converts to a property value of `kind`, if representable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_property(&self, kind: &ValueKind) -> Option<PropertyValue> {
        let int = |v: &Self| match *v {
            Self::Int(i) => Some(i),
            _ => None,
        };
        Some(match kind {
            ValueKind::I8 => PropertyValue::I8(int(self)?.try_into().ok()?),
            ValueKind::I16 => PropertyValue::I16(int(self)?.try_into().ok()?),
            ValueKind::I32 => PropertyValue::I32(int(self)?.try_into().ok()?),
            ValueKind::I64 => PropertyValue::I64(int(self)?),
            ValueKind::U16 => PropertyValue::U16(int(self)?.try_into().ok()?),
            ValueKind::U32 => PropertyValue::U32(int(self)?.try_into().ok()?),
            ValueKind::U64 => PropertyValue::U64(int(self)?.try_into().ok()?),
            ValueKind::Byte => PropertyValue::Byte(int(self)?.try_into().ok()?),
            ValueKind::F32 => PropertyValue::F32(self.as_f64()? as f32),
            ValueKind::F64 => PropertyValue::F64(self.as_f64()?),
            ValueKind::Bool => match self {
                Self::Bool(b) => PropertyValue::Bool(*b),
                _ => return None,
            },
            ValueKind::Text => match self {
                Self::Text(t) => PropertyValue::Text(t.clone()),
                _ => return None,
            },
            ValueKind::Vec2 => PropertyValue::Vec2(Vec2::from_array(self.lanes()?)),
            ValueKind::Rect => PropertyValue::Rect(Rect::from_array(self.lanes()?)),
            ValueKind::Color => PropertyValue::Color(Color::from_array(self.lanes()?)),
            ValueKind::Array(element) => {
                let Self::List(items) = self else {
                    return None;
                };
                PropertyValue::Array {
                    element: (**element).clone(),
                    items: items
                        .iter()
                        .map(|item| item.to_property(element))
                        .collect::<Option<Vec<_>>>()?,
                }
            }
        })
    }
}

macro_rules! template_value_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for TemplateValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

template_value_from!(bool => Bool, i32 => Int, i64 => Int, f32 => Float, f64 => Float, &str => Text, String => Text);

/// One component entry of a template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    /// Component kind name.
    pub kind: String,
    /// Property overrides by name. The key `kind` is reserved.
    #[serde(flatten)]
    pub properties: BTreeMap<String, TemplateValue>,
}

impl TemplateComponent {
    /// Entry with no overrides.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property override (builder style).
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }
}

/// A named component bundle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Base template materialized first.
    #[serde(default)]
    pub extends: Option<String>,
    /// Components merged onto the base, in order.
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
}

impl Template {
    /// Empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base template (builder style).
    #[must_use]
    pub fn extending(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(base.into());
        self
    }

    /// Adds a component entry (builder style).
    #[must_use]
    pub fn with_component(mut self, component: TemplateComponent) -> Self {
        self.components.push(component);
        self
    }
}

/// In-memory template resolver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLibrary {
    #[serde(default)]
    templates: HashMap<String, Template>,
}

impl TemplateLibrary {
    /// Empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a library from TOML.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed input.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateResolver for TemplateLibrary {
    fn resolve(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
[templates.creature]
[[templates.creature.components]]
kind = "Health"
hp = 50

[[templates.creature.components]]
kind = "Transform"
x = 1
y = 2.5

[templates.dragon]
extends = "creature"
[[templates.dragon.components]]
kind = "Health"
hp = 900
"#;

    #[test]
    fn test_parse_library() {
        let library = TemplateLibrary::from_toml_str(LIBRARY).unwrap();
        assert_eq!(library.len(), 2);

        let dragon = library.resolve("dragon").unwrap();
        assert_eq!(dragon.extends.as_deref(), Some("creature"));
        assert_eq!(dragon.components[0].kind, "Health");
        assert_eq!(dragon.components[0].properties["hp"], TemplateValue::Int(900));

        let creature = library.resolve("creature").unwrap();
        assert_eq!(creature.components[1].properties["y"], TemplateValue::Float(2.5));
        assert!(library.resolve("wyvern").is_none());
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(
            TemplateValue::Int(7).to_property(&ValueKind::F32),
            Some(PropertyValue::F32(7.0))
        );
        assert_eq!(TemplateValue::Int(300).to_property(&ValueKind::I8), None);
        assert_eq!(TemplateValue::Float(1.5).to_property(&ValueKind::I32), None);
        assert_eq!(
            TemplateValue::List(vec![TemplateValue::Int(1), TemplateValue::Float(2.5)])
                .to_property(&ValueKind::Vec2),
            Some(PropertyValue::Vec2(Vec2::new(1.0, 2.5)))
        );
        assert_eq!(
            TemplateValue::List(vec!["a".into()])
                .to_property(&ValueKind::array_of(ValueKind::Text)),
            Some(PropertyValue::array(vec!["a".to_owned()]))
        );
    }
}
