//! # Property Values
//!
//! `PropertyValue` is the tagged carrier every codec, strategy and sample
//! queue works with. `ValueKind` names the static type a property declares.

use std::fmt;

use strata_shared::{Color, Rect, Vec2};

use crate::error::TypeMismatch;

/// Static type of a property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `bool`
    Bool,
    /// Single opaque byte (`u8`)
    Byte,
    /// UTF-8 text
    Text,
    /// [`Vec2`]
    Vec2,
    /// [`Rect`]
    Rect,
    /// [`Color`]
    Color,
    /// Homogeneous array of another kind
    Array(Box<ValueKind>),
}

impl ValueKind {
    /// Array of `element`.
    #[must_use]
    pub fn array_of(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    /// Default value of this kind (zero, empty, white for colors).
    #[must_use]
    pub fn default_value(&self) -> PropertyValue {
        match self {
            Self::I8 => PropertyValue::I8(0),
            Self::I16 => PropertyValue::I16(0),
            Self::I32 => PropertyValue::I32(0),
            Self::I64 => PropertyValue::I64(0),
            Self::U16 => PropertyValue::U16(0),
            Self::U32 => PropertyValue::U32(0),
            Self::U64 => PropertyValue::U64(0),
            Self::F32 => PropertyValue::F32(0.0),
            Self::F64 => PropertyValue::F64(0.0),
            Self::Bool => PropertyValue::Bool(false),
            Self::Byte => PropertyValue::Byte(0),
            Self::Text => PropertyValue::Text(String::new()),
            Self::Vec2 => PropertyValue::Vec2(Vec2::ZERO),
            Self::Rect => PropertyValue::Rect(Rect::default()),
            Self::Color => PropertyValue::Color(Color::default()),
            Self::Array(element) => PropertyValue::Array {
                element: (**element).clone(),
                items: Vec::new(),
            },
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8 => f.write_str("i8"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Bool => f.write_str("bool"),
            Self::Byte => f.write_str("byte"),
            Self::Text => f.write_str("text"),
            Self::Vec2 => f.write_str("vec2"),
            Self::Rect => f.write_str("rect"),
            Self::Color => f.write_str("color"),
            Self::Array(element) => write!(f, "array<{element}>"),
        }
    }
}

/// A property value of any built-in kind.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `bool`
    Bool(bool),
    /// Single byte
    Byte(u8),
    /// UTF-8 text
    Text(String),
    /// 2D vector
    Vec2(Vec2),
    /// Rectangle
    Rect(Rect),
    /// RGBA color
    Color(Color),
    /// Homogeneous array
    Array {
        /// Element kind (kept so empty arrays still know their type).
        element: ValueKind,
        /// Elements, each of kind `element`.
        items: Vec<PropertyValue>,
    },
}

impl PropertyValue {
    /// Kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Bool(_) => ValueKind::Bool,
            Self::Byte(_) => ValueKind::Byte,
            Self::Text(_) => ValueKind::Text,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Rect(_) => ValueKind::Rect,
            Self::Color(_) => ValueKind::Color,
            Self::Array { element, .. } => ValueKind::array_of(element.clone()),
        }
    }

    /// Returns true if this value is of `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (Self::Array { element, .. }, ValueKind::Array(expected)) => element == &**expected,
            _ => self.kind() == *kind,
        }
    }

    /// Builds an array value from typed elements.
    #[must_use]
    pub fn array<T: ValueType>(items: Vec<T>) -> Self {
        Self::Array {
            element: T::value_kind(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn mismatch(&self, expected: ValueKind) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

/// Rust types that map onto exactly one [`ValueKind`].
///
/// Concrete components use these conversions in their typed accessors.
pub trait ValueType: Into<PropertyValue> + TryFrom<PropertyValue, Error = TypeMismatch> {
    /// The kind this type encodes as.
    fn value_kind() -> ValueKind;
}

macro_rules! impl_value_type {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl TryFrom<PropertyValue> for $ty {
            type Error = TypeMismatch;

            fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
                match value {
                    PropertyValue::$variant(inner) => Ok(inner),
                    other => Err(other.mismatch(ValueKind::$variant)),
                }
            }
        }

        impl ValueType for $ty {
            fn value_kind() -> ValueKind {
                ValueKind::$variant
            }
        }
    };
}

impl_value_type!(i8, I8);
impl_value_type!(i16, I16);
impl_value_type!(i32, I32);
impl_value_type!(i64, I64);
impl_value_type!(u16, U16);
impl_value_type!(u32, U32);
impl_value_type!(u64, U64);
impl_value_type!(f32, F32);
impl_value_type!(f64, F64);
impl_value_type!(bool, Bool);
impl_value_type!(u8, Byte);
impl_value_type!(String, Text);
impl_value_type!(Vec2, Vec2);
impl_value_type!(Rect, Rect);
impl_value_type!(Color, Color);

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T: ValueType> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        Self::array(items)
    }
}

impl<T: ValueType> TryFrom<PropertyValue> for Vec<T> {
    type Error = TypeMismatch;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        let expected = <Self as ValueType>::value_kind();
        match value {
            PropertyValue::Array { element, items } if element == T::value_kind() => {
                items.into_iter().map(T::try_from).collect()
            }
            other => Err(other.mismatch(expected)),
        }
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn value_kind() -> ValueKind {
        ValueKind::array_of(T::value_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_conversions() {
        let v: PropertyValue = 3.5f32.into();
        assert_eq!(v.kind(), ValueKind::F32);
        assert_eq!(f32::try_from(v.clone()), Ok(3.5));

        let err = i32::try_from(v).unwrap_err();
        assert_eq!(err.expected, ValueKind::I32);
        assert_eq!(err.found, ValueKind::F32);
    }

    #[test]
    fn test_array_conversions() {
        let v = PropertyValue::from(vec![1u16, 2, 3]);
        assert_eq!(v.kind(), ValueKind::array_of(ValueKind::U16));
        assert!(v.is_kind(&ValueKind::array_of(ValueKind::U16)));
        assert_eq!(Vec::<u16>::try_from(v), Ok(vec![1, 2, 3]));

        let empty = PropertyValue::array(Vec::<String>::new());
        assert_eq!(empty.kind().to_string(), "array<text>");
        assert!(Vec::<f32>::try_from(empty).is_err());
    }

    #[test]
    fn test_default_values_match_kind() {
        let kinds = [
            ValueKind::I8,
            ValueKind::U64,
            ValueKind::F64,
            ValueKind::Text,
            ValueKind::Color,
            ValueKind::array_of(ValueKind::Rect),
        ];
        for kind in kinds {
            assert!(kind.default_value().is_kind(&kind), "{kind}");
        }
    }
}
