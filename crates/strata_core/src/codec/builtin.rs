//! # Built-in Codecs
//!
//! Fixed-shape encoders for every built-in value kind.
//!
//! ```text
//! integers / floats   fixed width, little-endian
//! bool                1 byte, 0 or 1
//! byte                1 byte
//! text                [u32 len][utf-8 bytes]
//! vec2 / rect / color 2 or 4 x f32
//! array<T>            [u32 count][T payload]*count
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use strata_shared::{Color, Rect, Vec2};

use super::stream::{ByteReader, ByteWriter};
use super::value::{PropertyValue, ValueKind};
use crate::error::CodecError;

/// A stateless encode/decode pair for one value kind.
///
/// `decode` consumes exactly the bytes `encode` produced, so codecs compose
/// inside a larger buffer.
pub trait PropertyCodec: Send + Sync + Debug {
    /// Kind this codec handles.
    fn kind(&self) -> ValueKind;

    /// Encodes `value`.
    ///
    /// # Errors
    ///
    /// Only fails if `value` is not of [`PropertyCodec::kind`].
    fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError>;

    /// Decodes one value from the reader.
    ///
    /// # Errors
    ///
    /// Fails on truncated or corrupt input.
    fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError>;

    /// Decodes one value at `offset`, returning it with the bytes consumed.
    ///
    /// # Errors
    ///
    /// Fails on truncated or corrupt input.
    fn decode_at(&self, bytes: &[u8], offset: usize) -> Result<(PropertyValue, usize), CodecError> {
        let mut reader = ByteReader::at(bytes, offset);
        let start = reader.position();
        let value = self.decode(&mut reader)?;
        Ok((value, reader.position() - start))
    }

    /// Encodes `value` into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Only fails if `value` is not of [`PropertyCodec::kind`].
    fn encode_to_vec(&self, value: &PropertyValue) -> Result<Vec<u8>, CodecError> {
        let mut out = ByteWriter::new();
        self.encode(value, &mut out)?;
        Ok(out.into_vec())
    }

    /// Smallest number of bytes one encoded value occupies.
    fn min_encoded_size(&self) -> usize;
}

// ============================================================================
// SCALARS
// ============================================================================

macro_rules! scalar_codec {
    ($name:ident, $variant:ident, $write:ident, $read:ident, $size:expr) => {
        #[doc = concat!("Codec for `", stringify!($variant), "` values.")]
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl PropertyCodec for $name {
            fn kind(&self) -> ValueKind {
                ValueKind::$variant
            }

            fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError> {
                match value {
                    PropertyValue::$variant(v) => {
                        out.$write(*v);
                        Ok(())
                    }
                    other => Err(other.mismatch(ValueKind::$variant).into()),
                }
            }

            fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError> {
                Ok(PropertyValue::$variant(input.$read()?))
            }

            fn min_encoded_size(&self) -> usize {
                $size
            }
        }
    };
}

scalar_codec!(I8Codec, I8, write_i8, read_i8, 1);
scalar_codec!(I16Codec, I16, write_i16, read_i16, 2);
scalar_codec!(I32Codec, I32, write_i32, read_i32, 4);
scalar_codec!(I64Codec, I64, write_i64, read_i64, 8);
scalar_codec!(U16Codec, U16, write_u16, read_u16, 2);
scalar_codec!(U32Codec, U32, write_u32, read_u32, 4);
scalar_codec!(U64Codec, U64, write_u64, read_u64, 8);
scalar_codec!(F32Codec, F32, write_f32, read_f32, 4);
scalar_codec!(F64Codec, F64, write_f64, read_f64, 8);
scalar_codec!(ByteCodec, Byte, write_u8, read_u8, 1);

/// Codec for `bool` values. Rejects bytes other than 0 and 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolCodec;

impl PropertyCodec for BoolCodec {
    fn kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError> {
        match value {
            PropertyValue::Bool(v) => {
                out.write_u8(u8::from(*v));
                Ok(())
            }
            other => Err(other.mismatch(ValueKind::Bool).into()),
        }
    }

    fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError> {
        match input.read_u8()? {
            0 => Ok(PropertyValue::Bool(false)),
            1 => Ok(PropertyValue::Bool(true)),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    fn min_encoded_size(&self) -> usize {
        1
    }
}

/// Codec for length-prefixed UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

impl PropertyCodec for TextCodec {
    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError> {
        match value {
            PropertyValue::Text(text) => {
                out.write_len(text.len());
                out.write_bytes(text.as_bytes());
                Ok(())
            }
            other => Err(other.mismatch(ValueKind::Text).into()),
        }
    }

    fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError> {
        let len = input.read_len(1)?;
        let raw = input.take(len)?;
        let text = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(PropertyValue::Text(text.to_owned()))
    }

    fn min_encoded_size(&self) -> usize {
        4
    }
}

// ============================================================================
// COMPOSITES (flat f32 lanes)
// ============================================================================

macro_rules! lanes_codec {
    ($name:ident, $variant:ident, $ty:ty, $lanes:expr) => {
        #[doc = concat!("Codec for `", stringify!($ty), "` as ", stringify!($lanes), " f32 lanes.")]
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl PropertyCodec for $name {
            fn kind(&self) -> ValueKind {
                ValueKind::$variant
            }

            fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError> {
                match value {
                    PropertyValue::$variant(v) => {
                        out.write_f32_lanes(v);
                        Ok(())
                    }
                    other => Err(other.mismatch(ValueKind::$variant).into()),
                }
            }

            fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError> {
                Ok(PropertyValue::$variant(input.read_f32_lanes::<$ty, $lanes>()?))
            }

            fn min_encoded_size(&self) -> usize {
                $lanes * 4
            }
        }
    };
}

lanes_codec!(Vec2Codec, Vec2, Vec2, 2);
lanes_codec!(RectCodec, Rect, Rect, 4);
lanes_codec!(ColorCodec, Color, Color, 4);

// ============================================================================
// ARRAYS
// ============================================================================

/// Codec for homogeneous arrays: `[u32 count]` then each element.
#[derive(Debug, Clone)]
pub struct ArrayCodec {
    element: Arc<dyn PropertyCodec>,
}

impl ArrayCodec {
    /// Creates an array codec over an element codec.
    #[must_use]
    pub fn new(element: Arc<dyn PropertyCodec>) -> Self {
        Self { element }
    }
}

impl PropertyCodec for ArrayCodec {
    fn kind(&self) -> ValueKind {
        ValueKind::array_of(self.element.kind())
    }

    fn encode(&self, value: &PropertyValue, out: &mut ByteWriter) -> Result<(), CodecError> {
        match value {
            PropertyValue::Array { element, items } if *element == self.element.kind() => {
                out.write_len(items.len());
                for item in items {
                    self.element.encode(item, out)?;
                }
                Ok(())
            }
            other => Err(other.mismatch(self.kind()).into()),
        }
    }

    fn decode(&self, input: &mut ByteReader<'_>) -> Result<PropertyValue, CodecError> {
        let count = input.read_len(self.element.min_encoded_size())?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.element.decode(input)?);
        }
        Ok(PropertyValue::Array {
            element: self.element.kind(),
            items,
        })
    }

    fn min_encoded_size(&self) -> usize {
        4
    }
}

/// Every non-array built-in codec, in a fixed order.
#[must_use]
pub fn builtin_codecs() -> Vec<Arc<dyn PropertyCodec>> {
    vec![
        Arc::new(I8Codec),
        Arc::new(I16Codec),
        Arc::new(I32Codec),
        Arc::new(I64Codec),
        Arc::new(U16Codec),
        Arc::new(U32Codec),
        Arc::new(U64Codec),
        Arc::new(F32Codec),
        Arc::new(F64Codec),
        Arc::new(BoolCodec),
        Arc::new(ByteCodec),
        Arc::new(TextCodec),
        Arc::new(Vec2Codec),
        Arc::new(RectCodec),
        Arc::new(ColorCodec),
    ]
}
