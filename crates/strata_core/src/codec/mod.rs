//! # Property Codecs
//!
//! Stateless encode/decode pairs for every built-in value kind, the byte
//! streams they run over, and the 16-bit inclusion header that prefixes
//! every component payload.
//!
//! ```text
//! [u16 header][prop i0][prop i1]...   i0 < i1 < ... (ascending index)
//! ```

mod builtin;
mod header;
mod registry;
mod stream;
mod value;

pub use builtin::{
    builtin_codecs, ArrayCodec, BoolCodec, ByteCodec, ColorCodec, F32Codec, F64Codec, I16Codec,
    I32Codec, I64Codec, I8Codec, PropertyCodec, RectCodec, TextCodec, U16Codec, U32Codec,
    U64Codec, Vec2Codec,
};
pub use header::PropertyMask;
pub use registry::CodecRegistry;
pub use stream::{ByteReader, ByteWriter};
pub use value::{PropertyValue, ValueKind, ValueType};
