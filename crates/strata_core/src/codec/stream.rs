//! # Byte Streams
//!
//! Little-endian writer and reader used by every property codec.
//!
//! The writer is growable (component payloads vary in size). The reader
//! borrows its input and never panics: every read checks the remaining
//! length first and reports [`CodecError::Truncated`] instead.

use bytemuck::Pod;

use crate::error::CodecError;

/// Growable little-endian writer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

macro_rules! write_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a `", stringify!($ty), "` in little-endian format.")]
            #[inline]
            pub fn $name(&mut self, value: $ty) {
                self.buffer.extend_from_slice(&value.to_le_bytes());
            }
        )*
    };
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates an empty writer with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    write_le! {
        write_u8: u8,
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_f32: f32,
        write_f64: f64,
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a length or count as a 4-byte prefix.
    ///
    /// Lengths above `u32::MAX` saturate; such payloads cannot be framed anyway.
    #[inline]
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    /// Writes a `Pod` value of `f32` lanes, each lane little-endian.
    pub fn write_f32_lanes<T: Pod>(&mut self, value: &T) {
        for lane in bytemuck::cast_slice::<T, f32>(std::slice::from_ref(value)) {
            self.write_f32(*lane);
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Overwrites two bytes at `position` with a little-endian `u16`.
    ///
    /// Used to back-patch counts once they are known.
    pub fn patch_u16(&mut self, position: usize, value: u16) {
        if let Some(slot) = self.buffer.get_mut(position..position + 2) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Discards everything written past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.buffer.truncate(len);
    }

    /// Consumes the writer, returning the bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }
}

/// Borrowing little-endian reader.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

macro_rules! read_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a `", stringify!($ty), "` in little-endian format.")]
            ///
            /// # Errors
            ///
            /// Returns [`CodecError::Truncated`] if the input is too short.
            #[inline]
            pub fn $name(&mut self) -> Result<$ty, CodecError> {
                let bytes = self.take(std::mem::size_of::<$ty>())?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Creates a reader positioned at `offset`.
    ///
    /// An offset past the end yields an empty reader.
    #[must_use]
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self {
            buffer,
            position: offset.min(buffer.len()),
        }
    }

    /// Current read position within the buffer.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Takes `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Truncated {
                needed: len,
                remaining,
            });
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    read_le! {
        read_u8: u8,
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
        read_i8: i8,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_f32: f32,
        read_f64: f64,
    }

    /// Reads a 4-byte length prefix and checks it against the remaining input.
    ///
    /// `min_element_size` is the smallest encoded size of one counted unit;
    /// a count that could not possibly fit is rejected before any allocation.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] if the prefix itself is cut off,
    /// [`CodecError::MalformedLength`] if the count cannot fit.
    pub fn read_len(&mut self, min_element_size: usize) -> Result<usize, CodecError> {
        let length = self.read_u32()? as usize;
        let remaining = self.remaining();
        if length.saturating_mul(min_element_size) > remaining {
            return Err(CodecError::MalformedLength { length, remaining });
        }
        Ok(length)
    }

    /// Reads `N` little-endian `f32` lanes into a `Pod` value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the input is too short.
    pub fn read_f32_lanes<T: Pod, const N: usize>(&mut self) -> Result<T, CodecError> {
        let mut lanes = [0f32; N];
        for lane in &mut lanes {
            *lane = self.read_f32()?;
        }
        Ok(bytemuck::pod_read_unaligned(bytemuck::cast_slice(&lanes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_shared::Rect;

    #[test]
    fn test_little_endian_layout() {
        let mut w = ByteWriter::new();
        w.write_u16(0x0102);
        w.write_i32(-1);
        assert_eq!(w.as_slice(), &[0x02, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_u16(), Ok(0x0102));
        assert_eq!(r.read_i32(), Ok(-1));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_every_width_reads_back() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAB);
        w.write_u64(u64::MAX - 1);
        w.write_i8(-2);
        w.write_i16(-300);
        w.write_i64(i64::MIN);
        w.write_u32(0xDEAD_BEEF);
        w.write_f64(-0.25);
        assert_eq!(w.len(), 1 + 8 + 1 + 2 + 8 + 4 + 8);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_u8(), Ok(0xAB));
        assert_eq!(r.read_u64(), Ok(u64::MAX - 1));
        assert_eq!(r.read_i8(), Ok(-2));
        assert_eq!(r.read_i16(), Ok(-300));
        assert_eq!(r.read_i64(), Ok(i64::MIN));
        assert_eq!(r.read_u32(), Ok(0xDEAD_BEEF));
        assert_eq!(r.read_f64(), Ok(-0.25));
        assert_eq!(
            r.read_u8(),
            Err(CodecError::Truncated {
                needed: 1,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_truncated_read() {
        let mut r = ByteReader::at(&[1, 2, 3], 1);
        assert_eq!(
            r.read_u32(),
            Err(CodecError::Truncated {
                needed: 4,
                remaining: 2
            })
        );
        // A failed read does not advance.
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn test_length_prefix_bounds() {
        let mut w = ByteWriter::new();
        w.write_len(1_000);
        w.write_bytes(&[0; 8]);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(
            r.read_len(1),
            Err(CodecError::MalformedLength {
                length: 1_000,
                remaining: 8
            })
        );
    }

    #[test]
    fn test_f32_lanes() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let mut w = ByteWriter::new();
        w.write_f32_lanes(&rect);
        assert_eq!(w.len(), 16);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_f32_lanes::<Rect, 4>(), Ok(rect));
    }

    #[test]
    fn test_patch_u16() {
        let mut w = ByteWriter::new();
        w.write_u16(0);
        w.write_u8(9);
        w.patch_u16(0, 7);
        assert_eq!(w.into_vec(), vec![7, 0, 9]);
    }
}
