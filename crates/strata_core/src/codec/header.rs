//! 16-bit property inclusion header.
//!
//! Bit `i` set means the property with index `i` follows in the payload.

use strata_shared::MAX_PROPERTY_INDEX;

use super::stream::{ByteReader, ByteWriter};
use crate::error::CodecError;

/// Set of property indices carried by one component payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyMask(u16);

impl PropertyMask {
    /// Empty mask.
    pub const EMPTY: Self = Self(0);

    /// Creates a mask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Adds `index`. Returns false if the index does not fit in the header.
    #[inline]
    pub fn insert(&mut self, index: u8) -> bool {
        if index > MAX_PROPERTY_INDEX {
            return false;
        }
        self.0 |= 1 << index;
        true
    }

    /// Returns true if `index` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, index: u8) -> bool {
        index <= MAX_PROPERTY_INDEX && self.0 & (1 << index) != 0
    }

    /// Number of indices set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns true if no index is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates set indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..=MAX_PROPERTY_INDEX).filter(move |&i| self.contains(i))
    }

    /// Writes the header.
    pub fn write(self, out: &mut ByteWriter) {
        out.write_u16(self.0);
    }

    /// Reads a header.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if fewer than two bytes remain.
    pub fn read(input: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        input.read_u16().map(Self)
    }
}

impl FromIterator<u8> for PropertyMask {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for index in iter {
            mask.insert(index);
        }
        mask
    }
}
