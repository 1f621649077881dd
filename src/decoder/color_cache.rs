//! Color cache for VP8L decoding.
//!
//! Every pixel the decoder produces is hashed into a small table; cache codes
//! in the green alphabet then refer back to a slot of that table.

use alloc::vec;
use alloc::vec::Vec;

use super::api::DecodeError;

/// Color cache hash multiplier.
const COLOR_CACHE_MULT: u32 = 0x1e35a7bd;

/// Largest cache size the bitstream can declare.
pub(crate) const MAX_CACHE_BITS: u8 = 11;

/// Slot of `argb` in a cache of `1 << bits` entries.
#[inline]
pub(crate) fn hash(argb: u32, bits: u8) -> usize {
    (COLOR_CACHE_MULT.wrapping_mul(argb) >> (32 - u32::from(bits))) as usize
}

#[derive(Debug, Clone)]
pub(crate) struct ColorCache {
    colors: Vec<u32>,
    bits: u8,
}

impl ColorCache {
    /// Creates an all-zero cache of `1 << bits` entries.
    pub(crate) fn new(bits: u8) -> Result<Self, DecodeError> {
        if !(1..=MAX_CACHE_BITS).contains(&bits) {
            return Err(DecodeError::InvalidColorCache);
        }
        Ok(Self {
            colors: vec![0; 1 << bits],
            bits,
        })
    }

    #[inline]
    pub(crate) fn bits(&self) -> u8 {
        self.bits
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub(crate) fn insert(&mut self, argb: u32) {
        let index = hash(argb, self.bits);
        self.colors[index] = argb;
    }

    #[inline]
    pub(crate) fn lookup(&self, index: usize) -> Result<u32, DecodeError> {
        self.colors
            .get(index)
            .copied()
            .ok_or(DecodeError::InvalidColorCache)
    }
}
