//! LSB-first bit reader for the VP8L bitstream.
//!
//! VP8L packs every field starting at the least significant bit of each byte.
//! Bytes are appended above the bits already buffered, so the next field is
//! always the lowest bits of `buffer`.

use super::api::DecodeError;

/// Bit-level cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u64,
    nbits: u8,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            nbits: 0,
        }
    }

    /// Pulls whole bytes into the buffer until it holds more than 56 bits
    /// or the input runs out.
    #[inline]
    fn fill(&mut self) {
        while self.nbits <= 56 && self.pos < self.data.len() {
            self.buffer |= u64::from(self.data[self.pos]) << self.nbits;
            self.pos += 1;
            self.nbits += 8;
        }
    }

    /// Returns the next `num` bits without consuming them.
    ///
    /// Near the end of the input the missing high bits read as zero; the
    /// matching [`consume`](Self::consume) call reports the shortfall.
    #[inline]
    pub(crate) fn peek(&mut self, num: u8) -> u32 {
        debug_assert!(num <= 32);
        if self.nbits < num {
            self.fill();
        }
        (self.buffer & ((1u64 << num) - 1)) as u32
    }

    /// Drops `num` already peeked bits.
    #[inline]
    pub(crate) fn consume(&mut self, num: u8) -> Result<(), DecodeError> {
        if num > self.nbits {
            return Err(DecodeError::UnexpectedEof);
        }
        self.buffer >>= num;
        self.nbits -= num;
        Ok(())
    }

    /// Reads an unsigned value of `num` (0..=32) bits.
    #[inline]
    pub(crate) fn read_bits<T: TryFrom<u32>>(&mut self, num: u8) -> Result<T, DecodeError> {
        debug_assert!(num as usize <= 8 * core::mem::size_of::<T>());
        debug_assert!(num <= 32);

        if self.nbits < num {
            self.fill();
            if self.nbits < num {
                return Err(DecodeError::UnexpectedEof);
            }
        }

        let value = (self.buffer & ((1u64 << num) - 1)) as u32;
        self.buffer >>= num;
        self.nbits -= num;

        match value.try_into() {
            Ok(value) => Ok(value),
            Err(_) => unreachable!("Value too large to fit in type"),
        }
    }

    /// Reads a single flag bit.
    #[inline]
    pub(crate) fn read_bit(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits::<u8>(1)? == 1)
    }

    /// Number of bits consumed so far.
    pub(crate) fn bit_position(&self) -> usize {
        self.pos * 8 - usize::from(self.nbits)
    }
}
