//! Byte cursor over the RIFF container.
//!
//! [`SliceReader`] reads the little-endian chunk framing of a WebP file and
//! hands out borrowed payload slices. Running off the end of the data is
//! reported as [`DecodeError::UnexpectedEof`].

use byteorder_lite::{ByteOrder, LittleEndian};
use core::fmt;

use crate::DecodeError;

#[derive(Clone)]
pub(crate) struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the data.
    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub(crate) fn get_ref(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Moves to `pos`, which may be the end of the data but not past it.
    #[inline]
    pub(crate) fn seek_from_start(&mut self, pos: u64) -> Result<(), DecodeError> {
        match usize::try_from(pos) {
            Ok(pos) if pos <= self.data.len() => {
                self.pos = pos;
                Ok(())
            }
            _ => Err(DecodeError::UnexpectedEof),
        }
    }

    /// Borrows the next `n` bytes and advances past them.
    #[inline]
    pub(crate) fn take_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    #[inline]
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        buf.copy_from_slice(self.take_slice(buf.len())?);
        Ok(())
    }

    #[inline]
    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_slice(1)?[0])
    }

    #[inline]
    pub(crate) fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take_slice(2)?))
    }

    /// Reads a 24-bit little-endian value, as used by the VP8X canvas size.
    #[inline]
    pub(crate) fn read_u24_le(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u24(self.take_slice(3)?))
    }

    #[inline]
    pub(crate) fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take_slice(4)?))
    }
}

impl fmt::Debug for SliceReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceReader")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a];
        let mut r = SliceReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u24_le().unwrap(), 0x04_0302);
        assert_eq!(r.read_u32_le().unwrap(), 0x0807_0605);
        assert_eq!(r.read_u16_le().unwrap(), 0x0a09);
        assert_eq!(r.position(), 10);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_reads_fail_without_moving() {
        let data = [0xaa, 0xbb];
        let mut r = SliceReader::new(&data);
        assert_eq!(r.read_u32_le(), Err(DecodeError::UnexpectedEof));
        assert_eq!(r.position(), 0);
        let mut buf = [0u8; 2];
        r.read_exact(&mut buf).unwrap();
        assert_eq!(buf, data);
        assert_eq!(r.read_u8(), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn seek_stops_at_end() {
        let data = [0u8; 4];
        let mut r = SliceReader::new(&data);
        r.seek_from_start(4).unwrap();
        assert_eq!(r.take_slice(0).unwrap(), &[] as &[u8]);
        assert_eq!(r.seek_from_start(5), Err(DecodeError::UnexpectedEof));
        r.seek_from_start(1).unwrap();
        assert_eq!(r.take_slice(3).unwrap().len(), 3);
        assert_eq!(r.get_ref().len(), 4);
    }
}
