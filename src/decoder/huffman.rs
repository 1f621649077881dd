//! Canonical Huffman tables for VP8L prefix codes.
//!
//! Codes are assigned canonically from per-symbol lengths and decoded through
//! a two-level lookup table: an 8-bit root table indexed by the next bits of
//! the stream, with second-level tables for codewords longer than 8 bits.

use alloc::vec;
use alloc::vec::Vec;

use super::api::DecodeError;
use super::bit_reader::BitReader;

/// Longest codeword VP8L allows.
pub(crate) const MAX_CODE_LENGTH: u8 = 15;

const ROOT_BITS: u8 = 8;
const ROOT_SIZE: usize = 1 << ROOT_BITS;

const CODE_LENGTH_CODES: usize = 19;
const CODE_LENGTH_CODE_ORDER: [usize; CODE_LENGTH_CODES] = [
    17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Code length used by repeat code 16 before any nonzero length was seen.
const DEFAULT_CODE_LENGTH: u16 = 8;

/// One lookup slot.
///
/// In the root table `bits > ROOT_BITS` marks a link: `value` is the offset of
/// a second-level table indexed by `bits - ROOT_BITS` further bits. Otherwise
/// `bits` is the codeword length (relative to the root for second-level slots)
/// and `value` the decoded symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TableEntry {
    bits: u8,
    value: u16,
}

/// A decodable prefix code for one alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HuffmanTable {
    /// Exactly one symbol; decoding reads no bits.
    Single(u16),
    /// Two symbols selected by one bit: `0` picks the first.
    Pair([u16; 2]),
    /// General canonical code.
    Table {
        root: Vec<TableEntry>,
        second_level: Vec<TableEntry>,
    },
}

impl Default for HuffmanTable {
    fn default() -> Self {
        Self::Single(0)
    }
}

/// Assigns canonical codewords: lengths are visited shortest first, symbols in
/// ascending order within a length, and the running code doubles between
/// lengths. Returns `None` for an over-subscribed or incomplete set.
pub(crate) fn canonical_codes(code_lengths: &[u16], max_length: u8) -> Option<Vec<u16>> {
    let mut codes = vec![0u16; code_lengths.len()];
    let mut code: u32 = 0;
    for len in 1..=u16::from(max_length) {
        for (symbol, &length) in code_lengths.iter().enumerate() {
            if length != len {
                continue;
            }
            if code >= (1 << len) {
                return None;
            }
            codes[symbol] = code as u16;
            code += 1;
        }
        if len < u16::from(max_length) {
            code <<= 1;
        }
    }
    if code != 1 << max_length {
        return None;
    }
    Some(codes)
}

/// Reverses the low `len` bits of `code`.
#[inline]
fn reverse_bits(code: u16, len: u8) -> usize {
    usize::from(code.reverse_bits() >> (16 - u16::from(len)))
}

impl HuffmanTable {
    /// Builds a table from per-symbol code lengths (0 = symbol unused).
    pub(crate) fn build_implicit(code_lengths: &[u16]) -> Result<Self, DecodeError> {
        let mut used = code_lengths
            .iter()
            .enumerate()
            .filter(|(_, &len)| len > 0)
            .map(|(symbol, _)| symbol);
        let first = used.next();
        let second = used.next();
        match (first, second) {
            (None, _) => return Err(DecodeError::InvalidHuffmanTable),
            (Some(symbol), None) => return Ok(Self::Single(symbol as u16)),
            _ => {}
        }

        let max_length = code_lengths.iter().copied().max().unwrap_or(0);
        if max_length == 0 || max_length > u16::from(MAX_CODE_LENGTH) {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        let max_length = max_length as u8;

        let codes =
            canonical_codes(code_lengths, max_length).ok_or(DecodeError::InvalidHuffmanTable)?;

        let mut root = vec![TableEntry::default(); ROOT_SIZE];

        // Widest second-level table hanging off each root slot.
        let mut sub_bits = [0u8; ROOT_SIZE];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            let len = len as u8;
            if len > ROOT_BITS {
                let slot = reverse_bits(codes[symbol], len) & (ROOT_SIZE - 1);
                sub_bits[slot] = sub_bits[slot].max(len - ROOT_BITS);
            }
        }

        let mut second_level_size = 0usize;
        for (slot, &bits) in sub_bits.iter().enumerate() {
            if bits > 0 {
                root[slot] = TableEntry {
                    bits: ROOT_BITS + bits,
                    value: second_level_size as u16,
                };
                second_level_size += 1 << bits;
            }
        }
        let mut second_level = vec![TableEntry::default(); second_level_size];

        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = len as u8;
            let reversed = reverse_bits(codes[symbol], len);
            if len <= ROOT_BITS {
                let entry = TableEntry {
                    bits: len,
                    value: symbol as u16,
                };
                for index in (reversed..ROOT_SIZE).step_by(1 << len) {
                    root[index] = entry;
                }
            } else {
                let link = root[reversed & (ROOT_SIZE - 1)];
                let table_bits = link.bits - ROOT_BITS;
                let offset = usize::from(link.value);
                let sub_len = len - ROOT_BITS;
                let entry = TableEntry {
                    bits: sub_len,
                    value: symbol as u16,
                };
                for index in ((reversed >> ROOT_BITS)..(1 << table_bits)).step_by(1 << sub_len) {
                    second_level[offset + index] = entry;
                }
            }
        }

        Ok(Self::Table { root, second_level })
    }

    /// Reads one prefix code definition from the stream.
    ///
    /// The first bit selects the simple form (one or two literal symbols) or the
    /// normal form (code lengths coded with the 19-symbol code length alphabet).
    pub(crate) fn read(br: &mut BitReader<'_>, alphabet_size: u16) -> Result<Self, DecodeError> {
        if br.read_bit()? {
            Self::read_simple(br, alphabet_size)
        } else {
            Self::read_normal(br, alphabet_size)
        }
    }

    fn read_simple(br: &mut BitReader<'_>, alphabet_size: u16) -> Result<Self, DecodeError> {
        let num_symbols = br.read_bits::<u8>(1)? + 1;
        let is_first_8bits = br.read_bits::<u8>(1)?;
        let first = br.read_bits::<u16>(1 + 7 * is_first_8bits)?;
        if first >= alphabet_size {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        if num_symbols == 1 {
            return Ok(Self::Single(first));
        }

        let second = br.read_bits::<u16>(8)?;
        if second >= alphabet_size {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        if first == second {
            return Ok(Self::Single(first));
        }
        Ok(Self::Pair([first, second]))
    }

    fn read_normal(br: &mut BitReader<'_>, alphabet_size: u16) -> Result<Self, DecodeError> {
        let mut code_length_code_lengths = [0u16; CODE_LENGTH_CODES];
        let num_code_lengths = 4 + br.read_bits::<usize>(4)?;
        if num_code_lengths > CODE_LENGTH_CODES {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        for &symbol in &CODE_LENGTH_CODE_ORDER[..num_code_lengths] {
            code_length_code_lengths[symbol] = br.read_bits(3)?;
        }

        let code_lengths = read_code_lengths(br, &code_length_code_lengths, alphabet_size)?;
        Self::build_implicit(&code_lengths)
    }

    /// Returns true when decoding consumes no bits.
    pub(crate) fn is_single_node(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Decodes the next symbol.
    #[inline]
    pub(crate) fn read_symbol(&self, br: &mut BitReader<'_>) -> Result<u16, DecodeError> {
        match self {
            Self::Single(symbol) => Ok(*symbol),
            Self::Pair(symbols) => Ok(symbols[usize::from(br.read_bits::<u8>(1)?)]),
            Self::Table { root, second_level } => {
                let bits = br.peek(MAX_CODE_LENGTH) as usize;
                let entry = root[bits & (ROOT_SIZE - 1)];
                if entry.bits <= ROOT_BITS {
                    br.consume(entry.bits)?;
                    return Ok(entry.value);
                }
                let table_bits = entry.bits - ROOT_BITS;
                let index = usize::from(entry.value)
                    + ((bits >> ROOT_BITS) & ((1 << table_bits) - 1));
                let entry = second_level[index];
                br.consume(ROOT_BITS + entry.bits)?;
                Ok(entry.value)
            }
        }
    }
}

/// Decodes the run-length coded code lengths of an alphabet.
///
/// Symbols 0..=15 are literal lengths; 16 repeats the previous nonzero length
/// 3..=6 times, 17 emits 3..=10 zeros and 18 emits 11..=138 zeros.
fn read_code_lengths(
    br: &mut BitReader<'_>,
    code_length_code_lengths: &[u16; CODE_LENGTH_CODES],
    num_symbols: u16,
) -> Result<Vec<u16>, DecodeError> {
    let table = HuffmanTable::build_implicit(code_length_code_lengths)?;

    let mut max_symbol = if br.read_bit()? {
        let length_nbits = 2 + 2 * br.read_bits::<u8>(3)?;
        let max_symbol = 2 + br.read_bits::<u32>(length_nbits)?;
        if max_symbol > u32::from(num_symbols) {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        max_symbol as u16
    } else {
        num_symbols
    };

    let mut code_lengths = vec![0u16; usize::from(num_symbols)];
    let mut prev_code_len = DEFAULT_CODE_LENGTH;

    let mut symbol = 0usize;
    while symbol < code_lengths.len() {
        if max_symbol == 0 {
            break;
        }
        max_symbol -= 1;

        let code_len = table.read_symbol(br)?;
        if code_len < 16 {
            code_lengths[symbol] = code_len;
            symbol += 1;
            if code_len != 0 {
                prev_code_len = code_len;
            }
            continue;
        }

        let (extra_bits, repeat_offset, length) = match code_len {
            16 => (2, 3, prev_code_len),
            17 => (3, 3, 0),
            18 => (7, 11, 0),
            _ => return Err(DecodeError::InvalidHuffmanTable),
        };
        let repeat = br.read_bits::<usize>(extra_bits)? + repeat_offset;
        if symbol + repeat > code_lengths.len() {
            return Err(DecodeError::InvalidHuffmanTable);
        }
        code_lengths[symbol..symbol + repeat].fill(length);
        symbol += repeat;
    }

    Ok(code_lengths)
}
