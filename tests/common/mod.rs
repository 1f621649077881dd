//! Test-side VP8L stream writer.
//!
//! Builds bitstreams field by field so tests can assert exact decoder output.

#![allow(dead_code)]

/// VP8L bit writer - writes bits LSB-first.
#[derive(Default)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bits: u64,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `n_bits` from `value` (LSB-first).
    pub fn write_bits(&mut self, value: u32, n_bits: u8) {
        assert!(n_bits <= 32);
        assert!(n_bits == 32 || u64::from(value) >> n_bits == 0, "{value} does not fit {n_bits} bits");

        self.bits |= u64::from(value) << self.used;
        self.used += n_bits;
        while self.used >= 8 {
            self.buffer.push(self.bits as u8);
            self.bits >>= 8;
            self.used -= 8;
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Pads the last byte with zeros and returns the stream.
    pub fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.buffer.push(self.bits as u8);
        }
        self.buffer
    }

    /// VP8L header: signature, size, alpha flag, version 0.
    pub fn header(&mut self, width: u32, height: u32, has_alpha: bool) {
        self.write_bits(0x2f, 8);
        self.write_bits(width - 1, 14);
        self.write_bits(height - 1, 14);
        self.write_bit(has_alpha);
        self.write_bits(0, 3);
    }

    /// Starts a transform of the given wire kind.
    pub fn transform(&mut self, kind: u32) {
        self.write_bit(true);
        self.write_bits(kind, 2);
    }

    pub fn end_transforms(&mut self) {
        self.write_bit(false);
    }

    pub fn no_color_cache(&mut self) {
        self.write_bit(false);
    }

    pub fn color_cache(&mut self, bits: u32) {
        self.write_bit(true);
        self.write_bits(bits, 4);
    }

    pub fn write_literal(&mut self, group: &Group, argb: u32) {
        group.codes[0].write_symbol(self, ((argb >> 8) & 0xff) as u16);
        group.codes[1].write_symbol(self, ((argb >> 16) & 0xff) as u16);
        group.codes[2].write_symbol(self, (argb & 0xff) as u16);
        group.codes[3].write_symbol(self, (argb >> 24) as u16);
    }

    /// Writes a backward reference of `length` pixels with the raw distance
    /// code `dist_code` (1..=120 are short 2-D distances, larger values are
    /// `distance + 120`).
    pub fn write_backref(&mut self, group: &Group, length: u32, dist_code: u32) {
        let (prefix, extra_bits, extra) = prefix_encode(length);
        group.codes[0].write_symbol(self, 256 + prefix);
        self.write_bits(extra, extra_bits);
        let (prefix, extra_bits, extra) = prefix_encode(dist_code);
        group.codes[4].write_symbol(self, prefix);
        self.write_bits(extra, extra_bits);
    }

    pub fn write_cache_hit(&mut self, group: &Group, key: u16) {
        group.codes[0].write_symbol(self, 280 + key);
    }
}

/// Inverse of the length/distance prefix mapping.
pub fn prefix_encode(value: u32) -> (u16, u8, u32) {
    assert!(value >= 1);
    if value <= 4 {
        return ((value - 1) as u16, 0, 0);
    }
    let d = value - 1;
    let highest = 31 - d.leading_zeros();
    let second = (d >> (highest - 1)) & 1;
    let extra_bits = (highest - 1) as u8;
    ((2 * highest + second) as u16, extra_bits, d & ((1 << extra_bits) - 1))
}

/// One prefix code, as the test writes it.
#[derive(Clone, Debug)]
pub enum Code {
    /// Simple code with one 8-bit symbol: decoding reads no bits.
    Single(u16),
    /// Simple code with two 8-bit symbols selected by one bit.
    Pair(u16, u16),
    /// Normal code with explicit per-symbol lengths.
    Lengths(Vec<u16>),
}

impl Code {
    /// A normal code over `alphabet_size` symbols where `symbols` all get
    /// `length` bits.
    pub fn uniform(alphabet_size: usize, symbols: &[u16], length: u16) -> Self {
        let mut lengths = vec![0; alphabet_size];
        for &symbol in symbols {
            lengths[usize::from(symbol)] = length;
        }
        Self::Lengths(lengths)
    }

    pub fn write_definition(&self, w: &mut BitWriter) {
        match self {
            Code::Single(symbol) => {
                w.write_bit(true);
                w.write_bits(0, 1);
                w.write_bits(1, 1);
                w.write_bits(u32::from(*symbol), 8);
            }
            Code::Pair(first, second) => {
                w.write_bit(true);
                w.write_bits(1, 1);
                w.write_bits(1, 1);
                w.write_bits(u32::from(*first), 8);
                w.write_bits(u32::from(*second), 8);
            }
            Code::Lengths(lengths) => {
                // Every code length 0..=15 gets a 4-bit code-length code, so
                // the code length of symbol s is written as the codeword s.
                w.write_bit(false);
                w.write_bits(19 - 4, 4);
                const ORDER: [usize; 19] =
                    [17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
                for symbol in ORDER {
                    w.write_bits(if symbol < 16 { 4 } else { 0 }, 3);
                }
                // no max_symbol
                w.write_bit(false);
                for &length in lengths {
                    write_codeword(w, length, 4);
                }
            }
        }
    }

    pub fn write_symbol(&self, w: &mut BitWriter, symbol: u16) {
        match self {
            Code::Single(s) => assert_eq!(*s, symbol, "symbol not in code"),
            Code::Pair(first, second) => {
                assert!(symbol == *first || symbol == *second, "symbol not in code");
                w.write_bit(symbol == *second);
            }
            Code::Lengths(lengths) => {
                let codes = canonical_codes(lengths);
                let length = lengths[usize::from(symbol)];
                assert!(length > 0, "symbol {symbol} not in code");
                write_codeword(w, codes[usize::from(symbol)], length as u8);
            }
        }
    }
}

/// Writes a canonical codeword most significant bit first.
fn write_codeword(w: &mut BitWriter, code: u16, length: u8) {
    for bit in (0..length).rev() {
        w.write_bits(u32::from((code >> bit) & 1), 1);
    }
}

fn canonical_codes(lengths: &[u16]) -> Vec<u16> {
    let mut codes = vec![0; lengths.len()];
    let mut code = 0u16;
    for len in 1..=15 {
        for (symbol, &length) in lengths.iter().enumerate() {
            if length == len {
                codes[symbol] = code;
                code += 1;
            }
        }
        code <<= 1;
    }
    codes
}

/// The five prefix codes of one group: green, red, blue, alpha, distance.
#[derive(Clone, Debug)]
pub struct Group {
    pub codes: [Code; 5],
}

impl Group {
    pub fn new(green: Code, red: Code, blue: Code, alpha: Code, dist: Code) -> Self {
        Self {
            codes: [green, red, blue, alpha, dist],
        }
    }

    /// A group that decodes every pixel as `argb` without reading bits.
    pub fn solid(argb: u32) -> Self {
        Self::new(
            Code::Single(((argb >> 8) & 0xff) as u16),
            Code::Single(((argb >> 16) & 0xff) as u16),
            Code::Single((argb & 0xff) as u16),
            Code::Single((argb >> 24) as u16),
            Code::Single(0),
        )
    }

    pub fn write_definition(&self, w: &mut BitWriter) {
        for code in &self.codes {
            code.write_definition(w);
        }
    }
}

/// Writes an auxiliary image (transform data, palette or entropy image)
/// that decodes to `argb` everywhere.
pub fn solid_subimage(w: &mut BitWriter, argb: u32) {
    w.no_color_cache();
    Group::solid(argb).write_definition(w);
}

/// Wraps a VP8L payload in a minimal RIFF container.
pub fn wrap_vp8l_in_riff(vp8l_data: &[u8]) -> Vec<u8> {
    let mut webp = Vec::new();
    webp.extend_from_slice(b"RIFF");
    let riff_size = 4 + 8 + vp8l_data.len() + (vp8l_data.len() % 2);
    webp.extend_from_slice(&(riff_size as u32).to_le_bytes());
    webp.extend_from_slice(b"WEBP");
    webp.extend_from_slice(b"VP8L");
    webp.extend_from_slice(&(vp8l_data.len() as u32).to_le_bytes());
    webp.extend_from_slice(vp8l_data);
    if vp8l_data.len() % 2 == 1 {
        webp.push(0);
    }
    webp
}
