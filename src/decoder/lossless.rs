//! Decoding of lossless WebP images
//!
//! [VP8L bitstream format](https://developers.google.com/speed/webp/docs/webp_lossless_bitstream_specification)
//!
//! A VP8L payload is a 5 byte header, a list of transforms and the entropy
//! coded primary image. Every auxiliary image (transform data, the entropy
//! image, the palette) is coded with the same entropy coder as the primary
//! image, minus the meta prefix codes.

use alloc::vec;
use alloc::vec::Vec;

use super::api::DecodeError;
use super::bit_reader::BitReader;
use super::color_cache::ColorCache;
use super::huffman::HuffmanTable;
use super::limits::Limits;
use super::lossless_transform::{
    add_pixels, subsample_size, TransformKind, TransformRecord, TransformType,
};

/// First byte of every VP8L bitstream.
pub(crate) const VP8L_SIGNATURE: u8 = 0x2f;

/// Size of the VP8L header in bytes.
pub(crate) const VP8L_HEADER_SIZE: usize = 5;

#[rustfmt::skip]
const DISTANCE_MAP: [(i8, i8); 120] = [
    (0, 1),  (1, 0),  (1, 1),  (-1, 1), (0, 2),  (2, 0),  (1, 2),  (-1, 2),
    (2, 1),  (-2, 1), (2, 2),  (-2, 2), (0, 3),  (3, 0),  (1, 3),  (-1, 3),
    (3, 1),  (-3, 1), (2, 3),  (-2, 3), (3, 2),  (-3, 2), (0, 4),  (4, 0),
    (1, 4),  (-1, 4), (4, 1),  (-4, 1), (3, 3),  (-3, 3), (2, 4),  (-2, 4),
    (4, 2),  (-4, 2), (0, 5),  (3, 4),  (-3, 4), (4, 3),  (-4, 3), (5, 0),
    (1, 5),  (-1, 5), (5, 1),  (-5, 1), (2, 5),  (-2, 5), (5, 2),  (-5, 2),
    (4, 4),  (-4, 4), (3, 5),  (-3, 5), (5, 3),  (-5, 3), (0, 6),  (6, 0),
    (1, 6),  (-1, 6), (6, 1),  (-6, 1), (2, 6),  (-2, 6), (6, 2),  (-6, 2),
    (4, 5),  (-4, 5), (5, 4),  (-5, 4), (3, 6),  (-3, 6), (6, 3),  (-6, 3),
    (0, 7),  (7, 0),  (1, 7),  (-1, 7), (5, 5),  (-5, 5), (7, 1),  (-7, 1),
    (4, 6),  (-4, 6), (6, 4),  (-6, 4), (2, 7),  (-2, 7), (7, 2),  (-7, 2),
    (3, 7),  (-3, 7), (7, 3),  (-7, 3), (5, 6),  (-5, 6), (6, 5),  (-6, 5),
    (8, 0),  (4, 7),  (-4, 7), (7, 4),  (-7, 4), (8, 1),  (8, 2),  (6, 6),
    (-6, 6), (8, 3),  (5, 7),  (-5, 7), (7, 5),  (-7, 5), (8, 4),  (6, 7),
    (-6, 7), (7, 6),  (-7, 6), (8, 5),  (7, 7),  (-7, 7), (8, 6),  (8, 7)
];

const NUM_SHORT_DISTANCES: usize = DISTANCE_MAP.len();

const GREEN: usize = 0;
const RED: usize = 1;
const BLUE: usize = 2;
const ALPHA: usize = 3;
const DIST: usize = 4;

const HUFFMAN_CODES_PER_META_CODE: usize = 5;

const NUM_LITERAL_CODES: u16 = 256;
const NUM_LENGTH_CODES: u16 = 24;
const NUM_DISTANCE_CODES: u16 = 40;

type HuffmanCodeGroup = [HuffmanTable; HUFFMAN_CODES_PER_META_CODE];

const ALPHABET_SIZE: [u16; HUFFMAN_CODES_PER_META_CODE] = [
    NUM_LITERAL_CODES + NUM_LENGTH_CODES,
    256,
    256,
    256,
    NUM_DISTANCE_CODES,
];

/// Fields of the 5 byte VP8L header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Vp8lHeader {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) has_alpha: bool,
}

impl Vp8lHeader {
    /// Reads the header from the first bits of `br`.
    ///
    /// All fields are read before the signature and version are checked, so a
    /// header that is merely truncated reports `UnexpectedEof`.
    pub(crate) fn read(br: &mut BitReader<'_>) -> Result<Self, DecodeError> {
        let signature = br.read_bits::<u8>(8)?;
        let width = br.read_bits::<u16>(14)? + 1;
        let height = br.read_bits::<u16>(14)? + 1;
        let has_alpha = br.read_bit()?;
        let version = br.read_bits::<u8>(3)?;
        if signature != VP8L_SIGNATURE || version != 0 {
            return Err(DecodeError::InvalidSignature { signature, version });
        }
        Ok(Self {
            width,
            height,
            has_alpha,
        })
    }

    /// Parses the header at the start of a raw VP8L payload.
    pub(crate) fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        Self::read(&mut BitReader::new(data))
    }
}

/// A decoded image: packed `0xAARRGGBB` pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the bitstream declared alpha as used.
    pub has_alpha: bool,
    /// `width * height` ARGB pixels.
    pub data: Vec<u32>,
}

impl PixelImage {
    /// Returns the ARGB value at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Converts to interleaved RGBA bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.data.len() * 4];
        self.fill_rgba(&mut buf);
        buf
    }

    /// Writes interleaved RGBA bytes into `buf`, stopping at whichever of the
    /// two runs out first.
    pub fn fill_rgba(&self, buf: &mut [u8]) {
        for (&argb, chunk) in self.data.iter().zip(buf.chunks_exact_mut(4)) {
            chunk[0] = (argb >> 16) as u8;
            chunk[1] = (argb >> 8) as u8;
            chunk[2] = argb as u8;
            chunk[3] = (argb >> 24) as u8;
        }
    }

    /// Converts to interleaved RGB bytes, dropping alpha.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.data.len() * 3];
        for (&argb, chunk) in self.data.iter().zip(buf.chunks_exact_mut(3)) {
            chunk[0] = (argb >> 16) as u8;
            chunk[1] = (argb >> 8) as u8;
            chunk[2] = argb as u8;
        }
        buf
    }
}

/// Per-call decoding state for one VP8L bitstream.
#[derive(Debug)]
pub(crate) struct LosslessDecoder<'a> {
    bit_reader: BitReader<'a>,
    header: Option<Vp8lHeader>,
    transforms: Vec<TransformRecord>,
    limits: Limits,
}

impl<'a> LosslessDecoder<'a> {
    /// Create a new decoder over a raw VP8L payload.
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            bit_reader: BitReader::new(data),
            header: None,
            transforms: Vec::new(),
            limits: Limits::none(),
        }
    }

    /// Limits applied to the prefix code groups an entropy image declares.
    pub(crate) fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Reads the header if it has not been read yet.
    pub(crate) fn read_header(&mut self) -> Result<Vp8lHeader, DecodeError> {
        if let Some(header) = self.header {
            return Ok(header);
        }
        let header = Vp8lHeader::read(&mut self.bit_reader)?;
        self.header = Some(header);
        Ok(header)
    }

    /// Decodes the whole bitstream.
    pub(crate) fn decode_frame(mut self) -> Result<PixelImage, DecodeError> {
        let header = self.read_header()?;

        let coded_width = self.read_transforms(header.width, header.height)?;
        let mut data = self.decode_image_stream(coded_width, header.height, true)?;
        log::debug!(
            "VP8L entropy coded data ends at bit {}",
            self.bit_reader.bit_position()
        );

        for transform in self.transforms.iter().rev() {
            transform.apply(&mut data, header.height)?;
        }

        Ok(PixelImage {
            width: u32::from(header.width),
            height: u32::from(header.height),
            has_alpha: header.has_alpha,
            data,
        })
    }

    /// Reads transforms and their data from the bitstream
    ///
    /// Returns the width of the primary image, which a color indexing
    /// transform may have reduced.
    fn read_transforms(&mut self, width: u16, height: u16) -> Result<u16, DecodeError> {
        let mut xsize = width;
        let mut seen = [false; TransformKind::COUNT];

        while self.bit_reader.read_bit()? {
            let kind = TransformKind::from_bits(self.bit_reader.read_bits::<u8>(2)?);
            if core::mem::replace(&mut seen[kind as usize], true) {
                return Err(DecodeError::DuplicateTransform(kind as u8));
            }

            let transform = match kind {
                TransformKind::Predictor => {
                    let size_bits = self.bit_reader.read_bits::<u8>(3)? + 2;
                    let predictor_data = self.decode_image_stream(
                        subsample_size(xsize, size_bits),
                        subsample_size(height, size_bits),
                        false,
                    )?;
                    TransformType::PredictorTransform {
                        size_bits,
                        predictor_data,
                    }
                }
                TransformKind::Color => {
                    let size_bits = self.bit_reader.read_bits::<u8>(3)? + 2;
                    let transform_data = self.decode_image_stream(
                        subsample_size(xsize, size_bits),
                        subsample_size(height, size_bits),
                        false,
                    )?;
                    TransformType::ColorTransform {
                        size_bits,
                        transform_data,
                    }
                }
                TransformKind::SubtractGreen => TransformType::SubtractGreen,
                TransformKind::ColorIndexing => {
                    let table_size = self.bit_reader.read_bits::<u16>(8)? + 1;
                    let mut table_data = self.decode_image_stream(table_size, 1, false)?;
                    Self::adjust_color_map(&mut table_data);
                    TransformType::ColorIndexingTransform {
                        table_size,
                        table_data,
                    }
                }
            };

            let record = TransformRecord {
                transform,
                width: xsize,
            };
            log::debug!("VP8L {record} at width {xsize}");
            xsize = record.coded_width();
            self.transforms.push(record);
        }

        Ok(xsize)
    }

    /// The palette is delta coded: each entry is added to its predecessor.
    fn adjust_color_map(color_map: &mut [u32]) {
        for i in 1..color_map.len() {
            color_map[i] = add_pixels(color_map[i], color_map[i - 1]);
        }
    }

    /// Reads one entropy coded image.
    ///
    /// Only the primary (ARGB) image may carry an entropy image selecting
    /// between several prefix code groups.
    fn decode_image_stream(
        &mut self,
        xsize: u16,
        ysize: u16,
        is_argb_img: bool,
    ) -> Result<Vec<u32>, DecodeError> {
        let color_cache = self.read_color_cache()?;
        let huffman_info = self.read_huffman_codes(is_argb_img, xsize, ysize, color_cache)?;
        self.decode_image_data(xsize, ysize, huffman_info)
    }

    fn read_color_cache(&mut self) -> Result<Option<ColorCache>, DecodeError> {
        if !self.bit_reader.read_bit()? {
            return Ok(None);
        }
        let bits = self.bit_reader.read_bits::<u8>(4)?;
        let cache = ColorCache::new(bits)?;
        log::debug!("VP8L color cache of {} entries", cache.size());
        Ok(Some(cache))
    }

    /// Reads the optional entropy image and every prefix code group.
    fn read_huffman_codes(
        &mut self,
        read_meta: bool,
        xsize: u16,
        ysize: u16,
        color_cache: Option<ColorCache>,
    ) -> Result<HuffmanInfo, DecodeError> {
        let mut num_huff_groups = 1u32;

        let mut huffman_bits = 0;
        let mut huffman_xsize = 1;
        let mut entropy_image = Vec::new();

        if read_meta && self.bit_reader.read_bit()? {
            huffman_bits = self.bit_reader.read_bits::<u8>(3)? + 2;
            huffman_xsize = subsample_size(xsize, huffman_bits);
            let huffman_ysize = subsample_size(ysize, huffman_bits);

            entropy_image = self.decode_image_stream(huffman_xsize, huffman_ysize, false)?;

            for pixel in entropy_image.iter_mut() {
                let meta_huff_code = (*pixel >> 8) & 0xffff;
                *pixel = meta_huff_code;
                num_huff_groups = num_huff_groups.max(meta_huff_code + 1);
            }
            log::debug!(
                "VP8L entropy image {huffman_xsize}x{huffman_ysize}, {num_huff_groups} prefix code groups"
            );
            self.limits
                .check_prefix_groups(xsize, ysize, num_huff_groups)?;
        }

        let cache_codes = color_cache
            .as_ref()
            .map_or(0, |cache| 1u16 << cache.bits());

        let mut huffman_code_groups = Vec::with_capacity(num_huff_groups as usize);
        for _ in 0..num_huff_groups {
            let mut group: HuffmanCodeGroup = Default::default();
            for (j, table) in group.iter_mut().enumerate() {
                let mut alphabet_size = ALPHABET_SIZE[j];
                if j == GREEN {
                    alphabet_size += cache_codes;
                }
                *table = HuffmanTable::read(&mut self.bit_reader, alphabet_size)?;
            }
            huffman_code_groups.push(group);
        }

        let mask = if huffman_bits == 0 {
            !0
        } else {
            (1 << huffman_bits) - 1
        };

        Ok(HuffmanInfo {
            xsize: huffman_xsize,
            color_cache,
            image: entropy_image,
            bits: huffman_bits,
            mask,
            huffman_code_groups,
        })
    }

    /// Decodes the pixels of one entropy coded image: literals, backward
    /// references and color cache hits.
    fn decode_image_data(
        &mut self,
        width: u16,
        height: u16,
        mut huffman_info: HuffmanInfo,
    ) -> Result<Vec<u32>, DecodeError> {
        let num_values = usize::from(width) * usize::from(height);
        let mut data = vec![0; num_values];

        let mut tree = &huffman_info.huffman_code_groups[huffman_info.get_huff_index(0, 0)];
        let mut last_cached = 0;
        let mut index = 0;

        let mut next_block_start = 0;
        while index < num_values {
            if index >= next_block_start {
                let x = index % usize::from(width);
                let y = index / usize::from(width);
                next_block_start = (x | usize::from(huffman_info.mask))
                    .min(usize::from(width - 1))
                    + y * usize::from(width)
                    + 1;

                tree = &huffman_info.huffman_code_groups
                    [huffman_info.get_huff_index(x as u16, y as u16)];

                // When every literal code is a single symbol, the block is a
                // solid run that occupies no bits.
                if tree[..DIST].iter().all(HuffmanTable::is_single_node) {
                    let code = tree[GREEN].read_symbol(&mut self.bit_reader)?;
                    if code < NUM_LITERAL_CODES {
                        let n = if huffman_info.bits == 0 {
                            num_values - index
                        } else {
                            next_block_start - index
                        };
                        let value = Self::read_literal(&mut self.bit_reader, tree, code)?;
                        data[index..][..n].fill(value);
                        index += n;
                        continue;
                    }
                }
            }

            let code = tree[GREEN].read_symbol(&mut self.bit_reader)?;

            if code < NUM_LITERAL_CODES {
                data[index] = Self::read_literal(&mut self.bit_reader, tree, code)?;
                index += 1;
            } else if code < NUM_LITERAL_CODES + NUM_LENGTH_CODES {
                let length_symbol = code - NUM_LITERAL_CODES;
                let length = Self::get_copy_distance(&mut self.bit_reader, length_symbol)?;

                let dist_symbol = tree[DIST].read_symbol(&mut self.bit_reader)?;
                if dist_symbol >= NUM_DISTANCE_CODES {
                    return Err(DecodeError::InvalidLz77Distance(dist_symbol));
                }
                let dist_code = Self::get_copy_distance(&mut self.bit_reader, dist_symbol)?;
                let dist = Self::plane_code_to_distance(width, dist_code);

                let source = match index.checked_sub(dist) {
                    Some(source) => source,
                    None => {
                        log::debug!(
                            "VP8L backward reference at pixel {index} reaches {dist} back, clamping to 0"
                        );
                        0
                    }
                };
                let length = length.min(num_values - index);

                // Pixel by pixel, so an overlapping copy repeats what it just wrote.
                for i in 0..length {
                    data[index + i] = data[source + i];
                }
                index += length;
            } else {
                let key = usize::from(code - NUM_LITERAL_CODES - NUM_LENGTH_CODES);
                let color_cache = huffman_info
                    .color_cache
                    .as_mut()
                    .ok_or(DecodeError::InvalidColorCache)?;
                while last_cached < index {
                    color_cache.insert(data[last_cached]);
                    last_cached += 1;
                }
                data[index] = color_cache.lookup(key)?;
                index += 1;
            }
        }

        Ok(data)
    }

    #[inline]
    fn read_literal(
        bit_reader: &mut BitReader<'_>,
        tree: &HuffmanCodeGroup,
        green: u16,
    ) -> Result<u32, DecodeError> {
        let red = tree[RED].read_symbol(bit_reader)?;
        let blue = tree[BLUE].read_symbol(bit_reader)?;
        let alpha = tree[ALPHA].read_symbol(bit_reader)?;
        Ok((u32::from(alpha) << 24)
            | (u32::from(red) << 16)
            | (u32::from(green) << 8)
            | u32::from(blue))
    }

    /// Maps a length or distance prefix code to its value, reading the extra
    /// bits it calls for.
    fn get_copy_distance(
        bit_reader: &mut BitReader<'_>,
        prefix_code: u16,
    ) -> Result<usize, DecodeError> {
        if prefix_code < 4 {
            return Ok(usize::from(prefix_code + 1));
        }
        let extra_bits = ((prefix_code - 2) >> 1) as u8;
        let offset = (2 + (usize::from(prefix_code) & 1)) << extra_bits;

        Ok(offset + bit_reader.read_bits::<usize>(extra_bits)? + 1)
    }

    /// Gets distance to pixel
    fn plane_code_to_distance(xsize: u16, plane_code: usize) -> usize {
        if plane_code > NUM_SHORT_DISTANCES {
            plane_code - NUM_SHORT_DISTANCES
        } else {
            let (xoffset, yoffset) = DISTANCE_MAP[plane_code - 1];
            let dist = i32::from(xoffset) + i32::from(yoffset) * i32::from(xsize);
            dist.max(1) as usize
        }
    }
}

/// Prefix code groups of one entropy coded image and the entropy image that
/// picks between them.
#[derive(Debug, Clone)]
struct HuffmanInfo {
    xsize: u16,
    color_cache: Option<ColorCache>,
    image: Vec<u32>,
    bits: u8,
    mask: u16,
    huffman_code_groups: Vec<HuffmanCodeGroup>,
}

impl HuffmanInfo {
    fn get_huff_index(&self, x: u16, y: u16) -> usize {
        if self.bits == 0 {
            return 0;
        }
        let position =
            usize::from(y >> self.bits) * usize::from(self.xsize) + usize::from(x >> self.bits);
        self.image[position] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_group(tables: [HuffmanTable; 5], cache: Option<ColorCache>) -> HuffmanInfo {
        HuffmanInfo {
            xsize: 1,
            color_cache: cache,
            image: Vec::new(),
            bits: 0,
            mask: !0,
            huffman_code_groups: vec![tables],
        }
    }

    #[test]
    fn prefix_codes_below_four_read_no_bits() {
        let mut br = BitReader::new(&[]);
        for p in 0..4u16 {
            assert_eq!(
                LosslessDecoder::get_copy_distance(&mut br, p).unwrap(),
                usize::from(p) + 1
            );
        }
        assert_eq!(br.bit_position(), 0);
    }

    #[test]
    fn prefix_code_four_uses_one_extra_bit() {
        let mut br = BitReader::new(&[0b10]);
        assert_eq!(LosslessDecoder::get_copy_distance(&mut br, 4).unwrap(), 5);
        assert_eq!(LosslessDecoder::get_copy_distance(&mut br, 4).unwrap(), 6);
        assert_eq!(br.bit_position(), 2);
    }

    #[test]
    fn prefix_code_with_many_extra_bits() {
        // p = 39: extra_bits = 18, offset = 3 << 18
        let mut br = BitReader::new(&[0xff, 0xff, 0xff]);
        let value = LosslessDecoder::get_copy_distance(&mut br, 39).unwrap();
        assert_eq!(value, (3 << 18) + (1 << 18) - 1 + 1);
    }

    #[test]
    fn short_distance_codes() {
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 1), 10); // (0, 1)
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 2), 1); // (1, 0)
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 4), 9); // (-1, 1)
        // (-1, 1) on a one pixel wide image clamps to 1
        assert_eq!(LosslessDecoder::plane_code_to_distance(1, 4), 1);
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 120), 78); // (8, 7)
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 121), 1);
        assert_eq!(LosslessDecoder::plane_code_to_distance(10, 500), 380);
    }

    #[test]
    fn backward_copy_overlaps_itself() {
        // Green alternates between a literal and length prefix 2 (length 3);
        // distance symbol 1 is code 2, the left neighbor.
        let green = HuffmanTable::Pair([0x22, 256 + 2]);
        let tables = [
            green,
            HuffmanTable::Single(0x11),
            HuffmanTable::Single(0x33),
            HuffmanTable::Single(0xff),
            HuffmanTable::Single(1),
        ];
        let bits = [0b10];
        let mut decoder = LosslessDecoder::new(&bits);
        let data = decoder
            .decode_image_data(4, 1, single_group(tables, None))
            .unwrap();
        assert_eq!(data, vec![0xff11_2233; 4]);
    }

    #[test]
    fn backward_copy_is_truncated_at_image_end() {
        // length prefix 5 with extra bit 1 = 8, far more than the 2 pixels left
        let green = HuffmanTable::Pair([0x01, 256 + 5]);
        let tables = [
            green,
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(1),
        ];
        let bits = [0b110];
        let mut decoder = LosslessDecoder::new(&bits);
        let data = decoder
            .decode_image_data(3, 1, single_group(tables, None))
            .unwrap();
        assert_eq!(data, vec![0x100; 3]);
    }

    #[test]
    fn backward_copy_before_first_pixel_clamps_to_start() {
        // distance code 1 is one row up on a 2 pixel wide image
        let green = HuffmanTable::Pair([0x07, 256]);
        let tables = [
            green,
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
        ];
        // literal, then copy 1 pixel from 2 back at index 1
        let bits = [0b10];
        let mut decoder = LosslessDecoder::new(&bits);
        let data = decoder
            .decode_image_data(2, 1, single_group(tables, None))
            .unwrap();
        assert_eq!(data, vec![0x700, 0x700]);
    }

    #[test]
    fn color_cache_hits_return_inserted_pixels() {
        let literal = 0xff00_4000u32;
        let cache = ColorCache::new(2).unwrap();
        let key = crate::decoder::color_cache::hash(literal, 2) as u16;
        let green = HuffmanTable::Pair([0x40, 280 + key]);
        let tables = [
            green,
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0xff),
            HuffmanTable::Single(0),
        ];
        let bits = [0b10];
        let mut decoder = LosslessDecoder::new(&bits);
        let data = decoder
            .decode_image_data(2, 1, single_group(tables, Some(cache)))
            .unwrap();
        assert_eq!(data, vec![literal, literal]);
    }

    #[test]
    fn cache_code_without_cache_fails() {
        let tables = [
            HuffmanTable::Single(280),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
            HuffmanTable::Single(0),
        ];
        let mut decoder = LosslessDecoder::new(&[]);
        assert_eq!(
            decoder.decode_image_data(1, 1, single_group(tables, None)),
            Err(DecodeError::InvalidColorCache)
        );
    }

    #[test]
    fn solid_groups_consume_no_bits() {
        let tables = [
            HuffmanTable::Single(0x80),
            HuffmanTable::Single(0x10),
            HuffmanTable::Single(0x20),
            HuffmanTable::Single(0x30),
            HuffmanTable::Single(0),
        ];
        let mut decoder = LosslessDecoder::new(&[]);
        let data = decoder
            .decode_image_data(3, 2, single_group(tables, None))
            .unwrap();
        assert_eq!(data, vec![0x3010_8020; 6]);
        assert_eq!(decoder.bit_reader.bit_position(), 0);
    }

    #[test]
    fn entropy_image_selects_group_per_block() {
        let solid = |green: u16| {
            [
                HuffmanTable::Single(green),
                HuffmanTable::Single(0),
                HuffmanTable::Single(0),
                HuffmanTable::Single(0),
                HuffmanTable::Single(0),
            ]
        };
        // 8x1 image, 4 pixel blocks: block 0 uses group 1, block 1 group 0
        let info = HuffmanInfo {
            xsize: 2,
            color_cache: None,
            image: vec![1, 0],
            bits: 2,
            mask: 3,
            huffman_code_groups: vec![solid(0xaa), solid(0xbb)],
        };
        let mut decoder = LosslessDecoder::new(&[]);
        let data = decoder.decode_image_data(8, 1, info).unwrap();
        assert_eq!(&data[..4], &[0xbb00; 4]);
        assert_eq!(&data[4..], &[0xaa00; 4]);
    }

    #[test]
    fn header_fields() {
        // signature, width - 1 = 1, height - 1 = 2, alpha, version 0
        let bits: u64 = 0x2f | (1 << 8) | (2 << 22) | (1 << 36);
        let bytes = bits.to_le_bytes();
        let header = Vp8lHeader::parse(&bytes[..VP8L_HEADER_SIZE]).unwrap();
        assert_eq!(
            header,
            Vp8lHeader {
                width: 2,
                height: 3,
                has_alpha: true
            }
        );
    }

    #[test]
    fn header_rejects_signature_and_version() {
        let bytes = [0x2e, 0, 0, 0, 0];
        assert_eq!(
            Vp8lHeader::parse(&bytes),
            Err(DecodeError::InvalidSignature {
                signature: 0x2e,
                version: 0
            })
        );
        let bits: u64 = 0x2f | (3 << 37);
        assert_eq!(
            Vp8lHeader::parse(&bits.to_le_bytes()[..5]),
            Err(DecodeError::InvalidSignature {
                signature: 0x2f,
                version: 3
            })
        );
        assert_eq!(
            Vp8lHeader::parse(&[0x2f, 0, 0]),
            Err(DecodeError::UnexpectedEof)
        );
    }

    #[test]
    fn pixel_image_conversions() {
        let image = PixelImage {
            width: 2,
            height: 1,
            has_alpha: true,
            data: vec![0x8011_2233, 0xff44_5566],
        };
        assert_eq!(image.pixel(1, 0), Some(0xff44_5566));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(
            image.to_rgba(),
            vec![0x11, 0x22, 0x33, 0x80, 0x44, 0x55, 0x66, 0xff]
        );
        assert_eq!(image.to_rgb(), vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }
}
