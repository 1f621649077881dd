use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use hashbrown::HashMap;
use thiserror::Error;

use super::limits::Limits;
use super::lossless::{LosslessDecoder, PixelImage, Vp8lHeader, VP8L_HEADER_SIZE};
use crate::slice_reader::SliceReader;

/// Errors that can occur when attempting to decode a lossless WebP image
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The data ended in the middle of a field
    #[error("Unexpected end of data")]
    UnexpectedEof,

    /// The VP8L header did not start with 0x2f or declared a version other than 0
    #[error("Invalid VP8L signature {signature:#04x} or version {version}")]
    InvalidSignature {
        /// First byte of the bitstream.
        signature: u8,
        /// 3-bit version field.
        version: u8,
    },

    /// A prefix code could not be built or decoded
    #[error("Invalid Huffman table")]
    InvalidHuffmanTable,

    /// Color cache size outside 1..=11 bits, or a cache index past its end
    #[error("Invalid color cache")]
    InvalidColorCache,

    /// A backward reference used a distance prefix code past the alphabet
    #[error("Invalid LZ77 distance code: {0}")]
    InvalidLz77Distance(u16),

    /// A predictor transform block selected a mode above 13
    #[error("Invalid predictor mode: {0}")]
    InvalidPredictorMode(u8),

    /// The same transform kind appeared twice
    #[error("Duplicate transform of kind {0}")]
    DuplicateTransform(u8),

    /// RIFF's "RIFF" signature not found or invalid
    #[error("Invalid RIFF signature: {0:x?}")]
    RiffSignatureInvalid([u8; 4]),

    /// WebP's "WEBP" signature not found or invalid
    #[error("Invalid WebP signature: {0:x?}")]
    WebpSignatureInvalid([u8; 4]),

    /// An expected chunk was missing
    #[error("An expected chunk was missing")]
    ChunkMissing,

    /// Inconsistent image sizes
    #[error("Inconsistent image sizes")]
    InconsistentImageSizes,

    /// Image is too large for the platform's pointer size
    #[error("Image too large")]
    ImageTooLarge,

    /// Memory limit exceeded
    #[error("Memory limit exceeded")]
    MemoryLimitExceeded,

    /// The file may be valid, but this crate doesn't support decoding it.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Invalid function call or parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// All possible RIFF chunks in a WebP image file
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq)]
pub(crate) enum WebPRiffChunk {
    RIFF,
    WEBP,
    VP8,
    VP8L,
    VP8X,
    ANIM,
    ANMF,
    ALPH,
    ICCP,
    EXIF,
    XMP,
    Unknown([u8; 4]),
}

impl WebPRiffChunk {
    pub(crate) const fn from_fourcc(chunk_fourcc: [u8; 4]) -> Self {
        match &chunk_fourcc {
            b"RIFF" => Self::RIFF,
            b"WEBP" => Self::WEBP,
            b"VP8 " => Self::VP8,
            b"VP8L" => Self::VP8L,
            b"VP8X" => Self::VP8X,
            b"ANIM" => Self::ANIM,
            b"ANMF" => Self::ANMF,
            b"ALPH" => Self::ALPH,
            b"ICCP" => Self::ICCP,
            b"EXIF" => Self::EXIF,
            b"XMP " => Self::XMP,
            _ => Self::Unknown(chunk_fourcc),
        }
    }

    pub(crate) const fn to_fourcc(self) -> [u8; 4] {
        match self {
            Self::RIFF => *b"RIFF",
            Self::WEBP => *b"WEBP",
            Self::VP8 => *b"VP8 ",
            Self::VP8L => *b"VP8L",
            Self::VP8X => *b"VP8X",
            Self::ANIM => *b"ANIM",
            Self::ANMF => *b"ANMF",
            Self::ALPH => *b"ALPH",
            Self::ICCP => *b"ICCP",
            Self::EXIF => *b"EXIF",
            Self::XMP => *b"XMP ",
            Self::Unknown(fourcc) => fourcc,
        }
    }

    pub(crate) const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl core::fmt::Display for WebPRiffChunk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &byte in &self.to_fourcc() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

const VP8_MAGIC: [u8; 3] = [0x9d, 0x01, 0x2a];

/// Minimum payload of a VP8X chunk: flags, reserved bytes and the canvas size.
const VP8X_HEADER_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Lossless(Vp8lHeader),
    Lossy,
}

/// WebP decoder configuration. Reusable across requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeConfig {
    /// Resource limits. Default: [`Limits::default`].
    pub limits: Limits,
}

impl DecodeConfig {
    /// Replace the resource limits.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Remove every resource limit. Only for trusted inputs.
    #[must_use]
    pub fn no_limits(mut self) -> Self {
        self.limits = Limits::none();
        self
    }
}

/// Decoding request that borrows configuration and input data.
///
/// # Example
///
/// ```rust,no_run
/// use zenwebp_lossless::{DecodeConfig, DecodeRequest};
///
/// let config = DecodeConfig::default();
/// let webp_data: &[u8] = &[]; // your WebP data
/// let (pixels, w, h) = DecodeRequest::new(&config, webp_data).decode_rgba()?;
/// # Ok::<(), zenwebp_lossless::DecodeError>(())
/// ```
pub struct DecodeRequest<'a> {
    config: &'a DecodeConfig,
    data: &'a [u8],
}

impl<'a> DecodeRequest<'a> {
    /// Create a new decoding request.
    #[must_use]
    pub fn new(config: &'a DecodeConfig, data: &'a [u8]) -> Self {
        Self { config, data }
    }

    /// Decode to packed ARGB pixels.
    pub fn decode(self) -> Result<PixelImage, DecodeError> {
        WebPDecoder::new_with_config(self.data, self.config)?.decode()
    }

    /// Decode to RGBA pixels.
    pub fn decode_rgba(self) -> Result<(Vec<u8>, u32, u32), DecodeError> {
        let image = self.decode()?;
        Ok((image.to_rgba(), image.width, image.height))
    }

    /// Read image info without decoding pixel data.
    pub fn info(self) -> Result<ImageInfo, DecodeError> {
        let decoder = WebPDecoder::new_with_config(self.data, self.config)?;
        Ok(decoder.info())
    }
}

/// Lossless WebP decoder over an in-memory file.
///
/// Construction walks the RIFF chunks and reads the image header; pixels are
/// only decoded by [`decode`](Self::decode) or [`read_image`](Self::read_image).
pub struct WebPDecoder<'a> {
    r: SliceReader<'a>,
    limits: Limits,

    width: u32,
    height: u32,
    has_alpha: bool,
    kind: ImageKind,

    chunks: HashMap<WebPRiffChunk, Range<u64>>,
}

impl<'a> WebPDecoder<'a> {
    /// Create a new `WebPDecoder` from the data slice.
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        Self::new_with_config(data, &DecodeConfig::default())
    }

    /// Create a new `WebPDecoder` from the data slice with the given configuration.
    pub fn new_with_config(data: &'a [u8], config: &DecodeConfig) -> Result<Self, DecodeError> {
        config.limits.check_file_size(data.len() as u64)?;

        let mut decoder = Self {
            r: SliceReader::new(data),
            limits: config.limits.clone(),
            width: 0,
            height: 0,
            has_alpha: false,
            kind: ImageKind::Lossy,
            chunks: HashMap::new(),
        };
        decoder.read_data()?;
        decoder.limits.check_image(decoder.width, decoder.height)?;
        Ok(decoder)
    }

    fn read_data(&mut self) -> Result<(), DecodeError> {
        match read_fourcc(&mut self.r)? {
            WebPRiffChunk::RIFF => {}
            fourcc => return Err(DecodeError::RiffSignatureInvalid(fourcc.to_fourcc())),
        }
        let riff_size = u64::from(self.r.read_u32_le()?);
        match read_fourcc(&mut self.r)? {
            WebPRiffChunk::WEBP => {}
            fourcc => return Err(DecodeError::WebpSignatureInvalid(fourcc.to_fourcc())),
        }

        let data_len = self.r.get_ref().len() as u64;
        let end = (riff_size + 8).min(data_len);
        if end < data_len {
            log::warn!("ignoring {} bytes after the RIFF chunk", data_len - end);
        }

        let mut canvas = None;
        let mut position = self.r.position();
        while position + 8 <= end {
            let (chunk, chunk_size, chunk_size_rounded) = read_chunk_header(&mut self.r)?;
            let start = position + 8;
            if start + chunk_size > end {
                log::warn!(
                    "{chunk} chunk declares {chunk_size} bytes but only {} remain, stopping",
                    end - start
                );
                break;
            }

            match chunk {
                WebPRiffChunk::VP8X => {
                    let raster_seen = self.chunks.contains_key(&WebPRiffChunk::VP8)
                        || self.chunks.contains_key(&WebPRiffChunk::VP8L);
                    if raster_seen {
                        log::debug!("ignoring VP8X chunk after the image data");
                    } else if chunk_size < VP8X_HEADER_SIZE {
                        log::warn!("VP8X chunk of {chunk_size} bytes is too short, skipping");
                    } else {
                        let _flags = self.r.read_u8()?;
                        let _reserved = self.r.read_u24_le()?;
                        let width = self.r.read_u24_le()? + 1;
                        let height = self.r.read_u24_le()? + 1;
                        canvas = Some((width, height));
                    }
                }
                WebPRiffChunk::VP8 | WebPRiffChunk::VP8L => {}
                WebPRiffChunk::ALPH
                | WebPRiffChunk::ANIM
                | WebPRiffChunk::ANMF
                | WebPRiffChunk::ICCP
                | WebPRiffChunk::EXIF
                | WebPRiffChunk::XMP => {
                    log::debug!("skipping {chunk} chunk of {chunk_size} bytes");
                }
                WebPRiffChunk::RIFF | WebPRiffChunk::WEBP | WebPRiffChunk::Unknown(_) => {
                    log::warn!("skipping unknown {chunk} chunk of {chunk_size} bytes");
                }
            }

            if !chunk.is_unknown() {
                self.chunks.entry(chunk).or_insert(start..start + chunk_size);
            }

            position = (start + chunk_size_rounded).min(end);
            self.r.seek_from_start(position)?;
        }

        if let Some(range) = self.chunks.get(&WebPRiffChunk::VP8L) {
            let payload = self.slice(range);
            if payload.len() < VP8L_HEADER_SIZE {
                return Err(DecodeError::UnexpectedEof);
            }
            let header = Vp8lHeader::parse(payload)?;
            self.width = u32::from(header.width);
            self.height = u32::from(header.height);
            self.has_alpha = header.has_alpha;
            self.kind = ImageKind::Lossless(header);
        } else if let Some(range) = self.chunks.get(&WebPRiffChunk::VP8) {
            let (width, height) = read_vp8_dimensions(self.slice(range))
                .or(canvas)
                .ok_or(DecodeError::ChunkMissing)?;
            self.width = width;
            self.height = height;
            self.has_alpha = self.chunks.contains_key(&WebPRiffChunk::ALPH);
            self.kind = ImageKind::Lossy;
        } else if self.chunks.contains_key(&WebPRiffChunk::ANMF) {
            return Err(DecodeError::UnsupportedFeature("animated WebP".into()));
        } else {
            return Err(DecodeError::ChunkMissing);
        }

        if let Some(canvas) = canvas {
            if canvas != (self.width, self.height) {
                return Err(DecodeError::InconsistentImageSizes);
            }
        }

        Ok(())
    }

    fn slice(&self, range: &Range<u64>) -> &'a [u8] {
        &self.r.get_ref()[range.start as usize..range.end as usize]
    }

    fn chunk(&self, chunk: WebPRiffChunk) -> Option<&'a [u8]> {
        self.chunks.get(&chunk).map(|range| self.slice(range))
    }

    /// Returns the (width, height) of the image in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns whether the image declares an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Returns true if the image data is a lossy VP8 bitstream, which this
    /// crate reports on but does not decode.
    pub fn is_lossy(&self) -> bool {
        self.kind == ImageKind::Lossy
    }

    /// Returns the raw ICC profile, if present.
    pub fn icc_profile(&self) -> Option<&'a [u8]> {
        self.chunk(WebPRiffChunk::ICCP)
    }

    /// Returns the raw EXIF metadata, if present.
    pub fn exif_metadata(&self) -> Option<&'a [u8]> {
        self.chunk(WebPRiffChunk::EXIF)
    }

    /// Returns the raw XMP metadata, if present.
    pub fn xmp_metadata(&self) -> Option<&'a [u8]> {
        self.chunk(WebPRiffChunk::XMP)
    }

    /// Summary of the headers read so far.
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            has_alpha: self.has_alpha,
            format: match self.kind {
                ImageKind::Lossless(_) => BitstreamFormat::Lossless,
                ImageKind::Lossy => BitstreamFormat::Lossy,
            },
            has_animation: self.chunks.contains_key(&WebPRiffChunk::ANIM)
                || self.chunks.contains_key(&WebPRiffChunk::ANMF),
            has_icc_profile: self.chunks.contains_key(&WebPRiffChunk::ICCP),
            has_exif: self.chunks.contains_key(&WebPRiffChunk::EXIF),
            has_xmp: self.chunks.contains_key(&WebPRiffChunk::XMP),
        }
    }

    /// Returns the number of bytes [`read_image`](Self::read_image) writes,
    /// or None if that would take more than `usize::MAX` bytes.
    pub fn output_buffer_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }

    /// Decodes the image to packed ARGB pixels.
    pub fn decode(&mut self) -> Result<PixelImage, DecodeError> {
        let ImageKind::Lossless(header) = self.kind else {
            return Err(DecodeError::UnsupportedFeature("lossy VP8 bitstream".into()));
        };
        let payload = self.chunk(WebPRiffChunk::VP8L).ok_or(DecodeError::ChunkMissing)?;

        let mut decoder = LosslessDecoder::new(payload).with_limits(self.limits.clone());
        if decoder.read_header()? != header {
            return Err(DecodeError::InconsistentImageSizes);
        }
        decoder.decode_frame()
    }

    /// Decodes the image as RGBA into `buf`.
    ///
    /// Fails with `InvalidParameter` if `buf` has length different than
    /// `output_buffer_size()`.
    pub fn read_image(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let expected = self
            .output_buffer_size()
            .ok_or(DecodeError::ImageTooLarge)?;
        if buf.len() != expected {
            return Err(DecodeError::InvalidParameter(format!(
                "output buffer is {} bytes, need {expected}",
                buf.len()
            )));
        }
        self.decode()?.fill_rgba(buf);
        Ok(())
    }
}

/// Width and height from a lossy frame header, when it is well formed.
fn read_vp8_dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    let mut r = SliceReader::new(payload);
    let _frame_tag = r.read_u24_le().ok()?;
    let mut magic = [0u8; 3];
    r.read_exact(&mut magic).ok()?;
    if magic != VP8_MAGIC {
        return None;
    }
    let width = u32::from(r.read_u16_le().ok()? & 0x3fff);
    let height = u32::from(r.read_u16_le().ok()? & 0x3fff);
    (width > 0 && height > 0).then_some((width, height))
}

pub(crate) fn read_fourcc(r: &mut SliceReader) -> Result<WebPRiffChunk, DecodeError> {
    let mut chunk_fourcc = [0; 4];
    r.read_exact(&mut chunk_fourcc)?;
    Ok(WebPRiffChunk::from_fourcc(chunk_fourcc))
}

/// Reads a chunk's FourCC and size, returning the size with and without the
/// padding byte that keeps chunks at even offsets.
pub(crate) fn read_chunk_header(
    r: &mut SliceReader,
) -> Result<(WebPRiffChunk, u64, u64), DecodeError> {
    let chunk = read_fourcc(r)?;
    let chunk_size = u64::from(r.read_u32_le()?);
    let chunk_size_rounded = chunk_size + (chunk_size & 1);
    Ok((chunk, chunk_size, chunk_size_rounded))
}

/// Decode lossless WebP data to RGBA pixels.
///
/// Returns the decoded pixels and dimensions.
///
/// # Example
///
/// ```rust,no_run
/// let webp_data: &[u8] = &[]; // your WebP data
/// let (pixels, width, height) = zenwebp_lossless::decode_rgba(webp_data)?;
/// # Ok::<(), zenwebp_lossless::DecodeError>(())
/// ```
pub fn decode_rgba(data: &[u8]) -> Result<(Vec<u8>, u32, u32), DecodeError> {
    let mut decoder = WebPDecoder::new(data)?;
    let (width, height) = decoder.dimensions();
    let output_size = decoder
        .output_buffer_size()
        .ok_or(DecodeError::ImageTooLarge)?;

    let mut output = vec![0u8; output_size];
    decoder.read_image(&mut output)?;
    Ok((output, width, height))
}

/// Decode a bare VP8L bitstream (the payload of a `VP8L` chunk, without the
/// RIFF wrapper) with the default [`Limits`].
pub fn decode_vp8l(data: &[u8]) -> Result<PixelImage, DecodeError> {
    let limits = Limits::default();
    limits.check_file_size(data.len() as u64)?;

    let mut decoder = LosslessDecoder::new(data).with_limits(limits.clone());
    let header = decoder.read_header()?;
    limits.check_image(u32::from(header.width), u32::from(header.height))?;
    decoder.decode_frame()
}

/// Image information obtained from WebP data header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether the image has an alpha channel.
    pub has_alpha: bool,
    /// Bitstream format (lossy or lossless).
    pub format: BitstreamFormat,
    /// Whether the file carries animation chunks.
    pub has_animation: bool,
    /// Whether the file carries an ICC profile.
    pub has_icc_profile: bool,
    /// Whether the file carries EXIF metadata.
    pub has_exif: bool,
    /// Whether the file carries XMP metadata.
    pub has_xmp: bool,
}

impl ImageInfo {
    /// Parse image information from WebP data.
    pub fn from_webp(data: &[u8]) -> Result<Self, DecodeError> {
        Ok(WebPDecoder::new(data)?.info())
    }
}

/// Bitstream compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum BitstreamFormat {
    /// Lossy compression (VP8).
    Lossy,
    /// Lossless compression (VP8L).
    #[default]
    Lossless,
}

impl core::fmt::Display for BitstreamFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BitstreamFormat::Lossy => f.write_str("lossy"),
            BitstreamFormat::Lossless => f.write_str("lossless"),
        }
    }
}
