//! Typed pixel output.
//!
//! When the `pixel-types` feature is enabled, decoded images can be returned as
//! pixel types from the [`rgb`] crate instead of raw byte slices:
//!
//! ```rust,no_run
//! use zenwebp_lossless::pixel;
//! use rgb::Rgba;
//!
//! let webp_data: &[u8] = &[]; // your WebP data
//! let (pixels, w, h): (Vec<Rgba<u8>>, u32, u32) = pixel::decode(webp_data)?;
//! # Ok::<(), zenwebp_lossless::DecodeError>(())
//! ```

use alloc::vec::Vec;

use rgb::{Bgr, Bgra, Rgb, Rgba};

use crate::decoder::{DecodeError, PixelImage, WebPDecoder};

mod private {
    pub trait Sealed {}
}

/// Pixel type that can be decoded from WebP.
pub trait DecodePixel: Copy + 'static + private::Sealed {
    /// Converts one packed `0xAARRGGBB` pixel.
    fn from_argb(argb: u32) -> Self;
}

impl private::Sealed for Rgb<u8> {}
impl private::Sealed for Rgba<u8> {}
impl private::Sealed for Bgr<u8> {}
impl private::Sealed for Bgra<u8> {}

#[inline]
fn split(argb: u32) -> [u8; 4] {
    [(argb >> 24) as u8, (argb >> 16) as u8, (argb >> 8) as u8, argb as u8]
}

impl DecodePixel for Rgb<u8> {
    fn from_argb(argb: u32) -> Self {
        let [_, r, g, b] = split(argb);
        Rgb { r, g, b }
    }
}

impl DecodePixel for Rgba<u8> {
    fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = split(argb);
        Rgba { r, g, b, a }
    }
}

impl DecodePixel for Bgr<u8> {
    fn from_argb(argb: u32) -> Self {
        let [_, r, g, b] = split(argb);
        Bgr { b, g, r }
    }
}

impl DecodePixel for Bgra<u8> {
    fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = split(argb);
        Bgra { b, g, r, a }
    }
}

impl PixelImage {
    /// Converts every pixel to `P`.
    pub fn to_pixels<P: DecodePixel>(&self) -> Vec<P> {
        self.data.iter().map(|&argb| P::from_argb(argb)).collect()
    }
}

/// Decode WebP data to a vector of typed pixels.
///
/// Returns `(pixels, width, height)`.
pub fn decode<P: DecodePixel>(data: &[u8]) -> Result<(Vec<P>, u32, u32), DecodeError> {
    let image = WebPDecoder::new(data)?.decode()?;
    Ok((image.to_pixels(), image.width, image.height))
}

/// Decode WebP data into a pre-allocated typed pixel buffer.
///
/// The buffer must hold at least `width * height` pixels. Returns
/// `(width, height)`.
pub fn decode_into<P: DecodePixel>(data: &[u8], output: &mut [P]) -> Result<(u32, u32), DecodeError> {
    let image = WebPDecoder::new(data)?.decode()?;
    if output.len() < image.data.len() {
        return Err(DecodeError::InvalidParameter(alloc::format!(
            "output buffer too small: got {} pixels, need {}",
            output.len(),
            image.data.len()
        )));
    }
    for (dst, &argb) in output.iter_mut().zip(&image.data) {
        *dst = P::from_argb(argb);
    }
    Ok((image.width, image.height))
}
