//! Decoding of lossless WebP (VP8L) images
//!
//! This crate decodes the lossless WebP bitstream: canonical prefix codes with
//! meta prefix code groups, LZ77 backward references, the color cache and the
//! four inverse transforms (predictor, color, subtract green, color indexing).
//! Files are accepted either as complete RIFF containers or as bare `VP8L`
//! payloads.
//!
//! # Features
//!
//! - `std` (default): Implement `std::error::Error` for [`DecodeError`].
//! - `pixel-types`: Typed pixel output through the [`rgb`](https://docs.rs/rgb) crate.
//!
//! # no_std Support
//!
//! Decoding works in `no_std` environments (requires `alloc`):
//! ```toml
//! [dependencies]
//! zenwebp-lossless = { version = "...", default-features = false }
//! ```
//!
//! All decoding functions take `&[u8]` slices directly - no Read/Seek traits required.
//!
//! # Decoding
//!
//! Use the convenience functions:
//!
//! ```rust,no_run
//! let webp_data: &[u8] = &[]; // your WebP data
//! let (pixels, width, height) = zenwebp_lossless::decode_rgba(webp_data)?;
//! # Ok::<(), zenwebp_lossless::DecodeError>(())
//! ```
//!
//! Or the [`WebPDecoder`] for more control:
//!
//! ```rust,no_run
//! use zenwebp_lossless::WebPDecoder;
//!
//! let webp_data: &[u8] = &[]; // your WebP data
//! let mut decoder = WebPDecoder::new(webp_data)?;
//! let (width, height) = decoder.dimensions();
//! let image = decoder.decode()?;
//! let argb = image.pixel(0, 0);
//! # let _ = (width, height, argb);
//! # Ok::<(), zenwebp_lossless::DecodeError>(())
//! ```
//!
//! Lossy (`VP8 `) files are recognized by [`ImageInfo::from_webp`] but decoding
//! them fails with [`DecodeError::UnsupportedFeature`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

pub mod decoder;

mod slice_reader;

/// Type-safe pixel output.
#[cfg(feature = "pixel-types")]
pub mod pixel;

// Re-export decoder public API
pub use decoder::{
    decode_rgba, decode_vp8l, BitstreamFormat, DecodeConfig, DecodeError, DecodeRequest,
    ImageInfo, Limits, PixelImage, WebPDecoder,
};
