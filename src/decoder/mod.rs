//! Lossless WebP decoder implementation

mod api;
mod bit_reader;
mod color_cache;
mod huffman;
mod limits;
mod lossless;
mod lossless_transform;

// Re-export public API
pub use api::{
    decode_rgba, decode_vp8l, BitstreamFormat, DecodeConfig, DecodeError, DecodeRequest,
    ImageInfo, WebPDecoder,
};
pub use limits::Limits;
pub use lossless::PixelImage;
