//! Inverse VP8L pixel transforms.
//!
//! Transforms are parsed in stream order and undone in reverse. Each variant
//! carries the data it was parsed with, and the width of the image it
//! reconstructs.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::api::DecodeError;

/// Wire value of each transform kind.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransformKind {
    /// Spatial prediction from neighboring pixels.
    Predictor = 0,
    /// Cross-channel color decorrelation.
    Color = 1,
    /// Green subtracted from red and blue.
    SubtractGreen = 2,
    /// Palette indices, possibly several per pixel.
    ColorIndexing = 3,
}

impl TransformKind {
    pub(crate) const COUNT: usize = 4;

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Predictor,
            1 => Self::Color,
            2 => Self::SubtractGreen,
            _ => Self::ColorIndexing,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum TransformType {
    PredictorTransform {
        size_bits: u8,
        predictor_data: Vec<u32>,
    },
    ColorTransform {
        size_bits: u8,
        transform_data: Vec<u32>,
    },
    SubtractGreen,
    ColorIndexingTransform {
        table_size: u16,
        table_data: Vec<u32>,
    },
}

/// A parsed transform together with the image width it operates at.
#[derive(Debug, Clone)]
pub(crate) struct TransformRecord {
    pub(crate) transform: TransformType,
    pub(crate) width: u16,
}

impl fmt::Display for TransformRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transform {
            TransformType::PredictorTransform { size_bits, .. } => {
                write!(f, "predictor transform: block size {}", 1u32 << size_bits)
            }
            TransformType::ColorTransform { size_bits, .. } => {
                write!(f, "color transform: block size {}", 1u32 << size_bits)
            }
            TransformType::SubtractGreen => f.write_str("subtract green transform"),
            TransformType::ColorIndexingTransform { table_size, .. } => {
                write!(f, "color indexing transform: {table_size} colors")
            }
        }
    }
}

#[inline]
pub(crate) fn subsample_size(size: u16, bits: u8) -> u16 {
    ((u32::from(size) + (1u32 << bits) - 1) >> bits) as u16
}

/// Bits used to pack palette indices for a palette of `table_size` colors:
/// 8, 4, 2 or 1 index per pixel for widths bits 3, 2, 1, 0.
pub(crate) fn color_indexing_width_bits(table_size: u16) -> u8 {
    match table_size {
        0..=2 => 3,
        3..=4 => 2,
        5..=16 => 1,
        _ => 0,
    }
}

impl TransformRecord {
    /// Width of the pixel data this transform consumes.
    pub(crate) fn coded_width(&self) -> u16 {
        match &self.transform {
            TransformType::ColorIndexingTransform { table_size, .. } => {
                subsample_size(self.width, color_indexing_width_bits(*table_size))
            }
            _ => self.width,
        }
    }

    /// Undoes this transform. `data` holds `coded_width() * height` pixels on
    /// entry and `width * height` pixels on return.
    pub(crate) fn apply(&self, data: &mut Vec<u32>, height: u16) -> Result<(), DecodeError> {
        let width = usize::from(self.width);
        let height = usize::from(height);
        match &self.transform {
            TransformType::PredictorTransform {
                size_bits,
                predictor_data,
            } => apply_predictor_transform(data, width, height, *size_bits, predictor_data),
            TransformType::ColorTransform {
                size_bits,
                transform_data,
            } => {
                apply_color_transform(data, width, *size_bits, transform_data);
                Ok(())
            }
            TransformType::SubtractGreen => {
                apply_subtract_green_transform(data);
                Ok(())
            }
            TransformType::ColorIndexingTransform {
                table_size,
                table_data,
            } => {
                *data = apply_color_indexing_transform(
                    data,
                    width,
                    height,
                    color_indexing_width_bits(*table_size),
                    table_data,
                );
                Ok(())
            }
        }
    }
}

/// Adds two ARGB pixels channel by channel, each channel wrapping mod 256.
#[inline]
pub(crate) fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_and_green = (a & 0xff00_ff00).wrapping_add(b & 0xff00_ff00);
    let red_and_blue = (a & 0x00ff_00ff).wrapping_add(b & 0x00ff_00ff);
    (alpha_and_green & 0xff00_ff00) | (red_and_blue & 0x00ff_00ff)
}

#[inline]
fn channels(p: u32) -> [i32; 4] {
    [
        (p >> 24) as i32,
        ((p >> 16) & 0xff) as i32,
        ((p >> 8) & 0xff) as i32,
        (p & 0xff) as i32,
    ]
}

#[inline]
fn from_channels(c: [i32; 4]) -> u32 {
    ((c[0] as u32) << 24) | ((c[1] as u32) << 16) | ((c[2] as u32) << 8) | (c[3] as u32)
}

/// Per-channel floor average.
#[inline]
fn average2(a: u32, b: u32) -> u32 {
    (((a ^ b) & 0xfefe_fefe) >> 1) + (a & b)
}

#[inline]
fn clip255(v: i32) -> i32 {
    v.clamp(0, 255)
}

fn select(left: u32, top: u32, top_left: u32) -> u32 {
    let l = channels(left);
    let t = channels(top);
    let tl = channels(top_left);
    let mut distance = 0;
    for i in 0..4 {
        distance += (l[i] - tl[i]).abs() - (t[i] - tl[i]).abs();
    }
    if distance <= 0 {
        top
    } else {
        left
    }
}

fn clamp_add_subtract_full(left: u32, top: u32, top_left: u32) -> u32 {
    let l = channels(left);
    let t = channels(top);
    let tl = channels(top_left);
    from_channels(core::array::from_fn(|i| clip255(l[i] + t[i] - tl[i])))
}

fn clamp_add_subtract_half(left: u32, top: u32, top_left: u32) -> u32 {
    let avg = channels(average2(left, top));
    let tl = channels(top_left);
    from_channels(core::array::from_fn(|i| {
        clip255(avg[i] + (avg[i] - tl[i]) / 2)
    }))
}

/// Prediction for predictor modes 0..=13.
#[inline]
pub(crate) fn predict(mode: u8, left: u32, top: u32, top_left: u32, top_right: u32) -> u32 {
    match mode {
        0 => 0xff00_0000,
        1 => left,
        2 => top,
        3 => top_right,
        4 => top_left,
        5 => average2(average2(left, top_right), top),
        6 => average2(left, top_left),
        7 => average2(left, top),
        8 => average2(top_left, top),
        9 => average2(top, top_right),
        10 => average2(average2(left, top_left), average2(top, top_right)),
        11 => select(left, top, top_left),
        12 => clamp_add_subtract_full(left, top, top_left),
        _ => clamp_add_subtract_half(left, top, top_left),
    }
}

const MAX_PREDICTOR_MODE: u8 = 13;

fn apply_predictor_transform(
    data: &mut [u32],
    width: usize,
    height: usize,
    size_bits: u8,
    predictor_data: &[u32],
) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let block_xsize = usize::from(subsample_size(width as u16, size_bits));

    // (0, 0) predicts opaque black, the rest of row 0 predicts left.
    data[0] = add_pixels(data[0], 0xff00_0000);
    for x in 1..width {
        data[x] = add_pixels(data[x], data[x - 1]);
    }

    for y in 1..height {
        let row = y * width;
        // Column 0 predicts top.
        data[row] = add_pixels(data[row], data[row - width]);

        let block_row = (y >> size_bits) * block_xsize;
        for x in 1..width {
            let mode = ((predictor_data[block_row + (x >> size_bits)] >> 8) & 0xff) as u8;
            if mode > MAX_PREDICTOR_MODE {
                return Err(DecodeError::InvalidPredictorMode(mode));
            }
            let index = row + x;
            let left = data[index - 1];
            let top = data[index - width];
            let top_left = data[index - width - 1];
            // For the last column this is the first pixel of the current row.
            let top_right = data[index - width + 1];
            data[index] = add_pixels(data[index], predict(mode, left, top, top_left, top_right));
        }
    }
    Ok(())
}

#[inline]
fn color_transform_delta(t: u8, c: u8) -> i32 {
    (i32::from(t as i8) * i32::from(c as i8)) >> 5
}

fn apply_color_transform(data: &mut [u32], width: usize, size_bits: u8, transform_data: &[u32]) {
    if width == 0 {
        return;
    }
    let block_xsize = usize::from(subsample_size(width as u16, size_bits));
    for (y, row) in data.chunks_exact_mut(width).enumerate() {
        let block_row = (y >> size_bits) * block_xsize;
        for (x, pixel) in row.iter_mut().enumerate() {
            let multipliers = transform_data[block_row + (x >> size_bits)];
            let green_to_red = (multipliers & 0xff) as u8;
            let green_to_blue = ((multipliers >> 8) & 0xff) as u8;
            let red_to_blue = ((multipliers >> 16) & 0xff) as u8;

            let green = ((*pixel >> 8) & 0xff) as u8;
            let red = (((*pixel >> 16) & 0xff) as i32 + color_transform_delta(green_to_red, green))
                as u8;
            let blue = ((*pixel & 0xff) as i32
                + color_transform_delta(green_to_blue, green)
                + color_transform_delta(red_to_blue, red)) as u8;

            *pixel = (*pixel & 0xff00_ff00) | (u32::from(red) << 16) | u32::from(blue);
        }
    }
}

fn apply_subtract_green_transform(data: &mut [u32]) {
    for pixel in data.iter_mut() {
        let green = (*pixel >> 8) & 0xff;
        *pixel = add_pixels(*pixel, (green << 16) | green);
    }
}

fn apply_color_indexing_transform(
    data: &[u32],
    width: usize,
    height: usize,
    width_bits: u8,
    table_data: &[u32],
) -> Vec<u32> {
    let lookup = |index: u32| table_data.get(index as usize).copied().unwrap_or(0);

    if width_bits == 0 {
        return data.iter().map(|&p| lookup((p >> 8) & 0xff)).collect();
    }

    let bits_per_pixel = 8u32 >> width_bits;
    let index_mask = (1u32 << bits_per_pixel) - 1;
    let x_mask = (1usize << width_bits) - 1;
    let packed_width = usize::from(subsample_size(width as u16, width_bits));

    let mut out = vec![0u32; width * height];
    for (y, row) in out.chunks_exact_mut(width).enumerate() {
        let packed_row = &data[y * packed_width..][..packed_width];
        for (x, pixel) in row.iter_mut().enumerate() {
            let packed = (packed_row[x >> width_bits] >> 8) & 0xff;
            let shift = bits_per_pixel * (x & x_mask) as u32;
            *pixel = lookup((packed >> shift) & index_mask);
        }
    }
    out
}
