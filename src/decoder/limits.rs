//! Configurable limits for lossless WebP decoding.
//!
//! These limits protect against malicious or malformed inputs that could
//! cause excessive memory usage or processing time.

use super::api::DecodeError;

/// Rough size of one prefix code group: five 256-entry root tables of
/// 4-byte slots. Second-level tables are not counted.
pub(crate) const PREFIX_GROUP_BYTES: u64 = 5 * 256 * 4;

/// Resource ceilings checked before any pixel memory is allocated.
///
/// All limits are optional; `None` means unlimited.
///
/// # Example
///
/// ```rust
/// use zenwebp_lossless::Limits;
///
/// // Start with defaults and customize
/// let limits = Limits::default()
///     .max_dimensions(4096, 4096)
///     .max_memory(256 * 1024 * 1024);  // 256 MB
///
/// // Or start with no limits for trusted inputs
/// let unlimited = Limits::none();
/// # let _ = (limits, unlimited);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,

    /// Maximum image height in pixels.
    pub max_height: Option<u32>,

    /// Maximum total pixels (width * height).
    /// Useful for limiting memory even with odd aspect ratios.
    pub max_total_pixels: Option<u64>,

    /// Maximum input file size in bytes.
    pub max_file_size: Option<u64>,

    /// Maximum decoder memory in bytes: the ARGB buffer plus the prefix code
    /// tables.
    pub max_memory: Option<u64>,
}

impl Default for Limits {
    /// Default limits suitable for server-side use.
    ///
    /// - Max dimensions: 16384 x 16384 (VP8L format max)
    /// - Max total pixels: 100 megapixels
    /// - Max file size: 100 MB
    /// - Max memory: 1 GB
    fn default() -> Self {
        Self {
            max_width: Some(16384),
            max_height: Some(16384),
            max_total_pixels: Some(100_000_000),
            max_file_size: Some(100 * 1024 * 1024),
            max_memory: Some(1024 * 1024 * 1024),
        }
    }
}

impl Limits {
    /// Create limits with no restrictions.
    ///
    /// **Warning**: Only use this for trusted inputs!
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_total_pixels: None,
            max_file_size: None,
            max_memory: None,
        }
    }

    /// Set maximum dimensions.
    #[must_use]
    pub fn max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Set maximum total pixels.
    #[must_use]
    pub fn max_total_pixels(mut self, pixels: u64) -> Self {
        self.max_total_pixels = Some(pixels);
        self
    }

    /// Set maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set maximum memory usage in bytes.
    #[must_use]
    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Check if dimensions are within limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if let Some(max_w) = self.max_width {
            if width > max_w {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }

        if let Some(max_h) = self.max_height {
            if height > max_h {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }

        let total_pixels = u64::from(width) * u64::from(height);
        if let Some(max_pixels) = self.max_total_pixels {
            if total_pixels > max_pixels {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "total pixels {total_pixels} exceeds limit {max_pixels}"
                )));
            }
        }

        Ok(())
    }

    /// Check if file size is within limits.
    pub fn check_file_size(&self, size: u64) -> Result<(), DecodeError> {
        if let Some(max) = self.max_file_size {
            if size > max {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "file size {size} bytes exceeds limit {max} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Check if memory usage is within limits.
    pub fn check_memory(&self, bytes: u64) -> Result<(), DecodeError> {
        if let Some(max) = self.max_memory {
            if bytes > max {
                return Err(DecodeError::MemoryLimitExceeded);
            }
        }
        Ok(())
    }

    /// Runs the dimension and memory checks for a `width` x `height` ARGB
    /// image.
    pub(crate) fn check_image(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        self.check_dimensions(width, height)?;
        self.check_memory(u64::from(width) * u64::from(height) * 4)
    }

    /// Memory check for a `width` x `height` entropy coded image that
    /// declares `groups` prefix code groups.
    pub(crate) fn check_prefix_groups(
        &self,
        width: u16,
        height: u16,
        groups: u32,
    ) -> Result<(), DecodeError> {
        let pixels = u64::from(width) * u64::from(height) * 4;
        self.check_memory(pixels + u64::from(groups) * PREFIX_GROUP_BYTES)
    }
}
