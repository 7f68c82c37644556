//! Error types for prep-core operations.
//!
//! The [`Error`] enum covers the failure modes of raster construction and
//! alignment checks:
//! - Buffer length vs. declared dimensions
//! - Spatial alignment between image, mask and pointmap
//! - Channel count mismatches
//!
//! # Usage
//!
//! ```rust
//! use prep_core::{Error, Result};
//!
//! fn check_aligned(a: (u32, u32), b: (u32, u32)) -> Result<()> {
//!     if a != b {
//!         return Err(Error::dimension_mismatch(a, b));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or aligning rasters.
///
/// # Categories
///
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Format errors**: [`ChannelMismatch`](Error::ChannelMismatch)
#[derive(Debug, Error)]
pub enum Error {
    /// Two rasters that must be aligned have different sizes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use prep_core::Error;
    ///
    /// let err = Error::dimension_mismatch((64, 64), (32, 32));
    /// assert!(err.to_string().contains("64x64"));
    /// ```
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First raster width
        a_width: u32,
        /// First raster height
        a_height: u32,
        /// Second raster width
        b_width: u32,
        /// Second raster height
        b_height: u32,
    },

    /// Buffer length does not match `width * height * channels`, or a
    /// dimension would overflow.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Channel count doesn't match the modality.
    #[error("channel mismatch for {modality}: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Modality name
        modality: &'static str,
        /// Expected channel count
        expected: usize,
        /// Actual channel count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(modality: &'static str, expected: usize, got: usize) -> Self {
        Self::ChannelMismatch {
            modality,
            expected,
            got,
        }
    }

    /// Returns `true` if this is a spatial alignment error.
    #[inline]
    pub fn is_alignment_error(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 200));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x200"));
        assert!(err.is_alignment_error());
    }

    #[test]
    fn test_channel_mismatch() {
        let err = Error::channel_mismatch("mask", 1, 3);
        let msg = err.to_string();
        assert!(msg.contains("mask"));
        assert!(msg.contains("expected 1, got 3"));
        assert!(!err.is_alignment_error());
    }
}
