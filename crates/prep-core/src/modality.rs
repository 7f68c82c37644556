//! Modality markers for compile-time raster safety.
//!
//! Each input the pipeline handles is tagged with a zero-sized marker type
//! implementing [`Modality`]:
//!
//! - [`Rgb`] - Color samples, 3 channels
//! - [`Matte`] - Object membership, 1 channel (not necessarily binary)
//! - [`Xyz`] - Per-pixel 3D coordinates, 3 channels
//!
//! ```
//! use prep_core::prelude::*;
//!
//! fn describe<M: Modality>(r: &Raster<M>) -> String {
//!     format!("{} {}x{}x{}", M::NAME, M::CHANNELS, r.height(), r.width())
//! }
//!
//! let mask = Mask::filled(8, 8, &[1.0]);
//! assert_eq!(describe(&mask), "mask 1x8x8");
//! ```

use std::fmt;

/// Trait for modality marker types.
pub trait Modality: Copy + Clone + Default + Send + Sync + fmt::Debug + 'static {
    /// Human-readable name, used in logs and errors.
    const NAME: &'static str;

    /// Number of interleaved channels per pixel.
    const CHANNELS: usize;

    /// Whether samples may be interpolated across neighbours.
    ///
    /// Masks and pointmaps carry discontinuities (object edges, depth jumps)
    /// and must be resampled with nearest-neighbour.
    const INTERPOLABLE: bool;

    /// Sample written where a geometric op reaches outside the source.
    ///
    /// Pointmaps use NaN so padded pixels never count as valid geometry.
    const FILL: f32;
}

/// RGB color samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb;

impl Modality for Rgb {
    const NAME: &'static str = "image";
    const CHANNELS: usize = 3;
    const INTERPOLABLE: bool = true;
    const FILL: f32 = 0.0;
}

/// Single-channel object membership.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Matte;

impl Modality for Matte {
    const NAME: &'static str = "mask";
    const CHANNELS: usize = 1;
    const INTERPOLABLE: bool = false;
    const FILL: f32 = 0.0;
}

/// Per-pixel 3D coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Xyz;

impl Modality for Xyz {
    const NAME: &'static str = "pointmap";
    const CHANNELS: usize = 3;
    const INTERPOLABLE: bool = false;
    const FILL: f32 = f32::NAN;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_counts() {
        assert_eq!(Rgb::CHANNELS, 3);
        assert_eq!(Matte::CHANNELS, 1);
        assert_eq!(Xyz::CHANNELS, 3);
    }

    #[test]
    fn test_interpolable() {
        assert!(Rgb::INTERPOLABLE);
        assert!(!Matte::INTERPOLABLE);
        assert!(!Xyz::INTERPOLABLE);
    }

    #[test]
    fn test_pointmap_fill_is_invalid() {
        assert!(Xyz::FILL.is_nan());
        assert_eq!(Matte::FILL, 0.0);
    }
}
