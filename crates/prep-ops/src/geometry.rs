//! Geometric raster operations.
//!
//! # Operations
//!
//! - [`crop`] - Extract a region fully inside the raster
//! - [`crop_window`] - Extract a [`Window`] that may reach past the edges
//! - [`pad`] - Add border padding
//! - [`pad_to_square_centered`] - Pad the short side so the raster is square
//!
//! Samples outside the source are filled with the modality's
//! [`FILL`](prep_core::Modality::FILL) value: zero for image and mask, NaN for
//! pointmaps.
//!
//! # Example
//!
//! ```rust
//! use prep_core::Pointmap;
//! use prep_ops::geometry::{crop_window, Window};
//!
//! let pm = Pointmap::filled(4, 4, &[0.0, 0.0, 1.0]);
//! let out = crop_window(&pm, Window::new(-1, -1, 3, 3)).unwrap();
//! assert!(out.pixel(0, 0)[2].is_nan());
//! assert_eq!(out.pixel(1, 1), &[0.0, 0.0, 1.0]);
//! ```

use crate::{OpsError, OpsResult};
use prep_core::{Modality, Raster};
use tracing::trace;

/// Rectangular region with a signed origin.
///
/// The origin may be negative and the extent may pass the raster bounds;
/// [`crop_window`] pads the uncovered part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Window {
    /// Creates a window.
    #[inline]
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the window lies inside a `width` x `height` raster.
    #[inline]
    pub fn is_inside(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i64 <= width as i64
            && self.y + self.height as i64 <= height as i64
    }
}

/// Crops a region fully contained in the raster.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`] if the region exceeds the bounds.
///
/// # Example
///
/// ```rust
/// use prep_core::Image;
/// use prep_ops::geometry::crop;
///
/// let img = Image::filled(64, 64, &[0.5, 0.5, 0.5]);
/// let cropped = crop(&img, 10, 10, 20, 20).unwrap();
/// assert_eq!(cropped.dimensions(), (20, 20));
/// ```
pub fn crop<M: Modality>(
    raster: &Raster<M>,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) -> OpsResult<Raster<M>> {
    let window = Window::new(x as i64, y as i64, w, h);
    if !window.is_inside(raster.width(), raster.height()) {
        return Err(OpsError::InvalidDimensions(format!(
            "crop region {}x{} at ({},{}) exceeds {}x{}",
            w,
            h,
            x,
            y,
            raster.width(),
            raster.height()
        )));
    }
    crop_window(raster, window)
}

/// Crops `window` out of the raster, filling uncovered samples.
pub fn crop_window<M: Modality>(raster: &Raster<M>, window: Window) -> OpsResult<Raster<M>> {
    trace!(modality = M::NAME, ?window, "geometry::crop_window");
    let channels = M::CHANNELS;
    let src = raster.data();
    let src_w = raster.width() as i64;
    let src_h = raster.height() as i64;
    let dst_w = window.width as usize;
    let mut dst = vec![M::FILL; dst_w * window.height as usize * channels];

    // Horizontal overlap is the same for every row
    let x0 = window.x.max(0);
    let x1 = (window.x + window.width as i64).min(src_w);

    if x0 < x1 {
        let span = (x1 - x0) as usize * channels;
        let dst_col = (x0 - window.x) as usize;
        for row in 0..window.height as i64 {
            let sy = window.y + row;
            if sy < 0 || sy >= src_h {
                continue;
            }
            let src_start = (sy * src_w + x0) as usize * channels;
            let dst_start = (row as usize * dst_w + dst_col) * channels;
            dst[dst_start..dst_start + span].copy_from_slice(&src[src_start..src_start + span]);
        }
    }

    Ok(Raster::from_data(window.width, window.height, dst)?)
}

/// Adds a border around the raster.
///
/// # Example
///
/// ```rust
/// use prep_core::Mask;
/// use prep_ops::geometry::pad;
///
/// let mask = Mask::filled(4, 4, &[1.0]);
/// let padded = pad(&mask, 1, 2, 1, 2).unwrap();
/// assert_eq!(padded.dimensions(), (8, 6));
/// assert_eq!(padded.pixel(0, 0), &[0.0]);
/// ```
pub fn pad<M: Modality>(
    raster: &Raster<M>,
    top: u32,
    right: u32,
    bottom: u32,
    left: u32,
) -> OpsResult<Raster<M>> {
    let window = Window::new(
        -(left as i64),
        -(top as i64),
        raster.width() + left + right,
        raster.height() + top + bottom,
    );
    crop_window(raster, window)
}

/// Pads the shorter side so the raster becomes square, keeping it centered.
///
/// When the difference is odd the extra pixel goes to the bottom/right.
pub fn pad_to_square_centered<M: Modality>(raster: &Raster<M>) -> OpsResult<Raster<M>> {
    let (w, h) = raster.dimensions();
    if w == h {
        return Ok(raster.clone());
    }
    let side = w.max(h);
    let left = (side - w) / 2;
    let top = (side - h) / 2;
    pad(raster, top, side - w - left, side - h - top, left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::{Image, Mask, Pointmap};

    fn gradient(w: u32, h: u32) -> Mask {
        Mask::from_fn(w, h, |x, y| vec![(y * w + x) as f32])
    }

    #[test]
    fn test_crop() {
        let src = gradient(4, 4);
        let out = crop(&src, 1, 1, 2, 2).unwrap();
        assert_eq!(out.data(), &[5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let src = gradient(4, 4);
        assert!(crop(&src, 3, 3, 2, 2).is_err());
    }

    #[test]
    fn test_crop_window_partially_outside() {
        let src = gradient(3, 3);
        let out = crop_window(&src, Window::new(2, -1, 2, 2)).unwrap();
        // Row -1 is outside, column 3 is outside
        assert_eq!(out.data(), &[0.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_crop_window_fully_outside() {
        let src = Pointmap::filled(3, 3, &[1.0, 1.0, 1.0]);
        let out = crop_window(&src, Window::new(10, 10, 2, 2)).unwrap();
        assert!(out.data().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_pad() {
        let src = Image::filled(2, 2, &[1.0, 1.0, 1.0]);
        let out = pad(&src, 1, 1, 1, 1).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.pixel(0, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(out.pixel(1, 1), &[1.0, 1.0, 1.0]);
        assert_eq!(out.pixel(3, 3), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pad_to_square_centered() {
        let src = Mask::filled(6, 3, &[1.0]);
        let out = pad_to_square_centered(&src).unwrap();
        assert_eq!(out.dimensions(), (6, 6));
        // One row on top, two at the bottom
        assert_eq!(out.pixel(0, 0), &[0.0]);
        assert_eq!(out.pixel(0, 1), &[1.0]);
        assert_eq!(out.pixel(0, 3), &[1.0]);
        assert_eq!(out.pixel(0, 4), &[0.0]);
    }

    #[test]
    fn test_pad_to_square_noop() {
        let src = Mask::filled(5, 5, &[1.0]);
        assert!(pad_to_square_centered(&src).unwrap().shares_buffer(&src));
    }
}
