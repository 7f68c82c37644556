//! Mask-driven operations.
//!
//! - [`bounding_box`] - Tight box around mask pixels above a threshold
//! - [`crop_box_around_mask`] - Square, padded crop window centered on the object
//! - [`remove_background`] - Zero the image outside the object
//!
//! Masks are soft: a pixel belongs to the object when its value is strictly
//! greater than the threshold.

use crate::geometry::Window;
use crate::{OpsError, OpsResult};
use prep_core::{Image, Mask};
use tracing::{debug, trace};

/// Axis-aligned box with exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge (inclusive)
    pub x0: u32,
    /// Top edge (inclusive)
    pub y0: u32,
    /// Right edge (exclusive)
    pub x1: u32,
    /// Bottom edge (exclusive)
    pub y1: u32,
}

impl BoundingBox {
    /// Box width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Box height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// Center in continuous pixel coordinates.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x0 + self.x1) as f64 / 2.0,
            (self.y0 + self.y1) as f64 / 2.0,
        )
    }
}

/// Returns the tight bounding box of pixels whose value exceeds `threshold`.
///
/// Returns `None` for an empty mask.
///
/// # Example
///
/// ```rust
/// use prep_core::Mask;
/// use prep_ops::mask::bounding_box;
///
/// let mask = Mask::from_fn(8, 8, |x, y| vec![if (2..5).contains(&x) && y == 6 { 1.0 } else { 0.0 }]);
/// let bbox = bounding_box(&mask, 0.5).unwrap();
/// assert_eq!((bbox.x0, bbox.y0, bbox.x1, bbox.y1), (2, 6, 5, 7));
/// ```
pub fn bounding_box(mask: &Mask, threshold: f32) -> Option<BoundingBox> {
    let mut x0 = u32::MAX;
    let mut y0 = u32::MAX;
    let mut x1 = 0u32;
    let mut y1 = 0u32;

    for y in 0..mask.height() {
        for (x, v) in mask.row(y).iter().enumerate() {
            if *v > threshold {
                let x = x as u32;
                x0 = x0.min(x);
                y0 = y0.min(y);
                x1 = x1.max(x + 1);
                y1 = y1.max(y + 1);
            }
        }
    }

    if x0 == u32::MAX {
        None
    } else {
        Some(BoundingBox { x0, y0, x1, y1 })
    }
}

/// Computes a square crop window around the object.
///
/// The side is `max(bbox_w, bbox_h) * box_size_factor`, grown by
/// `padding_factor` of that size on every side and rounded to whole pixels.
/// The window is centered on the bounding box and may extend past the mask
/// bounds.
///
/// Returns `Ok(None)` when the mask is empty.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] if `box_size_factor <= 0` or
/// `padding_factor < 0`.
pub fn crop_box_around_mask(
    mask: &Mask,
    box_size_factor: f32,
    padding_factor: f32,
    threshold: f32,
) -> OpsResult<Option<Window>> {
    if !(box_size_factor > 0.0) {
        return Err(OpsError::InvalidParameter(format!(
            "box_size_factor must be > 0, got {box_size_factor}"
        )));
    }
    if !(padding_factor >= 0.0) {
        return Err(OpsError::InvalidParameter(format!(
            "padding_factor must be >= 0, got {padding_factor}"
        )));
    }

    let Some(bbox) = bounding_box(mask, threshold) else {
        debug!("Mask is empty, no crop box");
        return Ok(None);
    };

    let size = bbox.width().max(bbox.height()) as f64 * box_size_factor as f64;
    let side = (size * (1.0 + 2.0 * padding_factor as f64)).round().max(1.0);
    let (cx, cy) = bbox.center();
    let x = (cx - side / 2.0).floor() as i64;
    let y = (cy - side / 2.0).floor() as i64;

    let window = Window::new(x, y, side as u32, side as u32);
    trace!(?bbox, ?window, "mask::crop_box_around_mask");
    Ok(Some(window))
}

/// Zeroes image pixels that are not part of the object.
///
/// # Errors
///
/// Returns an alignment error if image and mask sizes differ.
///
/// # Example
///
/// ```rust
/// use prep_core::{Image, Mask};
/// use prep_ops::mask::remove_background;
///
/// let image = Image::filled(2, 1, &[1.0, 1.0, 1.0]);
/// let mask = Mask::from_data(2, 1, vec![1.0, 0.0]).unwrap();
/// let out = remove_background(&image, &mask, 0.5).unwrap();
/// assert_eq!(out.data(), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn remove_background(image: &Image, mask: &Mask, threshold: f32) -> OpsResult<Image> {
    image.ensure_aligned(mask)?;
    let mut out = image.clone();
    let membership = mask.data();
    for (px, m) in out.data_mut().chunks_exact_mut(3).zip(membership) {
        if !(*m > threshold) {
            px.fill(0.0);
        }
    }
    Ok(out)
}
