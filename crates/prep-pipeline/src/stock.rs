//! Stock transforms built on `prep-ops`.
//!
//! | Transform | Kind | Arity |
//! |-----------|------|-------|
//! | [`PadToSquare`] | per-modality | - |
//! | [`ResizeShortSide`] | per-modality | - |
//! | [`CropAroundMask`] | joint | dual, triple |
//! | [`RemoveBackground`] | joint | dual, triple |
//!
//! Per-modality transforms are generic over the modality; masks and
//! pointmaps are resampled with nearest-neighbour whatever filter is set.

use crate::transform::{Arity, JointTransform, RasterTransform};
use crate::PipelineResult;
use prep_core::{Image, Mask, Modality, Pointmap, Raster};
use prep_ops::geometry::{crop_window, pad_to_square_centered};
use prep_ops::mask::{crop_box_around_mask, remove_background};
use prep_ops::resize::resize_short_side;
use prep_ops::{Filter, Window};
use tracing::debug;

/// Pads to a square, centering the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PadToSquare;

impl<M: Modality> RasterTransform<M> for PadToSquare {
    fn name(&self) -> &str {
        "pad_to_square"
    }

    fn apply(&self, input: Raster<M>) -> PipelineResult<Raster<M>> {
        Ok(pad_to_square_centered(&input)?)
    }
}

/// Resizes so the shorter side equals `size`.
#[derive(Debug, Clone, Copy)]
pub struct ResizeShortSide {
    /// Target length of the shorter side.
    pub size: u32,
    /// Filter for interpolable modalities.
    pub filter: Filter,
}

impl ResizeShortSide {
    /// Creates a resize transform.
    pub fn new(size: u32, filter: Filter) -> Self {
        Self { size, filter }
    }
}

impl<M: Modality> RasterTransform<M> for ResizeShortSide {
    fn name(&self) -> &str {
        "resize_short_side"
    }

    fn apply(&self, input: Raster<M>) -> PipelineResult<Raster<M>> {
        Ok(resize_short_side(&input, self.size, self.filter)?)
    }
}

/// Crops a square window around the object in the mask.
///
/// The window is `max(bbox) * box_size_factor`, grown by `padding_factor`
/// on each side. Samples outside the input are filled per modality (zero for
/// image and mask, NaN for pointmap). An empty mask leaves inputs untouched.
#[derive(Debug, Clone, Copy)]
pub struct CropAroundMask {
    /// Bounding box multiplier.
    pub box_size_factor: f32,
    /// Extra margin per side, relative to the scaled box.
    pub padding_factor: f32,
    /// Mask membership threshold.
    pub threshold: f32,
}

impl Default for CropAroundMask {
    fn default() -> Self {
        Self {
            box_size_factor: 1.0,
            padding_factor: 0.1,
            threshold: 0.5,
        }
    }
}

impl CropAroundMask {
    fn window(&self, mask: &Mask) -> PipelineResult<Option<Window>> {
        let window = crop_box_around_mask(
            mask,
            self.box_size_factor,
            self.padding_factor,
            self.threshold,
        )?;
        if window.is_none() {
            debug!("Empty mask, skipping crop");
        }
        Ok(window)
    }
}

impl JointTransform for CropAroundMask {
    fn name(&self) -> &str {
        "crop_around_mask"
    }

    fn accepts(&self, _arity: Arity) -> bool {
        true
    }

    fn apply_dual(&self, image: Image, mask: Mask) -> PipelineResult<(Image, Mask)> {
        image.ensure_aligned(&mask)?;
        match self.window(&mask)? {
            Some(w) => Ok((crop_window(&image, w)?, crop_window(&mask, w)?)),
            None => Ok((image, mask)),
        }
    }

    fn apply_triple(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Pointmap,
    ) -> PipelineResult<(Image, Mask, Pointmap)> {
        image.ensure_aligned(&pointmap)?;
        let (cropped_image, cropped_mask) = self.apply_dual(image, mask.clone())?;
        match self.window(&mask)? {
            Some(w) => Ok((cropped_image, cropped_mask, crop_window(&pointmap, w)?)),
            None => Ok((cropped_image, cropped_mask, pointmap)),
        }
    }
}

/// Zeroes image pixels outside the mask. Mask and pointmap pass through.
#[derive(Debug, Clone, Copy)]
pub struct RemoveBackground {
    /// Mask membership threshold.
    pub threshold: f32,
}

impl Default for RemoveBackground {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl JointTransform for RemoveBackground {
    fn name(&self) -> &str {
        "remove_background"
    }

    fn accepts(&self, _arity: Arity) -> bool {
        true
    }

    fn apply_dual(&self, image: Image, mask: Mask) -> PipelineResult<(Image, Mask)> {
        let image = remove_background(&image, &mask, self.threshold)?;
        Ok((image, mask))
    }

    fn apply_triple(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Pointmap,
    ) -> PipelineResult<(Image, Mask, Pointmap)> {
        let (image, mask) = self.apply_dual(image, mask)?;
        Ok((image, mask, pointmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Mask {
        Mask::from_fn(w, h, |x, y| {
            vec![if x >= x0 && x < x1 && y >= y0 && y < y1 { 1.0 } else { 0.0 }]
        })
    }

    #[test]
    fn test_pad_then_resize() {
        let mask = Mask::filled(6, 3, &[1.0]);
        let padded = RasterTransform::<prep_core::Matte>::apply(&PadToSquare, mask).unwrap();
        assert_eq!(padded.dimensions(), (6, 6));
        let resized = ResizeShortSide::new(12, Filter::Bicubic).apply(padded).unwrap();
        assert_eq!(resized.dimensions(), (12, 12));
        // Nearest for masks: only 0 and 1 survive
        assert!(resized.data().iter().all(|v| *v == 0.0 || *v == 1.0));
    }

    #[test]
    fn test_crop_keeps_modalities_aligned() {
        let mask = blob(20, 20, 5, 5, 15, 15);
        let image = Image::filled(20, 20, &[1.0; 3]);
        let pm = Pointmap::filled(20, 20, &[0.0, 0.0, 1.0]);
        let (i, m, p) = CropAroundMask::default().apply_triple(image, mask, pm).unwrap();
        // 10px box grown by 10% per side
        assert_eq!(i.dimensions(), (12, 12));
        assert_eq!(m.dimensions(), i.dimensions());
        assert_eq!(p.dimensions(), i.dimensions());
        assert_eq!(m.pixel(6, 6), &[1.0]);
        assert_eq!(m.pixel(0, 0), &[0.0]);
    }

    #[test]
    fn test_crop_out_of_bounds_fill() {
        let mask = blob(10, 10, 0, 0, 4, 4);
        let pm = Pointmap::filled(10, 10, &[1.0, 1.0, 1.0]);
        let crop = CropAroundMask {
            padding_factor: 0.5,
            ..Default::default()
        };
        let (_, _, p) = crop.apply_triple(Image::new(10, 10), mask, pm).unwrap();
        assert!(p.pixel(0, 0)[0].is_nan());
    }

    #[test]
    fn test_crop_empty_mask_passes_through() {
        let image = Image::filled(4, 4, &[0.3; 3]);
        let (i, _) = CropAroundMask::default()
            .apply_dual(image.clone(), Mask::new(4, 4))
            .unwrap();
        assert!(i.shares_buffer(&image));
    }

    #[test]
    fn test_remove_background_triple() {
        let mask = blob(2, 1, 0, 0, 1, 1);
        let pm = Pointmap::filled(2, 1, &[1.0, 2.0, 3.0]);
        let (i, _, p) = RemoveBackground::default()
            .apply_triple(Image::filled(2, 1, &[1.0; 3]), mask, pm.clone())
            .unwrap();
        assert_eq!(i.pixel(1, 0), &[0.0; 3]);
        assert_eq!(i.pixel(0, 0), &[1.0; 3]);
        assert!(p.shares_buffer(&pm));
    }
}
