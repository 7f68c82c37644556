//! Pipeline orchestrator.
//!
//! [`Preprocessor::process`] runs a fixed stage order. The order affects
//! numerical results and must not change:
//!
//! ```text
//! 1. normalize pointmap against the input mask      (crop normalizer)
//! 2. rgb joint pre-transform on image/mask          (full-resolution branch)
//! 3. joint selector: triple | dual | identity       (cropped branch)
//! 4. image/mask/pointmap slots on the cropped branch
//! 5. image/mask slots on the full-resolution branch
//! 6. normalize the INPUT pointmap against rgb_image_mask
//!    (rgb normalizer, step 1 params unless RgbStatistics::Recompute)
//! 7. pointmap slot on rgb_pointmap
//! ```
//!
//! Inputs are validated once up front: the mask, and the pointmap when
//! given, must match the image dimensions.
//!
//! # Example
//!
//! ```rust
//! use prep_core::{Image, Mask};
//! use prep_pipeline::{Preprocessor, PreprocessorConfig};
//!
//! let pre = Preprocessor::new(PreprocessorConfig::builder().normalize_pointmap(true).build());
//! let out = pre.process(Image::filled(8, 8, &[1.0; 3]), Mask::filled(8, 8, &[1.0]), None).unwrap();
//!
//! assert_eq!(out.keys(), ["mask", "image", "rgb_image", "rgb_image_mask"]);
//! ```

use crate::config::{PreprocessorConfig, RgbStatistics, DEPRECATION_TARGET};
use crate::normalizer::normalize_optional;
use crate::output::PreprocessOutput;
use crate::selector::JointSelector;
use crate::PipelineResult;
use prep_core::{Image, Mask, Pointmap};
use tracing::{debug, warn};

/// Runs the preprocessing stages over an immutable configuration.
///
/// `Preprocessor` is `Send + Sync`; one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessorConfig,
}

impl Preprocessor {
    /// Creates a preprocessor.
    pub fn new(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Processes one `(image, mask, pointmap?)` triple.
    ///
    /// # Errors
    ///
    /// - misaligned inputs (before any stage runs)
    /// - any transform failure, including arity mismatches
    /// - normalizer failures
    pub fn process(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Option<Pointmap>,
    ) -> PipelineResult<PreprocessOutput> {
        image.ensure_aligned(&mask)?;
        if let Some(pm) = &pointmap {
            image.ensure_aligned(pm)?;
        }

        let cfg = &self.config;
        let mode = cfg.normalization_mode();
        debug!(
            width = image.width(),
            height = image.height(),
            has_pointmap = pointmap.is_some(),
            ?mode,
            "Preprocessing"
        );

        // 1. crop-branch normalization against the untouched mask
        let (pointmap_for_crop, crop_params) = normalize_optional(
            cfg.pointmap_normalizer(),
            pointmap.as_ref(),
            &mask,
            None,
            mode,
        )?;

        // 2. full-resolution joint pre-transform
        let (image, mask) = cfg.rgb_joint_slot().apply_dual(image, mask)?;

        // 3. cropped branch joint transforms
        let joint = JointSelector::new(cfg.triple_joint_slot(), cfg.dual_joint_slot()).apply(
            image.clone(),
            mask.clone(),
            pointmap_for_crop,
        )?;
        debug!(path = ?joint.path, "Joint transforms done");

        // 4. per-modality slots on the cropped branch
        let processed_image = cfg.image_slot().apply(joint.image)?;
        let processed_mask = cfg.mask_slot().apply(joint.mask)?;
        let processed_pointmap = joint
            .pointmap
            .map(|pm| cfg.pointmap_slot().apply(pm))
            .transpose()?;

        // 5. per-modality slots on the full-resolution branch
        let rgb_image = cfg.image_slot().apply(image)?;
        let rgb_image_mask = cfg.mask_slot().apply(mask)?;

        // 6. full-resolution normalization of the input pointmap
        let supplied = match cfg.rgb_statistics() {
            RgbStatistics::ReuseCrop => crop_params,
            RgbStatistics::Recompute => None,
        };
        let (rgb_pointmap, rgb_params) = normalize_optional(
            cfg.rgb_pointmap_normalizer(),
            pointmap.as_ref(),
            &rgb_image_mask,
            supplied,
            mode,
        )?;

        // 7. pointmap slot on the full-resolution branch
        let rgb_pointmap = rgb_pointmap
            .map(|pm| cfg.pointmap_slot().apply(pm))
            .transpose()?;

        Ok(
            PreprocessOutput::new(processed_image, processed_mask, rgb_image, rgb_image_mask)
                .with_pointmaps(processed_pointmap, rgb_pointmap)
                .with_params(crop_params, rgb_params),
        )
    }

    /// [`process`](Self::process) without a pointmap.
    pub fn process_image_and_mask(
        &self,
        image: Image,
        mask: Mask,
    ) -> PipelineResult<PreprocessOutput> {
        self.process(image, mask, None)
    }

    /// Runs only the joint selector with no pointmap, i.e. the dual slot
    /// when configured.
    pub fn preprocess_image_and_mask(
        &self,
        image: Image,
        mask: Mask,
    ) -> PipelineResult<(Image, Mask)> {
        image.ensure_aligned(&mask)?;
        let out = JointSelector::new(self.config.triple_joint_slot(), self.config.dual_joint_slot())
            .apply(image, mask, None)?;
        Ok((out.image, out.mask))
    }

    /// Old name of [`preprocess_image_and_mask`](Self::preprocess_image_and_mask).
    #[deprecated(since = "0.1.0", note = "use preprocess_image_and_mask")]
    pub fn preprocess_image_and_mask_inference(
        &self,
        image: Image,
        mask: Mask,
    ) -> PipelineResult<(Image, Mask)> {
        warn!(
            target: DEPRECATION_TARGET,
            "preprocess_image_and_mask_inference is deprecated, use preprocess_image_and_mask"
        );
        self.preprocess_image_and_mask(image, mask)
    }

    /// Runs only the full-resolution joint pre-transform.
    pub fn preprocess_rgb_image_mask(
        &self,
        image: Image,
        mask: Mask,
    ) -> PipelineResult<(Image, Mask)> {
        image.ensure_aligned(&mask)?;
        self.config.rgb_joint_slot().apply_dual(image, mask)
    }
}

impl From<PreprocessorConfig> for Preprocessor {
    fn from(config: PreprocessorConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::SsiNormalizer;
    use crate::transform::{dual_fn, raster_fn, triple_fn};
    use crate::PipelineError;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    fn ones(w: u32, h: u32) -> (Image, Mask) {
        (Image::filled(w, h, &[1.0; 3]), Mask::filled(w, h, &[1.0]))
    }

    fn ramp(w: u32, h: u32) -> Pointmap {
        Pointmap::from_fn(w, h, |x, y| vec![x as f32, y as f32, 5.0])
    }

    #[test]
    fn test_rejects_misaligned_inputs() {
        let pre = Preprocessor::new(PreprocessorConfig::builder().normalize_pointmap(true).build());
        let err = pre
            .process(Image::new(4, 4), Mask::new(4, 3), None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Core(ref e) if e.is_alignment_error()));

        let (image, mask) = ones(4, 4);
        assert!(pre.process(image, mask, Some(Pointmap::new(2, 2))).is_err());
    }

    #[test]
    fn test_stage_order() {
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let rec = |name: &'static str| {
            let log = Arc::clone(&log);
            move || log.lock().unwrap().push(name)
        };

        let (r1, r2, r3, r4, r5) = (rec("rgb"), rec("triple"), rec("img"), rec("mask"), rec("pm"));
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .rgb_joint_transforms(vec![dual_fn("rgb", move |i, m| {
                r1();
                Ok((i, m))
            })])
            .triple_joint_transforms(vec![triple_fn("triple", move |i, m, p| {
                r2();
                Ok((i, m, p))
            })])
            .image_transforms(vec![raster_fn("img", move |i| {
                r3();
                Ok(i)
            })])
            .mask_transforms(vec![raster_fn("mask", move |m| {
                r4();
                Ok(m)
            })])
            .pointmap_transforms(vec![raster_fn("pm", move |p| {
                r5();
                Ok(p)
            })])
            .build();

        let (image, mask) = ones(4, 4);
        Preprocessor::new(config)
            .process(image, mask, Some(ramp(4, 4)))
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["rgb", "triple", "img", "mask", "pm", "img", "mask", "pm"]
        );
    }

    #[test]
    fn test_rgb_pretransform_feeds_both_branches() {
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .rgb_joint_transforms(vec![dual_fn("halve", |mut i: Image, m| {
                i.map_pixels(|px| px.iter_mut().for_each(|v| *v *= 0.5));
                Ok((i, m))
            })])
            .build();
        let (image, mask) = ones(2, 2);
        let out = Preprocessor::new(config).process(image, mask, None).unwrap();
        assert_eq!(out.image.pixel(0, 0), &[0.5; 3]);
        assert_eq!(out.rgb_image.pixel(1, 1), &[0.5; 3]);
    }

    #[test]
    fn test_crop_stats_use_untransformed_mask() {
        // The rgb pre-transform empties the mask; crop statistics still come
        // from the input mask, and the rgb branch reuses them.
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .rgb_joint_transforms(vec![dual_fn("clear", |i: Image, _m: Mask| {
                let mask = Mask::new(i.width(), i.height());
                Ok((i, mask))
            })])
            .build();
        let (image, mask) = ones(4, 4);
        let out = Preprocessor::new(config)
            .process(image, mask, Some(ramp(4, 4)))
            .unwrap();
        let crop = out.pointmap_params.unwrap();
        assert_ne!(crop, prep_core::NormalizationParams::identity());
        assert_eq!(out.rgb_pointmap_params, Some(crop));
    }

    fn left_half_mask() -> crate::transform::SharedJointTransform {
        dual_fn("left-half", |i: Image, _m: Mask| {
            let mask = Mask::from_fn(i.width(), i.height(), |x, _| {
                vec![if x < 2 { 1.0 } else { 0.0 }]
            });
            Ok((i, mask))
        })
    }

    #[test]
    fn test_recompute_uses_rgb_mask() {
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .rgb_pointmap_normalizer(Arc::new(SsiNormalizer::default()))
            .rgb_statistics(RgbStatistics::Recompute)
            .rgb_joint_transforms(vec![left_half_mask()])
            .build();
        let (image, mask) = ones(4, 4);
        let out = Preprocessor::new(config)
            .process(image, mask, Some(ramp(4, 4)))
            .unwrap();
        let crop = out.pointmap_params.unwrap();
        let rgb = out.rgb_pointmap_params.unwrap();
        assert_ne!(crop.shift, rgb.shift);
        assert_relative_eq!(rgb.shift.x, 0.0);
    }

    #[test]
    fn test_recompute_with_shared_normalizer_reuses_crop() {
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .rgb_statistics(RgbStatistics::Recompute)
            .rgb_joint_transforms(vec![left_half_mask()])
            .build();
        let (image, mask) = ones(4, 4);
        let out = Preprocessor::new(config)
            .process(image, mask, Some(ramp(4, 4)))
            .unwrap();
        assert!(out.pointmap_params.is_some());
        assert_eq!(out.rgb_pointmap_params, out.pointmap_params);
    }

    #[test]
    fn test_legacy_mode_returns_raw_pointmap() {
        let config = PreprocessorConfig::builder().build();
        let (image, mask) = ones(4, 4);
        let pm = ramp(4, 4);
        let out = Preprocessor::new(config)
            .process(image, mask, Some(pm.clone()))
            .unwrap();
        assert_eq!(out.pointmap.as_ref(), Some(&pm));
        assert_eq!(out.rgb_pointmap.as_ref(), Some(&pm));
        assert!(out.pointmap_params.is_some());
        assert_eq!(out.pointmap_params, out.rgb_pointmap_params);
    }

    #[test]
    fn test_compat_entry_points() {
        let config = PreprocessorConfig::builder()
            .normalize_pointmap(true)
            .triple_joint_transforms(vec![triple_fn("never", |_, _, _| {
                Err(PipelineError::transform("never", "triple path must not run"))
            })])
            .dual_joint_transforms(vec![dual_fn("flip", |i, mut m: Mask| {
                m.map_pixels(|px| px[0] = 1.0 - px[0]);
                Ok((i, m))
            })])
            .rgb_joint_transforms(vec![dual_fn("blank", |_i: Image, m: Mask| {
                Ok((Image::new(m.width(), m.height()), m))
            })])
            .build();
        let pre = Preprocessor::new(config);

        let (image, mask) = ones(2, 2);
        let (_, m) = pre.preprocess_image_and_mask(image.clone(), mask.clone()).unwrap();
        assert_eq!(m.pixel(0, 0), &[0.0]);

        #[allow(deprecated)]
        let (_, m) = pre
            .preprocess_image_and_mask_inference(image.clone(), mask.clone())
            .unwrap();
        assert_eq!(m.pixel(1, 1), &[0.0]);

        let (i, _) = pre.preprocess_rgb_image_mask(image.clone(), mask.clone()).unwrap();
        assert_eq!(i.pixel(0, 0), &[0.0; 3]);

        let out = pre.process_image_and_mask(image, mask).unwrap();
        assert!(!out.has_pointmap());
    }
}
