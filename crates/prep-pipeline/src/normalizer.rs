//! Pointmap normalization.
//!
//! A [`PointmapNormalizer`] turns raw pointmap coordinates into the
//! canonical range the reconstruction model expects, using statistics taken
//! only from pixels the mask marks as the object.
//!
//! ```text
//! normalize(pointmap, mask, params?) -> (normalized, params)
//!
//!   params supplied  -> applied as-is, nothing recomputed
//!   params absent    -> computed from masked, finite points
//! ```
//!
//! The pipeline-level entry point, [`normalize_optional`], also handles an
//! absent pointmap (pure pass-through) and the legacy
//! [`NormalizationMode::StatisticsOnly`] mode, where parameters are computed
//! and returned but the pointmap itself is left untouched.
//!
//! # Default normalizer
//!
//! [`SsiNormalizer`] is scale/shift invariant:
//! - shift = per-axis median of valid points
//! - scale = mean distance of valid points from the shift (one scalar)
//!
//! ```rust
//! use prep_core::{Mask, Pointmap};
//! use prep_pipeline::normalizer::{PointmapNormalizer, SsiNormalizer};
//!
//! let pm = Pointmap::from_data(2, 1, vec![0.0, 0.0, 1.0, 0.0, 0.0, 3.0]).unwrap();
//! let mask = Mask::filled(2, 1, &[1.0]);
//! let (normalized, params) = SsiNormalizer::default().normalize(&pm, &mask, None).unwrap();
//!
//! assert_eq!(params.shift.z, 1.0); // lower median
//! assert_eq!(params.scale.x, 1.0); // mean |p - shift| = (0 + 2) / 2
//! assert_eq!(normalized.pixel(1, 0), &[0.0, 0.0, 2.0]);
//! ```

use crate::PipelineResult;
use glam::Vec3;
use prep_core::{Mask, NormalizationParams, Pointmap};
use tracing::{debug, warn};

/// Computes and applies pointmap normalization.
///
/// Implementations must hold no shared mutable state; one instance may be
/// used by both branches and from several threads.
pub trait PointmapNormalizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Computes parameters from the pointmap entries selected by `mask`.
    fn compute(&self, pointmap: &Pointmap, mask: &Mask) -> PipelineResult<NormalizationParams>;

    /// Maps every point through `params`.
    fn apply(&self, pointmap: &Pointmap, params: &NormalizationParams) -> Pointmap {
        map_points(pointmap, |p| params.apply(p))
    }

    /// Inverse of [`apply`](Self::apply).
    fn denormalize(&self, pointmap: &Pointmap, params: &NormalizationParams) -> Pointmap {
        map_points(pointmap, |p| params.invert(p))
    }

    /// Normalizes `pointmap`, computing parameters only when none are given.
    fn normalize(
        &self,
        pointmap: &Pointmap,
        mask: &Mask,
        params: Option<NormalizationParams>,
    ) -> PipelineResult<(Pointmap, NormalizationParams)> {
        let params = match params {
            Some(params) => params,
            None => self.compute(pointmap, mask)?,
        };
        Ok((self.apply(pointmap, &params), params))
    }
}

/// What normalization does to the returned pointmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMode {
    /// Rescale the pointmap with the parameters.
    #[default]
    Apply,
    /// Legacy: return the parameters but leave the pointmap values unchanged.
    StatisticsOnly,
}

impl NormalizationMode {
    /// Maps the `normalize_pointmap` flag onto a mode.
    #[inline]
    pub fn from_flag(normalize_pointmap: bool) -> Self {
        if normalize_pointmap {
            Self::Apply
        } else {
            Self::StatisticsOnly
        }
    }
}

/// Normalizes an optional pointmap.
///
/// - `pointmap == None` returns `(None, None)`; not an error.
/// - Supplied `params` are reused verbatim in both modes.
/// - [`NormalizationMode::StatisticsOnly`] returns the input pointmap
///   unchanged alongside the parameters.
pub fn normalize_optional(
    normalizer: &dyn PointmapNormalizer,
    pointmap: Option<&Pointmap>,
    mask: &Mask,
    params: Option<NormalizationParams>,
    mode: NormalizationMode,
) -> PipelineResult<(Option<Pointmap>, Option<NormalizationParams>)> {
    let Some(pointmap) = pointmap else {
        return Ok((None, None));
    };

    match mode {
        NormalizationMode::StatisticsOnly => {
            let params = match params {
                Some(params) => params,
                None => normalizer.compute(pointmap, mask)?,
            };
            Ok((Some(pointmap.clone()), Some(params)))
        }
        NormalizationMode::Apply => {
            let (normalized, params) = normalizer.normalize(pointmap, mask, params)?;
            Ok((Some(normalized), Some(params)))
        }
    }
}

/// Scale/shift invariant normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsiNormalizer {
    /// A pixel is valid when its mask value is strictly greater than this.
    pub mask_threshold: f32,
    /// Lower bound on the computed scale.
    pub min_scale: f32,
}

impl Default for SsiNormalizer {
    fn default() -> Self {
        Self {
            mask_threshold: 0.5,
            min_scale: 1e-6,
        }
    }
}

impl SsiNormalizer {
    /// Collects masked points whose three coordinates are finite.
    fn valid_points(&self, pointmap: &Pointmap, mask: &Mask) -> Vec<Vec3> {
        pointmap
            .pixels()
            .zip(mask.data())
            .filter(|(p, m)| **m > self.mask_threshold && p.iter().all(|v| v.is_finite()))
            .map(|(p, _)| Vec3::new(p[0], p[1], p[2]))
            .collect()
    }
}

impl PointmapNormalizer for SsiNormalizer {
    fn name(&self) -> &str {
        "ssi"
    }

    fn compute(&self, pointmap: &Pointmap, mask: &Mask) -> PipelineResult<NormalizationParams> {
        pointmap.ensure_aligned(mask)?;
        let points = self.valid_points(pointmap, mask);
        if points.is_empty() {
            warn!(
                width = pointmap.width(),
                height = pointmap.height(),
                "No valid masked points, using identity normalization"
            );
            return Ok(NormalizationParams::identity());
        }

        let shift = Vec3::new(
            lower_median(points.iter().map(|p| p.x).collect()),
            lower_median(points.iter().map(|p| p.y).collect()),
            lower_median(points.iter().map(|p| p.z).collect()),
        );
        let mean_dist =
            points.iter().map(|p| p.distance(shift) as f64).sum::<f64>() / points.len() as f64;
        let scale = (mean_dist as f32).max(self.min_scale);

        debug!(
            valid = points.len(),
            scale,
            shift = ?shift.to_array(),
            "Computed pointmap normalization"
        );
        Ok(NormalizationParams::uniform(scale, shift))
    }
}

/// Lower median, matching the convention of returning an actual sample.
fn lower_median(mut values: Vec<f32>) -> f32 {
    let mid = (values.len() - 1) / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

/// Applies `f` to every point; non-finite points stay as they are.
fn map_points<F>(pointmap: &Pointmap, f: F) -> Pointmap
where
    F: Fn(Vec3) -> Vec3 + Send + Sync,
{
    let mut out = pointmap.clone();
    let map = |px: &mut [f32]| {
        if px.iter().all(|v| v.is_finite()) {
            let q = f(Vec3::new(px[0], px[1], px[2]));
            px.copy_from_slice(&q.to_array());
        }
    };

    #[cfg(feature = "parallel")]
    prep_ops::parallel::for_each_pixel(out.data_mut(), 3, map);
    #[cfg(not(feature = "parallel"))]
    out.map_pixels(map);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(w: u32, h: u32) -> Pointmap {
        Pointmap::from_fn(w, h, |x, y| vec![x as f32, y as f32, 2.0 + (x + y) as f32])
    }

    #[test]
    fn test_absent_pointmap_passes_through() {
        let mask = Mask::filled(4, 4, &[1.0]);
        let (pm, params) = normalize_optional(
            &SsiNormalizer::default(),
            None,
            &mask,
            None,
            NormalizationMode::Apply,
        )
        .unwrap();
        assert!(pm.is_none());
        assert!(params.is_none());
    }

    #[test]
    fn test_statistics_only_keeps_values() {
        let pm = ramp(4, 4);
        let mask = Mask::filled(4, 4, &[1.0]);
        let (out, params) = normalize_optional(
            &SsiNormalizer::default(),
            Some(&pm),
            &mask,
            None,
            NormalizationMode::StatisticsOnly,
        )
        .unwrap();
        assert!(out.unwrap().shares_buffer(&pm));
        let params = params.unwrap();
        assert_ne!(params, NormalizationParams::identity());
    }

    #[test]
    fn test_supplied_params_not_recomputed() {
        let pm = ramp(4, 4);
        // Mask of a different size would fail if statistics were recomputed
        let mask = Mask::filled(2, 2, &[1.0]);
        let given = NormalizationParams::uniform(2.0, Vec3::new(1.0, 1.0, 1.0));
        let (out, params) =
            SsiNormalizer::default().normalize(&pm, &mask, Some(given)).unwrap();
        assert_eq!(params, given);
        assert_eq!(out.pixel(3, 3), &[1.0, 1.0, 3.5]);
    }

    #[test]
    fn test_statistics_use_masked_region_only() {
        let pm = Pointmap::from_data(
            3,
            1,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 100.0, 100.0, 100.0],
        )
        .unwrap();
        let mask = Mask::from_data(3, 1, vec![1.0, 1.0, 0.0]).unwrap();
        let params = SsiNormalizer::default().compute(&pm, &mask).unwrap();
        assert_eq!(params.shift, Vec3::new(0.0, 0.0, 1.0));
        // Both valid points sit on the shift, scale clamps to the minimum
        assert_relative_eq!(params.scale.x, 1e-6);
    }

    #[test]
    fn test_non_finite_points_ignored_and_preserved() {
        let pm = Pointmap::from_data(2, 1, vec![f32::NAN, 0.0, 0.0, 2.0, 2.0, 2.0]).unwrap();
        let mask = Mask::filled(2, 1, &[1.0]);
        let (out, params) = SsiNormalizer::default().normalize(&pm, &mask, None).unwrap();
        assert_eq!(params.shift, Vec3::splat(2.0));
        assert!(out.pixel(0, 0)[0].is_nan());
        assert_eq!(out.pixel(1, 0), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_mask_falls_back_to_identity() {
        let pm = ramp(3, 3);
        let mask = Mask::new(3, 3);
        let params = SsiNormalizer::default().compute(&pm, &mask).unwrap();
        assert_eq!(params, NormalizationParams::identity());
    }

    #[test]
    fn test_misaligned_mask_is_an_error() {
        let pm = ramp(3, 3);
        let mask = Mask::filled(4, 4, &[1.0]);
        assert!(SsiNormalizer::default().compute(&pm, &mask).is_err());
    }

    #[test]
    fn test_round_trip_over_masked_region() {
        let pm = ramp(8, 6);
        let mask = Mask::from_fn(8, 6, |x, _| vec![if x < 5 { 1.0 } else { 0.0 }]);
        let norm = SsiNormalizer::default();
        let (normalized, params) = norm.normalize(&pm, &mask, None).unwrap();
        let restored = norm.denormalize(&normalized, &params);

        for ((orig, back), m) in pm.pixels().zip(restored.pixels()).zip(mask.data()) {
            if *m > 0.5 {
                for c in 0..3 {
                    assert_relative_eq!(orig[c], back[c], epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(NormalizationMode::from_flag(true), NormalizationMode::Apply);
        assert_eq!(
            NormalizationMode::from_flag(false),
            NormalizationMode::StatisticsOnly
        );
    }
}
