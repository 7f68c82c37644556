//! Joint transform selection.
//!
//! Exactly one joint path runs on the cropped branch. First match wins:
//!
//! 1. [`JointPath::Triple`] - triple slot configured **and** a pointmap is present
//! 2. [`JointPath::Dual`] - dual slot configured; the pointmap passes through
//! 3. [`JointPath::Identity`] - everything passes through
//!
//! A configured-but-empty triple slot still wins over the dual slot when a
//! pointmap is present: configuring pointmap-aware joint transforms opts the
//! configuration out of the legacy path.

use crate::slot::JointSlot;
use crate::PipelineResult;
use prep_core::{Image, Mask, Pointmap};
use tracing::debug;

/// The joint path chosen for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointPath {
    /// `(image, mask, pointmap)` transforms.
    Triple,
    /// `(image, mask)` transforms, pointmap untouched.
    Dual,
    /// No joint transform.
    Identity,
}

/// Applies the priority rule.
///
/// ```rust
/// use prep_pipeline::selector::{select_joint_path, JointPath};
/// use prep_pipeline::slot::TransformSlot;
///
/// let triple = TransformSlot::configured(vec![]);
/// let dual = TransformSlot::configured(vec![]);
/// assert_eq!(select_joint_path(&triple, &dual, true), JointPath::Triple);
/// assert_eq!(select_joint_path(&triple, &dual, false), JointPath::Dual);
/// assert_eq!(select_joint_path(&TransformSlot::Unset, &TransformSlot::Unset, true), JointPath::Identity);
/// ```
pub fn select_joint_path(triple: &JointSlot, dual: &JointSlot, has_pointmap: bool) -> JointPath {
    if triple.is_configured() && has_pointmap {
        JointPath::Triple
    } else if dual.is_configured() {
        JointPath::Dual
    } else {
        JointPath::Identity
    }
}

/// Output of [`JointSelector::apply`].
#[derive(Debug, Clone)]
pub struct JointOutput {
    /// Transformed image.
    pub image: Image,
    /// Transformed mask.
    pub mask: Mask,
    /// Transformed (triple path) or untouched pointmap.
    pub pointmap: Option<Pointmap>,
    /// Path that produced this output.
    pub path: JointPath,
}

/// Borrowing view over the two joint slots of the cropped branch.
#[derive(Debug, Clone, Copy)]
pub struct JointSelector<'a> {
    triple: &'a JointSlot,
    dual: &'a JointSlot,
}

impl<'a> JointSelector<'a> {
    /// Creates a selector over the triple and dual slots.
    pub fn new(triple: &'a JointSlot, dual: &'a JointSlot) -> Self {
        Self { triple, dual }
    }

    /// Returns the path [`apply`](Self::apply) would take.
    #[inline]
    pub fn select(&self, has_pointmap: bool) -> JointPath {
        select_joint_path(self.triple, self.dual, has_pointmap)
    }

    /// Selects a path and runs it.
    ///
    /// # Errors
    ///
    /// Propagates transform failures, including arity mismatches, unchanged.
    pub fn apply(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Option<Pointmap>,
    ) -> PipelineResult<JointOutput> {
        let path = self.select(pointmap.is_some());
        debug!(?path, "Selected joint transform path");

        match (path, pointmap) {
            (JointPath::Triple, Some(pointmap)) => {
                let (image, mask, pointmap) = self.triple.apply_triple(image, mask, pointmap)?;
                Ok(JointOutput {
                    image,
                    mask,
                    pointmap: Some(pointmap),
                    path,
                })
            }
            (JointPath::Dual, pointmap) => {
                let (image, mask) = self.dual.apply_dual(image, mask)?;
                Ok(JointOutput {
                    image,
                    mask,
                    pointmap,
                    path,
                })
            }
            (_, pointmap) => Ok(JointOutput {
                image,
                mask,
                pointmap,
                path: JointPath::Identity,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::TransformSlot;
    use crate::transform::{dual_fn, triple_fn};

    #[test]
    fn test_triple_needs_pointmap() {
        let triple: JointSlot = TransformSlot::configured(vec![]);
        let dual: JointSlot = TransformSlot::Unset;
        assert_eq!(select_joint_path(&triple, &dual, false), JointPath::Identity);
        assert_eq!(select_joint_path(&triple, &dual, true), JointPath::Triple);
    }

    #[test]
    fn test_dual_runs_without_triple() {
        let triple: JointSlot = TransformSlot::Unset;
        let dual: JointSlot = TransformSlot::configured(vec![]);
        assert_eq!(select_joint_path(&triple, &dual, true), JointPath::Dual);
        assert_eq!(select_joint_path(&triple, &dual, false), JointPath::Dual);
    }

    #[test]
    fn test_dual_leaves_pointmap_untouched() {
        let triple: JointSlot = TransformSlot::Unset;
        let dual: JointSlot = TransformSlot::configured(vec![dual_fn("zero", |i, _m: Mask| {
            let mask = Mask::new(i.width(), i.height());
            Ok((i, mask))
        })]);
        let pm = Pointmap::filled(2, 2, &[1.0, 2.0, 3.0]);
        let out = JointSelector::new(&triple, &dual)
            .apply(Image::new(2, 2), Mask::filled(2, 2, &[1.0]), Some(pm.clone()))
            .unwrap();
        assert_eq!(out.path, JointPath::Dual);
        assert!(out.pointmap.unwrap().shares_buffer(&pm));
        assert_eq!(out.mask.pixel(0, 0), &[0.0]);
    }

    #[test]
    fn test_dual_in_triple_slot_fails_loudly() {
        let triple: JointSlot =
            TransformSlot::configured(vec![dual_fn("legacy-crop", |i, m| Ok((i, m)))]);
        let dual: JointSlot = TransformSlot::Unset;
        let err = JointSelector::new(&triple, &dual)
            .apply(Image::new(2, 2), Mask::new(2, 2), Some(Pointmap::new(2, 2)))
            .unwrap_err();
        assert!(err.is_arity_mismatch());
    }

    #[test]
    fn test_triple_transforms_pointmap() {
        let triple: JointSlot = TransformSlot::configured(vec![triple_fn(
            "shift",
            |i, m, mut p: Pointmap| {
                p.map_pixels(|px| px[2] += 1.0);
                Ok((i, m, p))
            },
        )]);
        let dual: JointSlot = TransformSlot::Unset;
        let out = JointSelector::new(&triple, &dual)
            .apply(
                Image::new(1, 1),
                Mask::new(1, 1),
                Some(Pointmap::filled(1, 1, &[0.0, 0.0, 1.0])),
            )
            .unwrap();
        assert_eq!(out.path, JointPath::Triple);
        assert_eq!(out.pointmap.unwrap().pixel(0, 0), &[0.0, 0.0, 2.0]);
    }
}
