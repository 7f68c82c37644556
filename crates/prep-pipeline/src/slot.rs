//! Transform slots.
//!
//! A [`TransformSlot`] is either [`Unset`](TransformSlot::Unset) or holds a
//! configured, ordered sequence. The three states the configuration can
//! express stay distinguishable:
//!
//! | State | Value |
//! |-------|-------|
//! | not configured | `TransformSlot::Unset` |
//! | configured, empty | `TransformSlot::Configured(vec![])` |
//! | configured no-op | `TransformSlot::Configured(vec![identity])` |
//!
//! At runtime the first two behave identically: the input passes through.
//!
//! ```rust
//! use prep_pipeline::slot::{MaskSlot, TransformSlot};
//! use prep_core::Mask;
//!
//! let unset: MaskSlot = TransformSlot::Unset;
//! let empty: MaskSlot = TransformSlot::configured(vec![]);
//! assert_ne!(unset.is_configured(), empty.is_configured());
//!
//! let mask = Mask::filled(4, 4, &[1.0]);
//! assert!(unset.apply(mask.clone()).unwrap().shares_buffer(&mask));
//! assert!(empty.apply(mask.clone()).unwrap().shares_buffer(&mask));
//! ```

use crate::transform::{Arity, SharedJointTransform, SharedRasterTransform};
use crate::{PipelineError, PipelineResult};
use prep_core::{Image, Mask, Matte, Modality, Pointmap, Raster, Rgb, Xyz};
use std::fmt;
use tracing::{debug, trace};

/// Names of the six configurable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    /// Per-image transforms, applied to both branches.
    Image,
    /// Per-mask transforms, applied to both branches.
    Mask,
    /// Per-pointmap transforms, applied to both branches.
    Pointmap,
    /// Joint `(image, mask)` pre-transform of the full-resolution branch.
    RgbJoint,
    /// Legacy joint `(image, mask)` transforms of the cropped branch.
    DualJoint,
    /// Joint `(image, mask, pointmap)` transforms of the cropped branch.
    TripleJoint,
}

impl SlotName {
    /// All slots, in configuration order.
    pub const ALL: [SlotName; 6] = [
        SlotName::Image,
        SlotName::Mask,
        SlotName::Pointmap,
        SlotName::RgbJoint,
        SlotName::DualJoint,
        SlotName::TripleJoint,
    ];

    /// Stable identifier used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Image => "img_transform",
            SlotName::Mask => "mask_transform",
            SlotName::Pointmap => "pointmap_transform",
            SlotName::RgbJoint => "rgb_img_mask_joint_transform",
            SlotName::DualJoint => "img_mask_joint_transform",
            SlotName::TripleJoint => "img_mask_pointmap_joint_transform",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered transform sequence, or explicitly not configured.
#[derive(Clone)]
pub enum TransformSlot<T> {
    /// Nothing configured; applying the slot is a no-op.
    Unset,
    /// Configured sequence, applied in order. May be empty.
    Configured(Vec<T>),
}

impl<T> TransformSlot<T> {
    /// Creates a configured slot.
    #[inline]
    pub fn configured(transforms: Vec<T>) -> Self {
        Self::Configured(transforms)
    }

    /// Returns `true` for [`TransformSlot::Unset`].
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns `true` for [`TransformSlot::Configured`], even when empty.
    #[inline]
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Configured transforms; empty when unset.
    #[inline]
    pub fn transforms(&self) -> &[T] {
        match self {
            Self::Unset => &[],
            Self::Configured(v) => v,
        }
    }

    /// Number of configured transforms.
    #[inline]
    pub fn len(&self) -> usize {
        self.transforms().len()
    }

    /// Returns `true` if applying the slot cannot change its input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms().is_empty()
    }

    /// Appends a transform, turning an unset slot into a configured one.
    pub fn push(&mut self, transform: T) {
        match self {
            Self::Unset => *self = Self::Configured(vec![transform]),
            Self::Configured(v) => v.push(transform),
        }
    }
}

impl<T> Default for TransformSlot<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Vec<T>> for TransformSlot<T> {
    fn from(transforms: Vec<T>) -> Self {
        Self::Configured(transforms)
    }
}

impl<T> fmt::Debug for TransformSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Configured(v) => write!(f, "Configured({} transforms)", v.len()),
        }
    }
}

/// Slot of per-modality transforms.
pub type RasterSlot<M> = TransformSlot<SharedRasterTransform<M>>;

/// Slot of per-image transforms.
pub type ImageSlot = RasterSlot<Rgb>;

/// Slot of per-mask transforms.
pub type MaskSlot = RasterSlot<Matte>;

/// Slot of per-pointmap transforms.
pub type PointmapSlot = RasterSlot<Xyz>;

/// Slot of joint transforms.
pub type JointSlot = TransformSlot<SharedJointTransform>;

impl<M: Modality> TransformSlot<SharedRasterTransform<M>> {
    /// Runs every configured transform in order.
    pub fn apply(&self, input: Raster<M>) -> PipelineResult<Raster<M>> {
        self.transforms().iter().try_fold(input, |acc, t| {
            trace!(modality = M::NAME, transform = t.name(), "Applying transform");
            t.apply(acc)
        })
    }
}

impl TransformSlot<SharedJointTransform> {
    /// Checks that every configured transform accepts `arity`.
    ///
    /// Runs before any transform so a mismatched sequence fails without
    /// partially transforming the inputs.
    pub fn check_arity(&self, arity: Arity) -> PipelineResult<()> {
        match self.transforms().iter().find(|t| !t.accepts(arity)) {
            Some(t) => {
                debug!(transform = t.name(), %arity, "Joint transform rejects arity");
                Err(PipelineError::arity_mismatch(t.name(), arity))
            }
            None => Ok(()),
        }
    }

    /// Runs every configured transform on `(image, mask)`.
    pub fn apply_dual(&self, image: Image, mask: Mask) -> PipelineResult<(Image, Mask)> {
        self.check_arity(Arity::Dual)?;
        self.transforms()
            .iter()
            .try_fold((image, mask), |(image, mask), t| {
                trace!(transform = t.name(), "Applying dual joint transform");
                t.apply_dual(image, mask)
            })
    }

    /// Runs every configured transform on `(image, mask, pointmap)`.
    pub fn apply_triple(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Pointmap,
    ) -> PipelineResult<(Image, Mask, Pointmap)> {
        self.check_arity(Arity::Triple)?;
        self.transforms()
            .iter()
            .try_fold((image, mask, pointmap), |(image, mask, pointmap), t| {
                trace!(transform = t.name(), "Applying triple joint transform");
                t.apply_triple(image, mask, pointmap)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{dual_fn, raster_fn, triple_fn, JointTransform};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_unset_vs_empty() {
        let unset: ImageSlot = TransformSlot::Unset;
        let empty: ImageSlot = TransformSlot::configured(vec![]);
        assert!(unset.is_unset());
        assert!(!empty.is_unset());
        assert!(empty.is_configured());
        assert!(unset.is_empty() && empty.is_empty());
    }

    #[test]
    fn test_push_configures() {
        let mut slot: MaskSlot = TransformSlot::default();
        assert!(slot.is_unset());
        slot.push(raster_fn("id", Ok));
        assert!(slot.is_configured());
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn test_apply_in_order() {
        let slot: MaskSlot = TransformSlot::configured(vec![
            raster_fn("add", |mut m: Mask| {
                m.map_pixels(|px| px[0] += 1.0);
                Ok(m)
            }),
            raster_fn("mul", |mut m: Mask| {
                m.map_pixels(|px| px[0] *= 10.0);
                Ok(m)
            }),
        ]);
        let out = slot.apply(Mask::filled(1, 1, &[1.0])).unwrap();
        assert_eq!(out.pixel(0, 0), &[20.0]);
    }

    #[test]
    fn test_apply_dual_propagates_error() {
        let slot: JointSlot = TransformSlot::configured(vec![dual_fn("boom", |_, _| {
            Err(crate::PipelineError::transform("boom", "failed"))
        })]);
        assert!(slot.apply_dual(Image::new(1, 1), Mask::new(1, 1)).is_err());
    }

    /// Dual-only transform that still overrides `apply_triple`.
    struct DualOnly(Arc<AtomicUsize>);

    impl JointTransform for DualOnly {
        fn name(&self) -> &str {
            "dual-only"
        }

        fn accepts(&self, arity: Arity) -> bool {
            arity == Arity::Dual
        }

        fn apply_triple(
            &self,
            image: Image,
            mask: Mask,
            pointmap: Pointmap,
        ) -> PipelineResult<(Image, Mask, Pointmap)> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok((image, mask, pointmap))
        }
    }

    #[test]
    fn test_rejected_arity_fails_before_running() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let dual_only: SharedJointTransform = Arc::new(DualOnly(Arc::clone(&runs)));
        let slot: JointSlot = TransformSlot::configured(vec![
            triple_fn("count", move |i, m, p| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok((i, m, p))
            }),
            dual_only,
        ]);

        let err = slot
            .apply_triple(Image::new(1, 1), Mask::new(1, 1), Pointmap::new(1, 1))
            .unwrap_err();
        assert!(err.is_arity_mismatch());
        assert!(err.to_string().contains("dual-only"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_check_arity() {
        let slot: JointSlot = TransformSlot::configured(vec![dual_fn("id", |i, m| Ok((i, m)))]);
        assert!(slot.check_arity(Arity::Dual).is_ok());
        assert!(slot.check_arity(Arity::Triple).unwrap_err().is_arity_mismatch());
        assert!(JointSlot::Unset.check_arity(Arity::Triple).is_ok());
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(SlotName::ALL.len(), 6);
        assert_eq!(SlotName::TripleJoint.to_string(), "img_mask_pointmap_joint_transform");
    }
}
