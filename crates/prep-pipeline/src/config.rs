//! Preprocessor configuration.
//!
//! [`PreprocessorConfig`] is assembled once through [`PreprocessorBuilder`]
//! and is immutable afterwards. [`build`](PreprocessorBuilder::build) is the
//! only place where defaults are installed:
//!
//! - an unset crop-branch normalizer becomes [`SsiNormalizer::default()`];
//! - an unset rgb-branch normalizer becomes the crop-branch instance;
//! - legacy normalization (`normalize_pointmap = false`) with a defaulted
//!   normalizer emits one deprecation notice, here and nowhere else.
//!
//! ```rust
//! use prep_pipeline::{PreprocessorConfig, RgbStatistics};
//! use prep_pipeline::transform::raster_fn;
//!
//! let config = PreprocessorConfig::builder()
//!     .normalize_pointmap(true)
//!     .mask_transforms(vec![raster_fn("identity", Ok)])
//!     .build();
//!
//! assert!(config.mask_slot().is_configured());
//! assert!(config.image_slot().is_unset());
//! assert_eq!(config.rgb_statistics(), RgbStatistics::ReuseCrop);
//! ```

use crate::normalizer::{NormalizationMode, PointmapNormalizer, SsiNormalizer};
use crate::slot::{ImageSlot, JointSlot, MaskSlot, PointmapSlot, SlotName, TransformSlot};
use crate::transform::{SharedJointTransform, SharedRasterTransform};
use prep_core::{Matte, Rgb, Xyz};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Log target of deprecation notices.
pub const DEPRECATION_TARGET: &str = "prep_pipeline::deprecation";

/// Shared normalizer reference.
pub type SharedNormalizer = Arc<dyn PointmapNormalizer>;

/// How the full-resolution branch obtains its normalization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RgbStatistics {
    /// Reuse the cropped branch's scale/shift verbatim.
    #[default]
    ReuseCrop,
    /// Recompute scale/shift with the rgb normalizer against the
    /// full-resolution mask.
    ///
    /// Only honored when the rgb normalizer is a distinct instance from the
    /// crop normalizer; otherwise [`PreprocessorBuilder::build`] falls back
    /// to [`ReuseCrop`](Self::ReuseCrop).
    Recompute,
}

/// Immutable preprocessor configuration.
#[derive(Clone)]
pub struct PreprocessorConfig {
    image_slot: ImageSlot,
    mask_slot: MaskSlot,
    pointmap_slot: PointmapSlot,
    rgb_joint_slot: JointSlot,
    dual_joint_slot: JointSlot,
    triple_joint_slot: JointSlot,
    normalize_pointmap: bool,
    pointmap_normalizer: SharedNormalizer,
    rgb_pointmap_normalizer: SharedNormalizer,
    rgb_statistics: RgbStatistics,
    legacy_notice_emitted: bool,
}

impl PreprocessorConfig {
    /// Starts a new builder.
    pub fn builder() -> PreprocessorBuilder {
        PreprocessorBuilder::new()
    }

    /// Per-image slot.
    #[inline]
    pub fn image_slot(&self) -> &ImageSlot {
        &self.image_slot
    }

    /// Per-mask slot.
    #[inline]
    pub fn mask_slot(&self) -> &MaskSlot {
        &self.mask_slot
    }

    /// Per-pointmap slot.
    #[inline]
    pub fn pointmap_slot(&self) -> &PointmapSlot {
        &self.pointmap_slot
    }

    /// Joint pre-transform of the full-resolution branch.
    #[inline]
    pub fn rgb_joint_slot(&self) -> &JointSlot {
        &self.rgb_joint_slot
    }

    /// Legacy `(image, mask)` joint slot of the cropped branch.
    #[inline]
    pub fn dual_joint_slot(&self) -> &JointSlot {
        &self.dual_joint_slot
    }

    /// `(image, mask, pointmap)` joint slot of the cropped branch.
    #[inline]
    pub fn triple_joint_slot(&self) -> &JointSlot {
        &self.triple_joint_slot
    }

    /// Whether normalized pointmap values are returned.
    #[inline]
    pub fn normalize_pointmap(&self) -> bool {
        self.normalize_pointmap
    }

    /// Normalization mode derived from [`normalize_pointmap`](Self::normalize_pointmap).
    #[inline]
    pub fn normalization_mode(&self) -> NormalizationMode {
        NormalizationMode::from_flag(self.normalize_pointmap)
    }

    /// Crop-branch normalizer.
    #[inline]
    pub fn pointmap_normalizer(&self) -> &dyn PointmapNormalizer {
        self.pointmap_normalizer.as_ref()
    }

    /// Full-resolution-branch normalizer.
    #[inline]
    pub fn rgb_pointmap_normalizer(&self) -> &dyn PointmapNormalizer {
        self.rgb_pointmap_normalizer.as_ref()
    }

    /// Returns `true` if both branches share one normalizer instance.
    #[inline]
    pub fn shares_normalizer(&self) -> bool {
        Arc::ptr_eq(&self.pointmap_normalizer, &self.rgb_pointmap_normalizer)
    }

    /// How the full-resolution branch obtains its statistics.
    #[inline]
    pub fn rgb_statistics(&self) -> RgbStatistics {
        self.rgb_statistics
    }

    /// Returns `true` if building this configuration emitted the legacy
    /// normalization deprecation notice.
    #[inline]
    pub fn legacy_notice_emitted(&self) -> bool {
        self.legacy_notice_emitted
    }

    /// Returns `true` if the named slot is configured.
    pub fn is_slot_configured(&self, slot: SlotName) -> bool {
        match slot {
            SlotName::Image => self.image_slot.is_configured(),
            SlotName::Mask => self.mask_slot.is_configured(),
            SlotName::Pointmap => self.pointmap_slot.is_configured(),
            SlotName::RgbJoint => self.rgb_joint_slot.is_configured(),
            SlotName::DualJoint => self.dual_joint_slot.is_configured(),
            SlotName::TripleJoint => self.triple_joint_slot.is_configured(),
        }
    }
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        PreprocessorBuilder::new().build()
    }
}

impl fmt::Debug for PreprocessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreprocessorConfig")
            .field(SlotName::Image.as_str(), &self.image_slot)
            .field(SlotName::Mask.as_str(), &self.mask_slot)
            .field(SlotName::Pointmap.as_str(), &self.pointmap_slot)
            .field(SlotName::RgbJoint.as_str(), &self.rgb_joint_slot)
            .field(SlotName::DualJoint.as_str(), &self.dual_joint_slot)
            .field(SlotName::TripleJoint.as_str(), &self.triple_joint_slot)
            .field("normalize_pointmap", &self.normalize_pointmap)
            .field("pointmap_normalizer", &self.pointmap_normalizer.name())
            .field("rgb_pointmap_normalizer", &self.rgb_pointmap_normalizer.name())
            .field("rgb_statistics", &self.rgb_statistics)
            .finish()
    }
}

/// Builder for [`PreprocessorConfig`].
///
/// Every slot starts [`TransformSlot::Unset`], both normalizers start unset
/// and `normalize_pointmap` starts `false`.
#[derive(Clone, Default)]
pub struct PreprocessorBuilder {
    image_slot: ImageSlot,
    mask_slot: MaskSlot,
    pointmap_slot: PointmapSlot,
    rgb_joint_slot: JointSlot,
    dual_joint_slot: JointSlot,
    triple_joint_slot: JointSlot,
    normalize_pointmap: bool,
    pointmap_normalizer: Option<SharedNormalizer>,
    rgb_pointmap_normalizer: Option<SharedNormalizer>,
    rgb_statistics: RgbStatistics,
}

impl PreprocessorBuilder {
    /// Creates a builder with everything unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-image slot.
    pub fn image_slot(mut self, slot: ImageSlot) -> Self {
        self.image_slot = slot;
        self
    }

    /// Configures per-image transforms.
    pub fn image_transforms(self, transforms: Vec<SharedRasterTransform<Rgb>>) -> Self {
        self.image_slot(TransformSlot::Configured(transforms))
    }

    /// Sets the per-mask slot.
    pub fn mask_slot(mut self, slot: MaskSlot) -> Self {
        self.mask_slot = slot;
        self
    }

    /// Configures per-mask transforms.
    pub fn mask_transforms(self, transforms: Vec<SharedRasterTransform<Matte>>) -> Self {
        self.mask_slot(TransformSlot::Configured(transforms))
    }

    /// Sets the per-pointmap slot.
    pub fn pointmap_slot(mut self, slot: PointmapSlot) -> Self {
        self.pointmap_slot = slot;
        self
    }

    /// Configures per-pointmap transforms.
    pub fn pointmap_transforms(self, transforms: Vec<SharedRasterTransform<Xyz>>) -> Self {
        self.pointmap_slot(TransformSlot::Configured(transforms))
    }

    /// Sets the full-resolution joint pre-transform slot.
    pub fn rgb_joint_slot(mut self, slot: JointSlot) -> Self {
        self.rgb_joint_slot = slot;
        self
    }

    /// Configures full-resolution joint pre-transforms.
    pub fn rgb_joint_transforms(self, transforms: Vec<SharedJointTransform>) -> Self {
        self.rgb_joint_slot(TransformSlot::Configured(transforms))
    }

    /// Sets the legacy `(image, mask)` joint slot.
    pub fn dual_joint_slot(mut self, slot: JointSlot) -> Self {
        self.dual_joint_slot = slot;
        self
    }

    /// Configures legacy `(image, mask)` joint transforms.
    pub fn dual_joint_transforms(self, transforms: Vec<SharedJointTransform>) -> Self {
        self.dual_joint_slot(TransformSlot::Configured(transforms))
    }

    /// Sets the `(image, mask, pointmap)` joint slot.
    pub fn triple_joint_slot(mut self, slot: JointSlot) -> Self {
        self.triple_joint_slot = slot;
        self
    }

    /// Configures `(image, mask, pointmap)` joint transforms.
    pub fn triple_joint_transforms(self, transforms: Vec<SharedJointTransform>) -> Self {
        self.triple_joint_slot(TransformSlot::Configured(transforms))
    }

    /// Whether returned pointmaps are rescaled. `false` is the legacy mode.
    pub fn normalize_pointmap(mut self, enabled: bool) -> Self {
        self.normalize_pointmap = enabled;
        self
    }

    /// Sets the crop-branch normalizer.
    pub fn pointmap_normalizer(mut self, normalizer: SharedNormalizer) -> Self {
        self.pointmap_normalizer = Some(normalizer);
        self
    }

    /// Sets a distinct full-resolution-branch normalizer.
    pub fn rgb_pointmap_normalizer(mut self, normalizer: SharedNormalizer) -> Self {
        self.rgb_pointmap_normalizer = Some(normalizer);
        self
    }

    /// Chooses whether the full-resolution branch reuses or recomputes
    /// statistics.
    pub fn rgb_statistics(mut self, policy: RgbStatistics) -> Self {
        self.rgb_statistics = policy;
        self
    }

    /// Installs defaults and freezes the configuration.
    pub fn build(self) -> PreprocessorConfig {
        let mut legacy_notice_emitted = false;
        let pointmap_normalizer = match self.pointmap_normalizer {
            Some(normalizer) => normalizer,
            None => {
                if !self.normalize_pointmap {
                    warn!(
                        target: DEPRECATION_TARGET,
                        "normalize_pointmap is false: normalization moments are returned but \
                         pointmaps are not normalized. This supports old unnormalized pointmap \
                         models and is deprecated"
                    );
                    legacy_notice_emitted = true;
                }
                Arc::new(SsiNormalizer::default()) as SharedNormalizer
            }
        };

        let rgb_pointmap_normalizer = match self.rgb_pointmap_normalizer {
            Some(normalizer) => normalizer,
            None => {
                warn!("No rgb pointmap normalizer provided, reusing the crop normalizer");
                Arc::clone(&pointmap_normalizer)
            }
        };

        let mut rgb_statistics = self.rgb_statistics;
        if rgb_statistics == RgbStatistics::Recompute
            && Arc::ptr_eq(&rgb_pointmap_normalizer, &pointmap_normalizer)
        {
            warn!(
                "RgbStatistics::Recompute needs a distinct rgb pointmap normalizer, \
                 reusing crop statistics"
            );
            rgb_statistics = RgbStatistics::ReuseCrop;
        }

        let config = PreprocessorConfig {
            image_slot: self.image_slot,
            mask_slot: self.mask_slot,
            pointmap_slot: self.pointmap_slot,
            rgb_joint_slot: self.rgb_joint_slot,
            dual_joint_slot: self.dual_joint_slot,
            triple_joint_slot: self.triple_joint_slot,
            normalize_pointmap: self.normalize_pointmap,
            pointmap_normalizer,
            rgb_pointmap_normalizer,
            rgb_statistics,
            legacy_notice_emitted,
        };
        debug!(?config, "Built preprocessor configuration");
        config
    }
}
