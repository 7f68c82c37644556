//! Ready-made configurations.
//!
//! [`default_preprocessor`] builds the standard object preprocessing setup:
//!
//! - image: pad to square, resize to `target_size` (bicubic)
//! - mask: pad to square, resize to `target_size` (nearest)
//! - cropped branch: crop around the mask, then remove the background
//!
//! With [`PresetSettings::with_pointmap()`] the same crop and background
//! removal also go into the triple slot, and pointmaps get the pad/resize
//! treatment of masks.
//!
//! Settings can be read from YAML; missing fields keep their defaults:
//!
//! ```rust
//! use prep_pipeline::presets::{default_preprocessor, PresetSettings};
//!
//! let settings = PresetSettings::from_yaml_str("target_size: 256\nwith_pointmap: true\n").unwrap();
//! assert_eq!(settings.target_size, 256);
//! assert_eq!(settings.padding_factor, 0.1);
//!
//! let config = default_preprocessor(&settings).unwrap();
//! assert!(config.triple_joint_slot().is_configured());
//! ```

use crate::config::PreprocessorConfig;
use crate::stock::{CropAroundMask, PadToSquare, RemoveBackground, ResizeShortSide};
use crate::transform::{SharedJointTransform, SharedRasterTransform};
use crate::{PipelineError, PipelineResult};
use prep_core::Modality;
use prep_ops::Filter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Resampling filter name as written in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Nearest-neighbour.
    Nearest,
    /// Bilinear.
    Bilinear,
    /// Bicubic.
    #[default]
    Bicubic,
    /// Lanczos, 3 lobes.
    Lanczos3,
}

impl From<ResizeFilter> for Filter {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => Filter::Nearest,
            ResizeFilter::Bilinear => Filter::Bilinear,
            ResizeFilter::Bicubic => Filter::Bicubic,
            ResizeFilter::Lanczos3 => Filter::Lanczos3,
        }
    }
}

/// Parameters of the default preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetSettings {
    /// Output side length after padding to square.
    pub target_size: u32,
    /// Image resampling filter.
    pub image_filter: ResizeFilter,
    /// Crop box multiplier.
    pub box_size_factor: f32,
    /// Crop margin per side.
    pub padding_factor: f32,
    /// Mask membership threshold for cropping and background removal.
    pub mask_threshold: f32,
    /// Also configure the pointmap slots.
    pub with_pointmap: bool,
    /// Return normalized pointmaps.
    pub normalize_pointmap: bool,
}

impl Default for PresetSettings {
    fn default() -> Self {
        Self {
            target_size: 518,
            image_filter: ResizeFilter::Bicubic,
            box_size_factor: 1.0,
            padding_factor: 0.1,
            mask_threshold: 0.5,
            with_pointmap: false,
            normalize_pointmap: false,
        }
    }
}

impl PresetSettings {
    /// Parses settings from YAML.
    pub fn from_yaml_str(yaml: &str) -> PipelineResult<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to YAML.
    pub fn to_yaml_string(&self) -> PipelineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Enables the pointmap slots.
    pub fn with_pointmap(mut self) -> Self {
        self.with_pointmap = true;
        self
    }

    /// Sets `normalize_pointmap`.
    pub fn normalize_pointmap(mut self, enabled: bool) -> Self {
        self.normalize_pointmap = enabled;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.target_size == 0 {
            return Err(PipelineError::InvalidParameter(
                "target_size must be > 0".into(),
            ));
        }
        if !(self.box_size_factor > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "box_size_factor must be > 0, got {}",
                self.box_size_factor
            )));
        }
        if !(self.padding_factor >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "padding_factor must be >= 0, got {}",
                self.padding_factor
            )));
        }
        Ok(())
    }
}

fn square_resize<M: Modality>(size: u32, filter: Filter) -> Vec<SharedRasterTransform<M>> {
    let pad: SharedRasterTransform<M> = Arc::new(PadToSquare);
    let resize: SharedRasterTransform<M> = Arc::new(ResizeShortSide::new(size, filter));
    vec![pad, resize]
}

fn crop_and_clear(settings: &PresetSettings) -> Vec<SharedJointTransform> {
    let crop: SharedJointTransform = Arc::new(CropAroundMask {
        box_size_factor: settings.box_size_factor,
        padding_factor: settings.padding_factor,
        threshold: settings.mask_threshold,
    });
    let clear: SharedJointTransform = Arc::new(RemoveBackground {
        threshold: settings.mask_threshold,
    });
    vec![crop, clear]
}

/// Builds the default configuration.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for out-of-range settings.
pub fn default_preprocessor(settings: &PresetSettings) -> PipelineResult<PreprocessorConfig> {
    settings.validate()?;
    debug!(?settings, "Building default preprocessor");

    let size = settings.target_size;
    let mut builder = PreprocessorConfig::builder()
        .normalize_pointmap(settings.normalize_pointmap)
        .image_transforms(square_resize(size, settings.image_filter.into()))
        .mask_transforms(square_resize(size, Filter::Nearest))
        .dual_joint_transforms(crop_and_clear(settings));

    if settings.with_pointmap {
        builder = builder
            .triple_joint_transforms(crop_and_clear(settings))
            .pointmap_transforms(square_resize(size, Filter::Nearest));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotName;

    #[test]
    fn test_defaults() {
        let config = default_preprocessor(&PresetSettings::default()).unwrap();
        assert_eq!(config.image_slot().len(), 2);
        assert_eq!(config.mask_slot().len(), 2);
        assert_eq!(config.dual_joint_slot().len(), 2);
        assert!(!config.is_slot_configured(SlotName::TripleJoint));
        assert!(!config.is_slot_configured(SlotName::Pointmap));
        assert!(!config.is_slot_configured(SlotName::RgbJoint));
    }

    #[test]
    fn test_with_pointmap() {
        let settings = PresetSettings::default().with_pointmap().normalize_pointmap(true);
        let config = default_preprocessor(&settings).unwrap();
        assert_eq!(config.triple_joint_slot().len(), 2);
        assert_eq!(config.pointmap_slot().len(), 2);
        assert!(config.normalize_pointmap());
    }

    #[test]
    fn test_yaml_filter_and_validation() {
        let s = PresetSettings::from_yaml_str("image_filter: lanczos3").unwrap();
        assert_eq!(Filter::from(s.image_filter), Filter::Lanczos3);
        assert_eq!(s.target_size, 518);

        assert!(PresetSettings::from_yaml_str("target_size: 0").is_err());
        assert!(matches!(
            PresetSettings::from_yaml_str("target_size: [1, 2]"),
            Err(PipelineError::Settings(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let s = PresetSettings::default().with_pointmap();
        let yaml = s.to_yaml_string().unwrap();
        assert_eq!(PresetSettings::from_yaml_str(&yaml).unwrap(), s);
    }
}
