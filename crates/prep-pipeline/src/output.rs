//! Result assembly.
//!
//! [`PreprocessOutput`] is the typed result of one
//! [`Preprocessor::process`](crate::Preprocessor::process) call. The four
//! image/mask entries are always present. Pointmap entries exist only when
//! an input pointmap was given, and scale/shift entries only when
//! normalization produced parameters.
//!
//! The fixed string keys are available through [`get`](PreprocessOutput::get)
//! and [`into_map`](PreprocessOutput::into_map):
//!
//! | Key | Present |
//! |-----|---------|
//! | `image`, `mask`, `rgb_image`, `rgb_image_mask` | always |
//! | `pointmap`, `rgb_pointmap` | pointmap given |
//! | `pointmap_scale`, `pointmap_shift` | crop params produced |
//! | `rgb_pointmap_scale`, `rgb_pointmap_shift` | rgb params produced |

use glam::Vec3;
use prep_core::{Image, Mask, NormalizationParams, Pointmap};
use std::collections::BTreeMap;

/// Output key names.
pub mod keys {
    /// Processed image.
    pub const IMAGE: &str = "image";
    /// Processed mask.
    pub const MASK: &str = "mask";
    /// Full-resolution image.
    pub const RGB_IMAGE: &str = "rgb_image";
    /// Full-resolution mask.
    pub const RGB_IMAGE_MASK: &str = "rgb_image_mask";
    /// Processed pointmap.
    pub const POINTMAP: &str = "pointmap";
    /// Full-resolution pointmap.
    pub const RGB_POINTMAP: &str = "rgb_pointmap";
    /// Crop-branch scale.
    pub const POINTMAP_SCALE: &str = "pointmap_scale";
    /// Crop-branch shift.
    pub const POINTMAP_SHIFT: &str = "pointmap_shift";
    /// Full-resolution-branch scale.
    pub const RGB_POINTMAP_SCALE: &str = "rgb_pointmap_scale";
    /// Full-resolution-branch shift.
    pub const RGB_POINTMAP_SHIFT: &str = "rgb_pointmap_shift";
}

/// A single output entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    /// Image raster.
    Image(Image),
    /// Mask raster.
    Mask(Mask),
    /// Pointmap raster.
    Pointmap(Pointmap),
    /// Per-axis scale or shift.
    Vector(Vec3),
}

impl OutputValue {
    /// Returns the image, if this is one.
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Self::Image(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the mask, if this is one.
    pub fn as_mask(&self) -> Option<&Mask> {
        match self {
            Self::Mask(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the pointmap, if this is one.
    pub fn as_pointmap(&self) -> Option<&Pointmap> {
        match self {
            Self::Pointmap(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the vector, if this is one.
    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

/// Result of one preprocessing call.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOutput {
    /// Processed (cropped branch) image.
    pub image: Image,
    /// Processed (cropped branch) mask.
    pub mask: Mask,
    /// Full-resolution image.
    pub rgb_image: Image,
    /// Full-resolution mask.
    pub rgb_image_mask: Mask,
    /// Processed pointmap.
    pub pointmap: Option<Pointmap>,
    /// Full-resolution pointmap.
    pub rgb_pointmap: Option<Pointmap>,
    /// Crop-branch normalization.
    pub pointmap_params: Option<NormalizationParams>,
    /// Full-resolution-branch normalization.
    pub rgb_pointmap_params: Option<NormalizationParams>,
}

impl PreprocessOutput {
    /// Output with only the four always-present entries.
    pub fn new(image: Image, mask: Mask, rgb_image: Image, rgb_image_mask: Mask) -> Self {
        Self {
            image,
            mask,
            rgb_image,
            rgb_image_mask,
            pointmap: None,
            rgb_pointmap: None,
            pointmap_params: None,
            rgb_pointmap_params: None,
        }
    }

    /// Attaches both pointmaps. Either being absent clears both.
    pub fn with_pointmaps(mut self, pointmap: Option<Pointmap>, rgb: Option<Pointmap>) -> Self {
        match (pointmap, rgb) {
            (Some(pointmap), Some(rgb)) => {
                self.pointmap = Some(pointmap);
                self.rgb_pointmap = Some(rgb);
            }
            _ => {
                self.pointmap = None;
                self.rgb_pointmap = None;
            }
        }
        self
    }

    /// Attaches normalization parameters.
    pub fn with_params(
        mut self,
        pointmap_params: Option<NormalizationParams>,
        rgb_pointmap_params: Option<NormalizationParams>,
    ) -> Self {
        self.pointmap_params = pointmap_params;
        self.rgb_pointmap_params = rgb_pointmap_params;
        self
    }

    /// Returns `true` if pointmap entries are present.
    #[inline]
    pub fn has_pointmap(&self) -> bool {
        self.pointmap.is_some()
    }

    /// Present keys, in output order.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut out = vec![keys::MASK, keys::IMAGE, keys::RGB_IMAGE, keys::RGB_IMAGE_MASK];
        if self.pointmap.is_some() {
            out.push(keys::POINTMAP);
        }
        if self.rgb_pointmap.is_some() {
            out.push(keys::RGB_POINTMAP);
        }
        if self.pointmap_params.is_some() {
            out.extend([keys::POINTMAP_SCALE, keys::POINTMAP_SHIFT]);
        }
        if self.rgb_pointmap_params.is_some() {
            out.extend([keys::RGB_POINTMAP_SCALE, keys::RGB_POINTMAP_SHIFT]);
        }
        out
    }

    /// Number of present keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Always `false`; the four image/mask entries are always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys().contains(&key)
    }

    /// Looks up an entry by its fixed key name.
    pub fn get(&self, key: &str) -> Option<OutputValue> {
        let value = match key {
            keys::IMAGE => OutputValue::Image(self.image.clone()),
            keys::MASK => OutputValue::Mask(self.mask.clone()),
            keys::RGB_IMAGE => OutputValue::Image(self.rgb_image.clone()),
            keys::RGB_IMAGE_MASK => OutputValue::Mask(self.rgb_image_mask.clone()),
            keys::POINTMAP => OutputValue::Pointmap(self.pointmap.clone()?),
            keys::RGB_POINTMAP => OutputValue::Pointmap(self.rgb_pointmap.clone()?),
            keys::POINTMAP_SCALE => OutputValue::Vector(self.pointmap_params?.scale),
            keys::POINTMAP_SHIFT => OutputValue::Vector(self.pointmap_params?.shift),
            keys::RGB_POINTMAP_SCALE => OutputValue::Vector(self.rgb_pointmap_params?.scale),
            keys::RGB_POINTMAP_SHIFT => OutputValue::Vector(self.rgb_pointmap_params?.shift),
            _ => return None,
        };
        Some(value)
    }

    /// Converts into a string-keyed map holding only the present entries.
    pub fn into_map(self) -> BTreeMap<&'static str, OutputValue> {
        let mut map = BTreeMap::new();
        map.insert(keys::IMAGE, OutputValue::Image(self.image));
        map.insert(keys::MASK, OutputValue::Mask(self.mask));
        map.insert(keys::RGB_IMAGE, OutputValue::Image(self.rgb_image));
        map.insert(keys::RGB_IMAGE_MASK, OutputValue::Mask(self.rgb_image_mask));
        if let Some(pm) = self.pointmap {
            map.insert(keys::POINTMAP, OutputValue::Pointmap(pm));
        }
        if let Some(pm) = self.rgb_pointmap {
            map.insert(keys::RGB_POINTMAP, OutputValue::Pointmap(pm));
        }
        if let Some(p) = self.pointmap_params {
            map.insert(keys::POINTMAP_SCALE, OutputValue::Vector(p.scale));
            map.insert(keys::POINTMAP_SHIFT, OutputValue::Vector(p.shift));
        }
        if let Some(p) = self.rgb_pointmap_params {
            map.insert(keys::RGB_POINTMAP_SCALE, OutputValue::Vector(p.scale));
            map.insert(keys::RGB_POINTMAP_SHIFT, OutputValue::Vector(p.shift));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PreprocessOutput {
        PreprocessOutput::new(
            Image::new(2, 2),
            Mask::new(2, 2),
            Image::new(4, 4),
            Mask::new(4, 4),
        )
    }

    #[test]
    fn test_base_keys() {
        let out = base();
        assert_eq!(out.len(), 4);
        assert!(!out.contains_key(keys::POINTMAP));
        assert!(out.get(keys::POINTMAP_SCALE).is_none());
        assert!(out.get("nonsense").is_none());
        let map = out.into_map();
        assert_eq!(
            map.keys().copied().collect::<Vec<_>>(),
            vec!["image", "mask", "rgb_image", "rgb_image_mask"]
        );
    }

    #[test]
    fn test_full_keys() {
        let params = NormalizationParams::uniform(2.0, Vec3::ONE);
        let out = base()
            .with_pointmaps(Some(Pointmap::new(2, 2)), Some(Pointmap::new(4, 4)))
            .with_params(Some(params), Some(params));
        assert_eq!(out.len(), 10);
        assert_eq!(
            out.get(keys::RGB_POINTMAP_SHIFT).and_then(|v| v.as_vector()),
            Some(Vec3::ONE)
        );
        assert_eq!(
            out.get(keys::RGB_POINTMAP).and_then(|v| v.as_pointmap().map(|p| p.width())),
            Some(4)
        );
    }

    #[test]
    fn test_partial_pointmaps_dropped() {
        let out = base().with_pointmaps(Some(Pointmap::new(2, 2)), None);
        assert!(!out.has_pointmap());
        assert_eq!(out.len(), 4);
    }
}
