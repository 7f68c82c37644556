//! # prep-pipeline
//!
//! Transform composition and pointmap normalization for object
//! reconstruction inputs.
//!
//! A [`Preprocessor`] takes an image, an object mask and an optional
//! pointmap and produces two aligned branches:
//!
//! - **cropped**: joint transforms (crop around the object, background
//!   removal...) followed by per-modality transforms
//! - **full-resolution**: an optional joint pre-transform followed by the
//!   same per-modality transforms
//!
//! Pointmap normalization (scale/shift) is computed once on the cropped
//! branch and reused for the full-resolution one.
//!
//! # Modules
//!
//! - [`transform`] - Per-modality and joint transform contracts
//! - [`slot`] - Unset vs configured transform sequences
//! - [`normalizer`] - Pointmap normalization
//! - [`selector`] - Triple / dual / identity joint path choice
//! - [`config`] - Immutable configuration and its builder
//! - [`preprocessor`] - Stage orchestration
//! - [`output`] - Result assembly
//! - [`stock`], [`presets`] - Ready-made transforms and configurations
//!
//! # Example
//!
//! ```rust
//! use prep_core::{Image, Mask, Pointmap};
//! use prep_pipeline::presets::{default_preprocessor, PresetSettings};
//! use prep_pipeline::Preprocessor;
//!
//! let settings = PresetSettings {
//!     target_size: 32,
//!     ..PresetSettings::default()
//! }
//! .with_pointmap()
//! .normalize_pointmap(true);
//! let pre = Preprocessor::new(default_preprocessor(&settings).unwrap());
//!
//! let mask = Mask::from_fn(64, 48, |x, y| {
//!     vec![if (16..40).contains(&x) && (8..32).contains(&y) { 1.0 } else { 0.0 }]
//! });
//! let image = Image::filled(64, 48, &[0.8, 0.6, 0.4]);
//! let pointmap = Pointmap::from_fn(64, 48, |x, y| vec![x as f32, y as f32, 3.0]);
//!
//! let out = pre.process(image, mask, Some(pointmap)).unwrap();
//! assert_eq!(out.image.dimensions(), (32, 32));
//! assert_eq!(out.rgb_image.dimensions(), (32, 32));
//! assert_eq!(out.pointmap_params, out.rgb_pointmap_params);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
mod error;
pub mod normalizer;
pub mod output;
pub mod preprocessor;
pub mod presets;
pub mod selector;
pub mod slot;
pub mod stock;
pub mod transform;

pub use config::{PreprocessorBuilder, PreprocessorConfig, RgbStatistics, DEPRECATION_TARGET};
pub use error::{PipelineError, PipelineResult};
pub use normalizer::{NormalizationMode, PointmapNormalizer, SsiNormalizer};
pub use output::{OutputValue, PreprocessOutput};
pub use preprocessor::Preprocessor;
pub use selector::JointPath;
pub use slot::{SlotName, TransformSlot};
pub use transform::{Arity, JointTransform, RasterTransform};
