//! # prep-core
//!
//! Core types for preparing object inputs for 3D reconstruction.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - [`Modality`] - Marker trait tagging what a raster holds (RGB, mask, XYZ)
//! - [`Raster`] - Shared, copy-on-write `f32` buffer typed by modality
//! - [`Image`], [`Mask`], [`Pointmap`] - The three aligned inputs
//! - [`NormalizationParams`] - Scale/shift pair produced by pointmap normalization
//!
//! ## Design Philosophy
//!
//! Modalities are **compile-time** tags. A mask cannot be handed to a
//! function expecting a pointmap:
//!
//! ```compile_fail
//! use prep_core::{Mask, Pointmap};
//!
//! let mask: Mask = Mask::filled(64, 64, &[1.0]);
//! let bad: Pointmap = mask; // Compile error!
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! prep-core (this crate)
//!    ^
//!    |
//!    +-- prep-ops (resize, crop, pad, mask ops)
//!    +-- prep-pipeline (slots, normalizer, orchestrator)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod modality;
pub mod params;
pub mod raster;

pub use error::*;
pub use modality::*;
pub use params::*;
pub use raster::*;

/// Prelude module for convenient imports.
///
/// ```
/// use prep_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::modality::{Matte, Modality, Rgb, Xyz};
    pub use crate::params::NormalizationParams;
    pub use crate::raster::{Image, Mask, Pointmap, Raster};
}
