//! # prep-ops
//!
//! Raster operations used by the default preprocessing transforms.
//!
//! The pipeline treats transforms as opaque functions; this crate is where
//! the stock ones get their pixels from. Every op takes and returns typed
//! [`Raster`](prep_core::Raster)s so image, mask and pointmap stay aligned
//! when the same geometry is applied to each.
//!
//! # Modules
//!
//! - [`resize`] - Filtered and nearest-neighbour resampling
//! - [`geometry`] - Crop windows and padding
//! - [`mask`] - Bounding boxes, crop boxes around a mask, background removal
//!
//! # Example
//!
//! ```rust
//! use prep_core::{Image, Mask};
//! use prep_ops::{geometry, resize, Filter};
//!
//! let image = Image::filled(40, 20, &[0.5, 0.5, 0.5]);
//! let square = geometry::pad_to_square_centered(&image).unwrap();
//! assert_eq!(square.dimensions(), (40, 40));
//!
//! let small = resize::resize_short_side(&square, 16, Filter::Bicubic).unwrap();
//! assert_eq!(small.dimensions(), (16, 16));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod geometry;
pub mod mask;
pub mod resize;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use error::{OpsError, OpsResult};
pub use geometry::Window;
pub use mask::BoundingBox;
pub use resize::Filter;
