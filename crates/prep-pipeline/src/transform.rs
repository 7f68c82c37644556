//! Transform contracts.
//!
//! The pipeline never looks inside a transform. It only relies on two
//! calling contracts:
//!
//! - [`RasterTransform<M>`] - one modality in, the same modality out
//! - [`JointTransform`] - aligned modalities in, the same arity out
//!
//! A joint transform may support the dual arity `(image, mask)`, the triple
//! arity `(image, mask, pointmap)`, or both. Calling an unsupported arity
//! returns [`PipelineError::ArityMismatch`]; it is never skipped.
//!
//! Closures can be registered directly:
//!
//! ```rust
//! use prep_pipeline::transform::{dual_fn, raster_fn, JointTransform, RasterTransform};
//! use prep_core::{Image, Mask};
//!
//! let invert = raster_fn("invert", |mut mask: Mask| {
//!     mask.map_pixels(|px| px[0] = 1.0 - px[0]);
//!     Ok(mask)
//! });
//! let out = invert.apply(Mask::filled(2, 2, &[1.0])).unwrap();
//! assert_eq!(out.pixel(0, 0), &[0.0]);
//!
//! let swap = dual_fn("noop", |image: Image, mask: Mask| Ok((image, mask)));
//! assert!(swap.accepts(prep_pipeline::Arity::Dual));
//! assert!(!swap.accepts(prep_pipeline::Arity::Triple));
//! ```

use crate::{PipelineError, PipelineResult};
use prep_core::{Image, Mask, Modality, Pointmap, Raster};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Number of aligned modalities a joint transform consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// `(image, mask)`
    Dual,
    /// `(image, mask, pointmap)`
    Triple,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Dual => f.write_str("image+mask"),
            Arity::Triple => f.write_str("image+mask+pointmap"),
        }
    }
}

/// Transform applied to a single modality.
///
/// Implementations must be pure: same input, same output, no shared
/// mutable state. They may change the spatial size.
pub trait RasterTransform<M: Modality>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Applies the transform.
    fn apply(&self, input: Raster<M>) -> PipelineResult<Raster<M>>;
}

/// Transform applied jointly to aligned modalities.
///
/// Outputs must stay spatially aligned with each other. Implement the
/// arities the transform supports; the defaults reject the call.
pub trait JointTransform: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns `true` if [`apply_dual`](Self::apply_dual) or
    /// [`apply_triple`](Self::apply_triple) is implemented for `arity`.
    ///
    /// Joint slots check this for every transform before running any.
    fn accepts(&self, arity: Arity) -> bool;

    /// Applies the transform to `(image, mask)`.
    fn apply_dual(&self, image: Image, mask: Mask) -> PipelineResult<(Image, Mask)> {
        let _ = (image, mask);
        Err(PipelineError::arity_mismatch(self.name(), Arity::Dual))
    }

    /// Applies the transform to `(image, mask, pointmap)`.
    fn apply_triple(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Pointmap,
    ) -> PipelineResult<(Image, Mask, Pointmap)> {
        let _ = (image, mask, pointmap);
        Err(PipelineError::arity_mismatch(self.name(), Arity::Triple))
    }
}

/// Shared per-modality transform.
pub type SharedRasterTransform<M> = Arc<dyn RasterTransform<M>>;

/// Shared joint transform.
pub type SharedJointTransform = Arc<dyn JointTransform>;

// ============================================================================
// Closure adapters
// ============================================================================

/// Per-modality transform backed by a closure. See [`raster_fn`].
pub struct RasterFn<M, F> {
    name: String,
    f: F,
    _modality: PhantomData<fn() -> M>,
}

impl<M, F> RasterTransform<M> for RasterFn<M, F>
where
    M: Modality,
    F: Fn(Raster<M>) -> PipelineResult<Raster<M>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: Raster<M>) -> PipelineResult<Raster<M>> {
        (self.f)(input)
    }
}

/// Wraps a closure as a shared per-modality transform.
pub fn raster_fn<M, F>(name: impl Into<String>, f: F) -> SharedRasterTransform<M>
where
    M: Modality,
    F: Fn(Raster<M>) -> PipelineResult<Raster<M>> + Send + Sync + 'static,
{
    Arc::new(RasterFn {
        name: name.into(),
        f,
        _modality: PhantomData,
    })
}

/// Dual-only joint transform backed by a closure. See [`dual_fn`].
pub struct DualFn<F> {
    name: String,
    f: F,
}

impl<F> JointTransform for DualFn<F>
where
    F: Fn(Image, Mask) -> PipelineResult<(Image, Mask)> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, arity: Arity) -> bool {
        arity == Arity::Dual
    }

    fn apply_dual(&self, image: Image, mask: Mask) -> PipelineResult<(Image, Mask)> {
        (self.f)(image, mask)
    }
}

/// Wraps a closure as a shared dual-only joint transform.
pub fn dual_fn<F>(name: impl Into<String>, f: F) -> SharedJointTransform
where
    F: Fn(Image, Mask) -> PipelineResult<(Image, Mask)> + Send + Sync + 'static,
{
    Arc::new(DualFn {
        name: name.into(),
        f,
    })
}

/// Triple-only joint transform backed by a closure. See [`triple_fn`].
pub struct TripleFn<F> {
    name: String,
    f: F,
}

impl<F> JointTransform for TripleFn<F>
where
    F: Fn(Image, Mask, Pointmap) -> PipelineResult<(Image, Mask, Pointmap)> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, arity: Arity) -> bool {
        arity == Arity::Triple
    }

    fn apply_triple(
        &self,
        image: Image,
        mask: Mask,
        pointmap: Pointmap,
    ) -> PipelineResult<(Image, Mask, Pointmap)> {
        (self.f)(image, mask, pointmap)
    }
}

/// Wraps a closure as a shared triple-only joint transform.
pub fn triple_fn<F>(name: impl Into<String>, f: F) -> SharedJointTransform
where
    F: Fn(Image, Mask, Pointmap) -> PipelineResult<(Image, Mask, Pointmap)>
        + Send
        + Sync
        + 'static,
{
    Arc::new(TripleFn {
        name: name.into(),
        f,
    })
}
