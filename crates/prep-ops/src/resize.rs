//! Raster resize and resampling operations.
//!
//! # Filters
//!
//! - [`Filter::Nearest`] - Exact nearest-neighbour sampling, never mixes samples
//! - [`Filter::Bilinear`] - Linear interpolation (smooth but blurry)
//! - [`Filter::Bicubic`] - Cubic interpolation (sharper than bilinear)
//! - [`Filter::Lanczos3`] - High-quality sinc-based (best for downscaling)
//!
//! Masks and pointmaps should always go through [`Filter::Nearest`]: blending
//! two depths across an object edge invents geometry that was never there.
//!
//! # Example
//!
//! ```rust
//! use prep_ops::resize::{resize_f32, Filter};
//!
//! let src: Vec<f32> = vec![0.0; 64 * 64 * 3]; // 64x64 RGB
//! let dst = resize_f32(&src, 64, 64, 3, 128, 128, Filter::Lanczos3).unwrap();
//! assert_eq!(dst.len(), 128 * 128 * 3);
//! ```

use crate::{OpsError, OpsResult};
use prep_core::{Modality, Raster};
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use crate::parallel::for_each_row;

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Nearest-neighbor (fastest, no interpolation).
    Nearest,
    /// Bilinear interpolation (smooth, fast).
    Bilinear,
    /// Bicubic interpolation (sharper than bilinear).
    #[default]
    Bicubic,
    /// Lanczos-3 (high quality, best for downscaling).
    Lanczos3,
}

impl Filter {
    /// Returns the support radius for this filter.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the filter kernel at position x.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Nearest => nearest_weight(x),
            Filter::Bilinear => bilinear_weight(x),
            Filter::Bicubic => bicubic_weight(x),
            Filter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }
}

#[inline]
fn nearest_weight(x: f32) -> f32 {
    if x.abs() < 0.5 { 1.0 } else { 0.0 }
}

#[inline]
fn bilinear_weight(x: f32) -> f32 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

/// Bicubic (Mitchell-Netravali) weight function.
#[inline]
fn bicubic_weight(x: f32) -> f32 {
    // Mitchell-Netravali with B=1/3, C=1/3
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;

    let ax = x.abs();
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
            + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
            + (6.0 - 2.0 * B))
            / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

#[inline]
fn lanczos_weight(x: f32, a: f32) -> f32 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Resizes interleaved f32 samples.
///
/// [`Filter::Nearest`] takes the exact nearest-neighbour path; every other
/// filter runs a two-pass separable convolution.
///
/// # Example
///
/// ```rust
/// use prep_ops::resize::{resize_f32, Filter};
///
/// let src = vec![0.5f32; 16 * 16 * 3];
/// let dst = resize_f32(&src, 16, 16, 3, 32, 32, Filter::Bilinear).unwrap();
/// assert_eq!(dst.len(), 32 * 32 * 3);
/// ```
pub fn resize_f32(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> OpsResult<Vec<f32>> {
    let expected = src_w * src_h * channels;
    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected,
            src.len()
        )));
    }
    if src_w == 0 || src_h == 0 {
        return Err(OpsError::InvalidDimensions(
            "source size must be > 0".into(),
        ));
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(OpsError::InvalidDimensions(
            "destination size must be > 0".into(),
        ));
    }
    trace!(src_w, src_h, dst_w, dst_h, ?filter, "resize::resize_f32");

    if filter == Filter::Nearest {
        return Ok(sample_nearest(src, src_w, src_h, channels, dst_w, dst_h));
    }

    let temp = resize_horizontal(src, src_w, src_h, channels, dst_w, filter);
    Ok(resize_vertical(&temp, dst_w, src_h, channels, dst_h, filter))
}

/// Nearest-neighbour resampling.
///
/// Destination pixel `x` reads source pixel `floor(x * src_w / dst_w)`, so
/// every output sample is a copy of an input sample.
pub fn sample_nearest(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_w * dst_h * channels];
    let sx_scale = src_w as f64 / dst_w as f64;
    let sy_scale = src_h as f64 / dst_h as f64;

    for_each_row(&mut dst, dst_w * channels, |y, row| {
        let sy = ((y as f64 * sy_scale) as usize).min(src_h - 1);
        for x in 0..dst_w {
            let sx = ((x as f64 * sx_scale) as usize).min(src_w - 1);
            let src_idx = (sy * src_w + sx) * channels;
            row[x * channels..(x + 1) * channels]
                .copy_from_slice(&src[src_idx..src_idx + channels]);
        }
    });

    dst
}

fn resize_horizontal(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_w * src_h * channels];
    let scale = src_w as f32 / dst_w as f32;
    let support = filter.support() * scale.max(1.0);

    for_each_row(&mut dst, dst_w * channels, |y, row| {
        let mut sum = vec![0.0f32; channels];
        for x in 0..dst_w {
            // Map destination x to source x
            let center = (x as f32 + 0.5) * scale - 0.5;
            let left = ((center - support).floor() as isize).max(0) as usize;
            let right = ((center + support).ceil().max(0.0) as usize).min(src_w - 1);

            sum.iter_mut().for_each(|s| *s = 0.0);
            let mut weight_sum = 0.0f32;

            for sx in left..=right {
                let dist = (sx as f32 - center) / scale.max(1.0);
                let w = filter.weight(dist);
                weight_sum += w;

                let src_idx = (y * src_w + sx) * channels;
                for c in 0..channels {
                    sum[c] += src[src_idx + c] * w;
                }
            }

            if weight_sum > 0.0 {
                for c in 0..channels {
                    row[x * channels + c] = sum[c] / weight_sum;
                }
            }
        }
    });

    dst
}

fn resize_vertical(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_h: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; src_w * dst_h * channels];
    let scale = src_h as f32 / dst_h as f32;
    let support = filter.support() * scale.max(1.0);

    for_each_row(&mut dst, src_w * channels, |y, row| {
        // Map destination y to source y
        let center = (y as f32 + 0.5) * scale - 0.5;
        let top = ((center - support).floor() as isize).max(0) as usize;
        let bottom = ((center + support).ceil().max(0.0) as usize).min(src_h - 1);

        let mut sum = vec![0.0f32; channels];
        for x in 0..src_w {
            sum.iter_mut().for_each(|s| *s = 0.0);
            let mut weight_sum = 0.0f32;

            for sy in top..=bottom {
                let dist = (sy as f32 - center) / scale.max(1.0);
                let w = filter.weight(dist);
                weight_sum += w;

                let src_idx = (sy * src_w + x) * channels;
                for c in 0..channels {
                    sum[c] += src[src_idx + c] * w;
                }
            }

            if weight_sum > 0.0 {
                for c in 0..channels {
                    row[x * channels + c] = sum[c] / weight_sum;
                }
            }
        }
    });

    dst
}

#[cfg(not(feature = "parallel"))]
fn for_each_row<F>(dst: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    dst.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Resizes a raster to `width` x `height`.
///
/// Modalities that cannot be interpolated (masks, pointmaps) are always
/// resampled with [`Filter::Nearest`], whatever `filter` says.
///
/// # Example
///
/// ```rust
/// use prep_core::Mask;
/// use prep_ops::resize::{resize, Filter};
///
/// let mask = Mask::filled(8, 8, &[1.0]);
/// let big = resize(&mask, 16, 4, Filter::Nearest).unwrap();
/// assert_eq!(big.dimensions(), (16, 4));
/// ```
pub fn resize<M: Modality>(
    raster: &Raster<M>,
    width: u32,
    height: u32,
    filter: Filter,
) -> OpsResult<Raster<M>> {
    if raster.dimensions() == (width, height) {
        return Ok(raster.clone());
    }
    let filter = if M::INTERPOLABLE { filter } else { Filter::Nearest };
    debug!(
        modality = M::NAME,
        from_w = raster.width(),
        from_h = raster.height(),
        width,
        height,
        ?filter,
        "Resizing raster"
    );
    let data = resize_f32(
        raster.data(),
        raster.width() as usize,
        raster.height() as usize,
        M::CHANNELS,
        width as usize,
        height as usize,
        filter,
    )?;
    Ok(Raster::from_data(width, height, data)?)
}

/// Resizes so the shorter side equals `size`, keeping the aspect ratio.
///
/// A square input therefore comes out as `size` x `size`.
pub fn resize_short_side<M: Modality>(
    raster: &Raster<M>,
    size: u32,
    filter: Filter,
) -> OpsResult<Raster<M>> {
    if size == 0 {
        return Err(OpsError::InvalidParameter("resize size must be > 0".into()));
    }
    if raster.is_empty() {
        return Err(OpsError::InvalidDimensions(format!(
            "cannot resize empty {}",
            M::NAME
        )));
    }
    let (w, h) = fill_dimensions(
        raster.width() as usize,
        raster.height() as usize,
        size as usize,
        size as usize,
    );
    resize(raster, w as u32, h as u32, filter)
}

/// Calculates dimensions that fill the target (may crop).
///
/// # Example
///
/// ```rust
/// use prep_ops::resize::fill_dimensions;
///
/// // Fill 640x480 with 1920x1080 (crop sides)
/// let (w, h) = fill_dimensions(1920, 1080, 640, 480);
/// assert_eq!((w, h), (853, 480));
/// ```
pub fn fill_dimensions(
    src_w: usize,
    src_h: usize,
    min_w: usize,
    min_h: usize,
) -> (usize, usize) {
    let scale_w = min_w as f32 / src_w as f32;
    let scale_h = min_h as f32 / src_h as f32;
    let scale = scale_w.max(scale_h);

    let new_w = ((src_w as f32 * scale).round() as usize).max(1);
    let new_h = ((src_h as f32 * scale).round() as usize).max(1);

    (new_w, new_h)
}
