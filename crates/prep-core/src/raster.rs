//! Raster buffer types.
//!
//! This module provides [`Raster`], the single container used for every
//! modality, and the aliases the pipeline works with:
//! - [`Image`] - RGB samples
//! - [`Mask`] - Object membership
//! - [`Pointmap`] - Per-pixel XYZ coordinates
//!
//! # Memory Layout
//!
//! Rasters store `f32` samples in **row-major** order, top-to-bottom, with
//! channels interleaved:
//!
//! ```text
//! Memory: [X Y Z X Y Z X Y Z ...]  <- Row 0
//!         [X Y Z X Y Z X Y Z ...]  <- Row 1
//!         ...
//! ```
//!
//! The logical shape is reported channel-first, `(channels, height, width)`,
//! which is how the reconstruction model names its inputs.
//!
//! # Sharing
//!
//! The buffer lives behind an [`Arc`], so cloning a raster is cheap and a
//! pass-through stage hands the caller the very same buffer. Mutation goes
//! through copy-on-write.
//!
//! ```rust
//! use prep_core::{Image, Mask};
//!
//! let image = Image::filled(64, 64, &[1.0, 1.0, 1.0]);
//! let mask = Mask::filled(64, 64, &[1.0]);
//!
//! assert_eq!(image.shape(), (3, 64, 64));
//! assert_eq!(mask.shape(), (1, 64, 64));
//! assert!(image.ensure_aligned(&mask).is_ok());
//! ```

use crate::{Error, Matte, Modality, Result, Rgb, Xyz};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// RGB image raster.
pub type Image = Raster<Rgb>;

/// Object mask raster.
pub type Mask = Raster<Matte>;

/// Per-pixel 3D coordinate raster.
pub type Pointmap = Raster<Xyz>;

/// Owned `f32` raster tagged with a [`Modality`].
///
/// `Raster<M>` stores `width * height * M::CHANNELS` samples. Cloning shares
/// the buffer; use [`data_mut`](Self::data_mut) for copy-on-write access.
#[derive(Clone)]
pub struct Raster<M: Modality> {
    /// Sample buffer (Arc for cheap cloning)
    data: Arc<Vec<f32>>,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Modality marker
    _modality: PhantomData<M>,
}

impl<M: Modality> Raster<M> {
    /// Creates a raster filled with zeros.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * M::CHANNELS;
        Self {
            data: Arc::new(vec![0.0; len]),
            width,
            height,
            _modality: PhantomData,
        }
    }

    /// Creates a raster from existing samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] if `data` holds whole pixels of
    /// another channel count, [`Error::InvalidDimensions`] for any other
    /// length mismatch.
    ///
    /// # Example
    ///
    /// ```rust
    /// use prep_core::Pointmap;
    ///
    /// let pm = Pointmap::from_data(2, 1, vec![0.0, 0.0, 1.0, 1.0, 0.0, 2.0]).unwrap();
    /// assert_eq!(pm.pixel(1, 0), &[1.0, 0.0, 2.0]);
    ///
    /// assert!(Pointmap::from_data(2, 1, vec![0.0; 5]).is_err());
    /// ```
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(M::CHANNELS))
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflow"))?;
        if data.len() != expected {
            let pixels = width as usize * height as usize;
            if pixels > 0 && data.len() % pixels == 0 {
                return Err(Error::channel_mismatch(
                    M::NAME,
                    M::CHANNELS,
                    data.len() / pixels,
                ));
            }
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!(
                    "{} expects {} samples, got {}",
                    M::NAME,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            _modality: PhantomData,
        })
    }

    /// Creates a raster where every pixel equals `pixel`.
    ///
    /// # Panics
    ///
    /// Panics if `pixel.len() != M::CHANNELS`.
    pub fn filled(width: u32, height: u32, pixel: &[f32]) -> Self {
        assert_eq!(pixel.len(), M::CHANNELS, "fill pixel has wrong channel count");
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * M::CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }
        Self {
            data: Arc::new(data),
            width,
            height,
            _modality: PhantomData,
        }
    }

    /// Builds a raster by evaluating `f(x, y)` for every pixel.
    ///
    /// ```rust
    /// use prep_core::Mask;
    ///
    /// let mask = Mask::from_fn(4, 4, |x, y| vec![if x >= 2 && y >= 2 { 1.0 } else { 0.0 }]);
    /// assert_eq!(mask.pixel(3, 3), &[1.0]);
    /// assert_eq!(mask.pixel(0, 0), &[0.0]);
    /// ```
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Vec<f32>,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * M::CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                debug_assert_eq!(px.len(), M::CHANNELS);
                data.extend_from_slice(&px[..M::CHANNELS]);
            }
        }
        Self {
            data: Arc::new(data),
            width,
            height,
            _modality: PhantomData,
        }
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of channels per pixel.
    #[inline]
    pub const fn channels(&self) -> usize {
        M::CHANNELS
    }

    /// Returns the channel-first shape `(channels, height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (M::CHANNELS, self.height as usize, self.width as usize)
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if the raster has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the raw samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns mutable samples, cloning the buffer first if it is shared.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Consumes the raster and returns its samples.
    ///
    /// Avoids a copy when the buffer is not shared.
    pub fn into_vec(self) -> Vec<f32> {
        Arc::try_unwrap(self.data).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Returns `true` if both rasters share the same buffer.
    #[inline]
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * M::CHANNELS
    }

    /// Returns the samples of pixel (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let offset = self.offset(x, y);
        &self.data[offset..offset + M::CHANNELS]
    }

    /// Returns the pixel at (x, y), or `None` if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x < self.width && y < self.height {
            Some(self.pixel(x, y))
        } else {
            None
        }
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds or `pixel` has the wrong length.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: &[f32]) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let offset = self.offset(x, y);
        self.data_mut()[offset..offset + M::CHANNELS].copy_from_slice(pixel);
    }

    /// Returns a row of samples.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        debug_assert!(y < self.height, "row out of bounds");
        let start = y as usize * self.width as usize * M::CHANNELS;
        &self.data[start..start + self.width as usize * M::CHANNELS]
    }

    /// Iterates over pixels in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(M::CHANNELS)
    }

    /// Applies a function to each pixel in place.
    pub fn map_pixels<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [f32]),
    {
        for chunk in self.data_mut().chunks_exact_mut(M::CHANNELS) {
            f(chunk);
        }
    }

    /// Checks that `other` has the same spatial size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] otherwise.
    pub fn ensure_aligned<N: Modality>(&self, other: &Raster<N>) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(
                self.dimensions(),
                other.dimensions(),
            ));
        }
        Ok(())
    }
}

impl<M: Modality> PartialEq for Raster<M> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.data, &other.data) || self.data == other.data)
    }
}

impl<M: Modality> fmt::Debug for Raster<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("modality", &M::NAME)
            .field("shape", &self.shape())
            .finish()
    }
}
