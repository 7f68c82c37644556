//! Pointmap normalization parameters.
//!
//! A [`NormalizationParams`] maps raw pointmap coordinates into the canonical
//! range the reconstruction model expects:
//!
//! ```text
//! normalized = (point - shift) / scale
//! point      = normalized * scale + shift
//! ```
//!
//! Scale and shift are either scalar or per-axis. A scalar is stored
//! splatted across all three axes, see [`NormalizationParams::uniform`].

use glam::Vec3;

/// Scale/shift pair computed once and reused across output branches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    /// Per-axis divisor.
    pub scale: Vec3,
    /// Per-axis offset subtracted before scaling.
    pub shift: Vec3,
}

impl NormalizationParams {
    /// Creates per-axis parameters.
    #[inline]
    pub const fn new(scale: Vec3, shift: Vec3) -> Self {
        Self { scale, shift }
    }

    /// Creates parameters with a single scalar scale.
    ///
    /// ```rust
    /// use prep_core::NormalizationParams;
    /// use glam::Vec3;
    ///
    /// let p = NormalizationParams::uniform(2.0, Vec3::new(0.0, 0.0, 4.0));
    /// assert!(p.is_uniform_scale());
    /// assert_eq!(p.apply(Vec3::new(2.0, 0.0, 6.0)), Vec3::new(1.0, 0.0, 1.0));
    /// ```
    #[inline]
    pub fn uniform(scale: f32, shift: Vec3) -> Self {
        Self {
            scale: Vec3::splat(scale),
            shift,
        }
    }

    /// Parameters that leave coordinates unchanged.
    #[inline]
    pub const fn identity() -> Self {
        Self {
            scale: Vec3::ONE,
            shift: Vec3::ZERO,
        }
    }

    /// Returns `true` if all three scale components are equal.
    #[inline]
    pub fn is_uniform_scale(&self) -> bool {
        self.scale.x == self.scale.y && self.scale.y == self.scale.z
    }

    /// Maps a raw point into normalized space.
    #[inline]
    pub fn apply(&self, point: Vec3) -> Vec3 {
        (point - self.shift) / self.scale
    }

    /// Maps a normalized point back into raw space.
    #[inline]
    pub fn invert(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.shift
    }

    /// Scale as a plain array, `[x, y, z]`.
    #[inline]
    pub fn scale_array(&self) -> [f32; 3] {
        self.scale.to_array()
    }

    /// Shift as a plain array, `[x, y, z]`.
    #[inline]
    pub fn shift_array(&self) -> [f32; 3] {
        self.shift.to_array()
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let p = NormalizationParams::identity();
        let v = Vec3::new(1.5, -2.0, 3.25);
        assert_eq!(p.apply(v), v);
        assert_eq!(p.invert(v), v);
    }

    #[test]
    fn test_apply_invert() {
        let p = NormalizationParams::new(Vec3::new(2.0, 4.0, 0.5), Vec3::new(1.0, -1.0, 3.0));
        let v = Vec3::new(0.3, 7.0, -2.0);
        let back = p.invert(p.apply(v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-6);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-6);
        assert!(!p.is_uniform_scale());
    }
}
