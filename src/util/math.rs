//! Math type re-exports and shape-specific storage types.
//!
//! Plain vector/matrix/quaternion math comes from `glam`; this module only
//! adds the packed on-disk forms (quantized quaternions, row-major matrices,
//! axis-aligned boxes) that are laid out byte-for-byte inside the arena.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Axis-aligned bounding box, stored as six consecutive floats.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Box3F {
    pub min: Vec3,
    pub max: Vec3,
}

impl Box3F {
    /// Degenerate box at the origin.
    pub const ZERO: Self = Self { min: Vec3::ZERO, max: Vec3::ZERO };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box from a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Box3F {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Box3F {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Box3F({:?} - {:?})", self.min, self.max)
    }
}

/// Quaternion quantized to four signed 16-bit components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Quat16 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl Quat16 {
    /// Scale between unit components and stored integers.
    pub const MAX_VAL: f32 = 0x7fff as f32;

    /// Identity rotation.
    pub const IDENTITY: Self = Self { x: 0, y: 0, z: 0, w: 0x7fff };

    /// Quantize a rotation (truncating toward zero).
    pub fn from_quat(q: Quat) -> Self {
        Self {
            x: (q.x * Self::MAX_VAL) as i16,
            y: (q.y * Self::MAX_VAL) as i16,
            z: (q.z * Self::MAX_VAL) as i16,
            w: (q.w * Self::MAX_VAL) as i16,
        }
    }

    /// Expand to a floating point quaternion.
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(
            self.x as f32 / Self::MAX_VAL,
            self.y as f32 / Self::MAX_VAL,
            self.z as f32 / Self::MAX_VAL,
            self.w as f32 / Self::MAX_VAL,
        )
    }
}

/// 4x4 matrix as stored on disk: sixteen floats, row-major.
///
/// Kept separate from `glam::Mat4` because the arena only guarantees
/// 4-byte alignment.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MatrixF {
    pub m: [f32; 16],
}

impl MatrixF {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Convert to a column-major `glam` matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&self.m).transpose()
    }

    /// Build from a column-major `glam` matrix.
    pub fn from_mat4(mat: &Mat4) -> Self {
        Self { m: mat.transpose().to_cols_array() }
    }
}

impl Default for MatrixF {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_expand() {
        let mut b = Box3F::from_point(Vec3::ZERO);
        b.expand_by_point(Vec3::new(2.0, -1.0, 4.0));
        assert_eq!(b.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(2.0, 0.0, 4.0));
        assert_eq!(b.center(), Vec3::new(1.0, -0.5, 2.0));
        assert_eq!(std::mem::size_of::<Box3F>(), 24);
    }

    #[test]
    fn test_quat16_identity() {
        let q = Quat16::IDENTITY.to_quat();
        assert!((q.w - 1.0).abs() < 1e-6);
        assert_eq!(Quat16::from_quat(Quat::IDENTITY), Quat16::IDENTITY);
        assert_eq!(std::mem::size_of::<Quat16>(), 8);
    }

    #[test]
    fn test_matrix_layout() {
        let t = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let stored = MatrixF::from_mat4(&t);
        // Row-major: translation lives in the last column of each row.
        assert_eq!(stored.m[3], 1.0);
        assert_eq!(stored.m[7], 2.0);
        assert_eq!(stored.m[11], 3.0);
        assert_eq!(stored.to_mat4(), t);
    }
}
