//! Dual Quaternions
//!
//! A unit dual quaternion `real + ε·dual` encodes a rigid motion: `real` is the
//! rotation and `dual = ½·t·real` carries the translation `t`. Interpolating
//! the pair as one value keeps rotation and translation coupled, so blending two
//! poses follows the rigid motion between them instead of sweeping the
//! translation along a straight line under an independently slerped rotation.

use glam::{Mat4, Quat, Vec3};

/// Rigid transform (rotation followed by translation), without scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualQuat {
    real: Quat,
    dual: Quat,
}

impl DualQuat {
    pub const IDENTITY: Self = Self {
        real: Quat::IDENTITY,
        dual: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
    };

    #[must_use]
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let real = rotation.normalize();
        let t = Quat::from_xyzw(translation.x, translation.y, translation.z, 0.0);
        Self {
            real,
            dual: hamilton(t, real) * 0.5,
        }
    }

    #[inline]
    #[must_use]
    pub fn real(&self) -> Quat {
        self.real
    }

    #[inline]
    #[must_use]
    pub fn dual(&self) -> Quat {
        self.dual
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.real
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        let t = hamilton(self.dual, self.real.conjugate()) * 2.0;
        Vec3::new(t.x, t.y, t.z)
    }

    /// Rescales so the real part has unit length.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let len = self.real.length();
        debug_assert!(len > 0.0, "dual quaternion with zero real part");
        Self {
            real: self.real / len,
            dual: self.dual / len,
        }
    }

    /// Normalized linear interpolation toward `other`, taking the shorter arc.
    #[must_use]
    pub fn nlerp(&self, other: &DualQuat, t: f32) -> Self {
        let sign = if self.real.dot(other.real) < 0.0 { -1.0 } else { 1.0 };
        let a = 1.0 - t;
        let b = t * sign;
        Self {
            real: self.real * a + other.real * b,
            dual: self.dual * a + other.dual * b,
        }
        .normalize()
    }

    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.real, self.translation())
    }

    #[must_use]
    pub fn transform_point3(&self, point: Vec3) -> Vec3 {
        self.real * point + self.translation()
    }
}

impl Default for DualQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product without the unit-length expectations of `Quat * Quat`.
fn hamilton(a: Quat, b: Quat) -> Quat {
    Quat::from_xyzw(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
}
