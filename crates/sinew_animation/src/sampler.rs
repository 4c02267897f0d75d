//! Keyframe Sampler
//!
//! Pure functions turning keyframes and a normalized time into a node's local
//! transform. [`sample`] reads one clip; [`blend`] reads two clips and mixes
//! their rigid parts through dual quaternions, with scale blended on the side.

use glam::{Mat4, Quat, Vec3};

use crate::dual_quat::DualQuat;
use crate::keyframes::{NodeKeyframes, sample_channel};

/// Decomposed local transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalPose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Composes Translation · Rotation · Scale.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Samples all three channels, or `None` when the clip leaves the node alone.
#[must_use]
pub fn sample_pose(keys: &NodeKeyframes, ntime: f32) -> Option<LocalPose> {
    if !keys.is_used() {
        return None;
    }
    Some(LocalPose {
        translation: sample_channel(keys.positions(), ntime),
        rotation: sample_channel(keys.rotations(), ntime),
        scale: sample_channel(keys.scales(), ntime),
    })
}

/// Local transform of one node from one clip. Unused keys return `bind_local`
/// untouched.
#[must_use]
pub fn sample(keys: &NodeKeyframes, bind_local: &Mat4, ntime: f32) -> Mat4 {
    sample_pose(keys, ntime).map_or(*bind_local, |pose| pose.to_mat4())
}

/// Local transform of one node blended between two clips.
///
/// `frac` = 0 gives the first clip, 1 the second. A side that leaves the node
/// unused contributes the bind pose; if both do, `bind_local` is returned as is.
#[must_use]
pub fn blend(
    keys0: &NodeKeyframes,
    keys1: &NodeKeyframes,
    bind_local: &Mat4,
    ntime0: f32,
    ntime1: f32,
    frac: f32,
) -> Mat4 {
    assert!(
        (0.0..=1.0).contains(&frac),
        "blend fraction {frac} outside [0, 1]"
    );

    let (pose0, pose1) = match (sample_pose(keys0, ntime0), sample_pose(keys1, ntime1)) {
        (None, None) => return *bind_local,
        (Some(p0), Some(p1)) => (p0, p1),
        (p0, p1) => {
            let bind = LocalPose::from_mat4(bind_local);
            (p0.unwrap_or(bind), p1.unwrap_or(bind))
        }
    };
    blend_poses(&pose0, &pose1, frac)
}

/// Rigid blend of two poses: rotation and translation travel together as a
/// dual quaternion, scale is lerped and applied last.
#[must_use]
pub fn blend_poses(pose0: &LocalPose, pose1: &LocalPose, frac: f32) -> Mat4 {
    let dq0 = DualQuat::from_rotation_translation(pose0.rotation, pose0.translation);
    let dq1 = DualQuat::from_rotation_translation(pose1.rotation, pose1.translation);
    let rigid = dq0.nlerp(&dq1, frac).to_mat4();
    let scale = pose0.scale.lerp(pose1.scale, frac);
    rigid * Mat4::from_scale(scale)
}
