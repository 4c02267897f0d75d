use glam::{Quat, Vec3};
use sinew_core::{Result, SinewError};

use crate::values::Interpolatable;

/// Keyframes a clip holds for one skeleton node.
///
/// Each channel has its own key count: assets frequently key rotation every
/// frame while position carries a single key. Keys are evenly spread over the
/// clip, so the first key sits at normalized time 0 and the last at 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeKeyframes {
    positions: Vec<Vec3>,
    scales: Vec<Vec3>,
    rotations: Vec<Quat>,
    is_used: bool,
}

impl NodeKeyframes {
    /// Keys for a node the clip never touches. Sampling it yields the bind pose.
    #[must_use]
    pub fn unused() -> Self {
        Self::default()
    }

    /// Builds a used entry. Every channel needs at least one key; `node` only
    /// names the node in the error.
    pub fn new(
        node: &str,
        positions: Vec<Vec3>,
        scales: Vec<Vec3>,
        rotations: Vec<Quat>,
    ) -> Result<Self> {
        let empty = |channel| SinewError::EmptyChannel {
            node: node.to_owned(),
            channel,
        };
        if positions.is_empty() {
            return Err(empty("position"));
        }
        if scales.is_empty() {
            return Err(empty("scale"));
        }
        if rotations.is_empty() {
            return Err(empty("rotation"));
        }

        Ok(Self {
            positions,
            scales,
            rotations: rotations.into_iter().map(Quat::normalize).collect(),
            is_used: true,
        })
    }

    #[inline]
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.is_used
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[must_use]
    pub fn scales(&self) -> &[Vec3] {
        &self.scales
    }

    #[must_use]
    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }
}

/// Samples an evenly spaced key sequence at normalized time `ntime`.
///
/// The floating key index is `ntime * (len - 1)`; the upper neighbour is
/// clamped to the last key.
#[must_use]
pub fn sample_channel<T: Interpolatable>(keys: &[T], ntime: f32) -> T {
    debug_assert!(!keys.is_empty(), "keyframe channel has no keys");

    let last = keys.len() - 1;
    let idx = ntime.max(0.0) * last as f32;
    let lower = (idx.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let t = idx - lower as f32;

    if lower == upper {
        return keys[lower];
    }
    T::interpolate_linear(keys[lower], keys[upper], t)
}
