use sinew_core::{Result, SinewError};

use crate::keyframes::NodeKeyframes;
use crate::time::{TimeFormat, resolve_time};

/// Tick rate assumed when an asset leaves it unspecified.
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// A keyframed clip over a whole skeleton.
///
/// `keyframes` is parallel to the skeleton's node array: entry `i` animates the
/// node at index `i`. Nodes the clip never touches hold
/// [`NodeKeyframes::unused`].
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    duration_ticks: f32,
    ticks_per_second: f32,
    keyframes: Vec<NodeKeyframes>,
}

impl AnimationClip {
    /// Creates a clip for a skeleton of `node_count` nodes with every node unused.
    pub fn new(
        name: impl Into<String>,
        duration_ticks: f32,
        ticks_per_second: f32,
        node_count: usize,
    ) -> Result<Self> {
        let name = name.into();
        if !(duration_ticks > 0.0 && duration_ticks.is_finite()) {
            return Err(SinewError::InvalidClip(format!(
                "'{name}' has non-positive duration {duration_ticks}"
            )));
        }

        let ticks_per_second = if ticks_per_second > 0.0 {
            ticks_per_second
        } else {
            log::debug!(
                "Clip '{name}' has no tick rate, assuming {DEFAULT_TICKS_PER_SECOND} ticks/s"
            );
            DEFAULT_TICKS_PER_SECOND
        };

        Ok(Self {
            name,
            duration_ticks,
            ticks_per_second,
            keyframes: vec![NodeKeyframes::unused(); node_count],
        })
    }

    #[inline]
    #[must_use]
    pub fn duration_ticks(&self) -> f32 {
        self.duration_ticks
    }

    #[inline]
    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    #[inline]
    #[must_use]
    pub fn duration_seconds(&self) -> f32 {
        self.duration_ticks / self.ticks_per_second
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.keyframes.len()
    }

    #[must_use]
    pub fn keyframes(&self) -> &[NodeKeyframes] {
        &self.keyframes
    }

    #[inline]
    #[must_use]
    pub fn node_keys(&self, node: usize) -> &NodeKeyframes {
        &self.keyframes[node]
    }

    pub fn set_node_keys(&mut self, node: usize, keys: NodeKeyframes) {
        assert!(
            node < self.keyframes.len(),
            "node {node} out of range for clip '{}'",
            self.name
        );
        self.keyframes[node] = keys;
    }

    /// Number of nodes this clip actually animates.
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.keyframes.iter().filter(|k| k.is_used()).count()
    }

    /// Normalized time of this clip for `time` given in `format`.
    #[must_use]
    pub fn normalized_time(&self, time: f32, format: TimeFormat) -> f32 {
        resolve_time(time, format, self.duration_ticks, self.ticks_per_second)
    }
}
