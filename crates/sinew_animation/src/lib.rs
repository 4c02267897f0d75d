//! Keyframe storage, sampling and two-clip rigid blending.

pub mod clip;
pub mod dual_quat;
pub mod keyframes;
pub mod playback;
pub mod sampler;
pub mod time;
pub mod values;

pub use clip::{AnimationClip, DEFAULT_TICKS_PER_SECOND};
pub use dual_quat::DualQuat;
pub use keyframes::{NodeKeyframes, sample_channel};
pub use playback::{Crossfade, LoopMode, Playback};
pub use sampler::{LocalPose, blend, blend_poses, sample, sample_pose};
pub use time::{TimeFormat, normalized_time};
pub use values::Interpolatable;
