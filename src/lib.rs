#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Array-backed skeleton hierarchy and skinned animation evaluation.
//!
//! ```rust,ignore
//! use sinew::{AnimationSettings, Playback, SkinnedModel};
//!
//! let mut model = SkinnedModel::from_json_str(&rig_json)?;
//! let walk = model.find_clip("walk").unwrap_or(0);
//! let mut playback = Playback::new(walk, &model.clips()[walk]);
//!
//! playback.update(1.0 / 60.0);
//! model.evaluate_playback(&playback, &AnimationSettings::default());
//! upload(model.bone_matrices());
//! ```

pub use glam;

pub use sinew_animation;
pub use sinew_core;
pub use sinew_scene;

pub use sinew_animation::{
    AnimationClip, Crossfade, DualQuat, LocalPose, LoopMode, NodeKeyframes, Playback, TimeFormat,
};
pub use sinew_core::{BoundingBox, CompactTree, NodeIndex, Result, SinewError, TreeNode};
pub use sinew_scene::{
    AnimationSettings, Bone, MeshAttachment, RigDescription, SkeletonGraph, SkeletonNode,
    SkinnedModel, SkinnedVertex,
};
