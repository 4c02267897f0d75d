//! Skeleton graph, skinned model and per-frame animation evaluation.

pub mod evaluator;
pub mod import;
pub mod model;
pub mod settings;
pub mod skeleton;

pub use import::{BoneDescription, ChannelDescription, ClipDescription, NodeDescription, RigDescription};
pub use model::{Bone, MeshAttachment, SkinnedModel, SkinnedVertex};
pub use settings::AnimationSettings;
pub use skeleton::{SkeletonGraph, SkeletonNode};
