//! Rig Description
//!
//! Plain-data form of what a scene importer hands over: the node hierarchy,
//! bone offsets and keyframe arrays. Matrices are column-major `[f32; 16]`,
//! rotations are `[x, y, z, w]`.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use sinew_animation::{AnimationClip, NodeKeyframes};
use sinew_core::Result;

use crate::skeleton::SkeletonGraph;

fn identity_cols() -> [f32; 16] {
    Mat4::IDENTITY.to_cols_array()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub bones: Vec<BoneDescription>,
    #[serde(default)]
    pub clips: Vec<ClipDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "identity_cols")]
    pub local: [f32; 16],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneDescription {
    pub name: String,
    #[serde(default = "identity_cols")]
    pub inverse_bind: [f32; 16],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDescription {
    pub name: String,
    pub duration_ticks: f32,
    /// Zero means unspecified.
    #[serde(default)]
    pub ticks_per_second: f32,
    #[serde(default)]
    pub channels: Vec<ChannelDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDescription {
    pub node: String,
    pub positions: Vec<[f32; 3]>,
    pub scales: Vec<[f32; 3]>,
    pub rotations: Vec<[f32; 4]>,
}

impl RigDescription {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build_graph(&self) -> Result<SkeletonGraph> {
        SkeletonGraph::build(self.nodes.iter().map(|n| {
            (
                n.name.clone(),
                n.parent.clone(),
                Mat4::from_cols_array(&n.local),
            )
        }))
    }
}

impl ClipDescription {
    /// Lays the channels out parallel to `graph`. Channels naming nodes the
    /// graph does not have are skipped.
    pub fn build_clip(&self, graph: &SkeletonGraph) -> Result<AnimationClip> {
        let mut clip = AnimationClip::new(
            self.name.clone(),
            self.duration_ticks,
            self.ticks_per_second,
            graph.len(),
        )?;

        for channel in &self.channels {
            let Some(index) = graph.find(&channel.node) else {
                log::warn!(
                    "Clip '{}' animates unknown node '{}', channel skipped",
                    self.name,
                    channel.node
                );
                continue;
            };

            let keys = NodeKeyframes::new(
                &channel.node,
                channel.positions.iter().copied().map(Vec3::from).collect(),
                channel.scales.iter().copied().map(Vec3::from).collect(),
                channel.rotations.iter().copied().map(Quat::from_array).collect(),
            )?;
            clip.set_node_keys(index.index(), keys);
        }

        log::debug!(
            "Clip '{}' loaded: {} of {} nodes animated, {:.3}s",
            clip.name,
            clip.used_count(),
            clip.node_count(),
            clip.duration_seconds()
        );
        Ok(clip)
    }
}
