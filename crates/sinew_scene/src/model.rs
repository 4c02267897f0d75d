use glam::{Mat4, Vec3};
use sinew_animation::AnimationClip;
use sinew_core::{BoundingBox, NodeIndex, Result, SinewError};

use crate::import::RigDescription;
use crate::skeleton::SkeletonGraph;

/// Skinning joint.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Maps model space back into the bone's bind-pose local space.
    pub inversebind_tfm: Mat4,
    pub node_index: NodeIndex,
}

/// Bind-pose vertex with up to four bone influences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinnedVertex {
    pub position: Vec3,
    pub bones: [u32; 4],
    pub weights: [f32; 4],
}

/// A rigid (non-skinned) mesh, optionally carried by a skeleton node.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAttachment {
    pub node_index: Option<NodeIndex>,
    pub bind_bounds: BoundingBox,
    pub pose_bounds: BoundingBox,
}

/// Skeleton, bones, clips and meshes of one animated model, plus the
/// per-frame outputs consumed by the renderer.
///
/// Structure is fixed once loading is done; evaluation only rewrites the
/// global transforms, bone matrices and pose bounds.
#[derive(Debug, Clone)]
pub struct SkinnedModel {
    pub(crate) graph: SkeletonGraph,
    pub(crate) bones: Vec<Bone>,
    pub(crate) clips: Vec<AnimationClip>,
    pub(crate) meshes: Vec<MeshAttachment>,

    // === Runtime Data ===
    pub(crate) bone_matrices: Vec<Mat4>,
    pub(crate) bone_bind_bounds: Vec<BoundingBox>,
    pub(crate) bone_pose_bounds: Vec<BoundingBox>,
    pub(crate) model_bounds: BoundingBox,
}

impl SkinnedModel {
    #[must_use]
    pub fn new(mut graph: SkeletonGraph) -> Self {
        graph.reset_to_bind_pose();
        Self {
            graph,
            bones: Vec::new(),
            clips: Vec::new(),
            meshes: Vec::new(),
            bone_matrices: Vec::new(),
            bone_bind_bounds: Vec::new(),
            bone_pose_bounds: Vec::new(),
            model_bounds: BoundingBox::EMPTY,
        }
    }

    /// Builds skeleton, bones and clips from an importer description.
    pub fn from_description(desc: &RigDescription) -> Result<Self> {
        let mut model = Self::new(desc.build_graph()?);
        for bone in &desc.bones {
            model.add_bone(&bone.name, Mat4::from_cols_array(&bone.inverse_bind))?;
        }
        for clip in &desc.clips {
            let clip = clip.build_clip(&model.graph)?;
            model.add_clip(clip);
        }
        log::debug!(
            "Model loaded: {} nodes, {} bones, {} clips",
            model.graph.len(),
            model.bones.len(),
            model.clips.len()
        );
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_description(&RigDescription::from_json_str(json)?)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Registers a bone driven by node `name` and returns its index.
    pub fn add_bone(&mut self, name: &str, inversebind_tfm: Mat4) -> Result<usize> {
        let node_index = self
            .graph
            .find(name)
            .ok_or_else(|| SinewError::BoneNotFound(name.to_owned()))?;

        let bone_index = self.bones.len();
        self.graph.node_mut(node_index).bone_index = Some(bone_index);
        self.bones.push(Bone {
            name: name.to_owned(),
            inversebind_tfm,
            node_index,
        });

        let node = self.graph.node(node_index);
        self.bone_matrices.push(node.global_tfm * inversebind_tfm);
        self.bone_bind_bounds.push(BoundingBox::EMPTY);
        self.bone_pose_bounds.push(BoundingBox::EMPTY);
        Ok(bone_index)
    }

    /// Stores a clip laid out for this skeleton and returns its index.
    pub fn add_clip(&mut self, clip: AnimationClip) -> usize {
        assert_eq!(
            clip.node_count(),
            self.graph.len(),
            "clip '{}' is not laid out for this skeleton",
            clip.name
        );
        self.clips.push(clip);
        self.clips.len() - 1
    }

    /// Grows each bone's bind box by every vertex the bone influences.
    pub fn compute_bone_bind_bounds(&mut self, vertices: &[SkinnedVertex]) {
        for vertex in vertices {
            for (&bone, &weight) in vertex.bones.iter().zip(&vertex.weights) {
                if weight <= 0.0 {
                    continue;
                }
                match self.bone_bind_bounds.get_mut(bone as usize) {
                    Some(bounds) => bounds.grow_point(vertex.position),
                    None => log::warn!("Vertex references unknown bone {bone}"),
                }
            }
        }

        for (bone, bounds) in self.bones.iter().zip(&self.bone_bind_bounds) {
            if bounds.is_empty() {
                log::warn!("Bone '{}' influences no vertices, bind bounds left empty", bone.name);
            }
        }
        self.refresh_bounds();
    }

    /// Attaches a rigid mesh, carried by `node` if given, and returns its index.
    pub fn attach_mesh(&mut self, node: Option<&str>, positions: &[Vec3]) -> Result<usize> {
        let node_index = node.map(|name| self.graph.require(name)).transpose()?;
        if let Some(index) = node_index {
            self.graph.node_mut(index).nbr_meshes += 1;
        }

        let bind_bounds = BoundingBox::from_points(positions);
        self.meshes.push(MeshAttachment {
            node_index,
            bind_bounds,
            pose_bounds: bind_bounds,
        });
        self.refresh_bounds();
        Ok(self.meshes.len() - 1)
    }

    fn refresh_bounds(&mut self) {
        self.model_bounds = self
            .bone_bind_bounds
            .iter()
            .chain(self.meshes.iter().map(|m| &m.bind_bounds))
            .fold(BoundingBox::EMPTY, |acc, b| acc.union(b));
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &SkeletonGraph {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn clip(&self, index: usize) -> Result<&AnimationClip> {
        self.clips.get(index).ok_or(SinewError::ClipIndexOutOfBounds {
            index,
            count: self.clips.len(),
        })
    }

    #[must_use]
    pub fn find_clip(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[MeshAttachment] {
        &self.meshes
    }

    /// Skinning matrices indexed by bone index.
    #[inline]
    #[must_use]
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    #[inline]
    #[must_use]
    pub fn bone_bind_bounds(&self) -> &[BoundingBox] {
        &self.bone_bind_bounds
    }

    #[inline]
    #[must_use]
    pub fn bone_pose_bounds(&self) -> &[BoundingBox] {
        &self.bone_pose_bounds
    }

    #[inline]
    #[must_use]
    pub fn model_bounds(&self) -> &BoundingBox {
        &self.model_bounds
    }

    #[must_use]
    pub fn global_transform(&self, name: &str) -> Option<Mat4> {
        self.graph.node_by_name(name).map(|n| n.global_tfm)
    }
}
