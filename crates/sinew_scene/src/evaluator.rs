//! Animation Evaluator
//!
//! Poses a [`SkinnedModel`] for one frame:
//!
//! 1. resolve the requested clips (`None` holds the bind pose),
//! 2. turn the time argument into each clip's normalized time,
//! 3. walk the skeleton in layout order, sampling or blending every node and
//!    composing it with its already-posed parent,
//! 4. derive the bone skinning matrices and bone pose bounds,
//! 5. carry rigid meshes along with their owning nodes.
//!
//! Nothing survives between calls except the outputs, which are rewritten in
//! full every time.

use glam::Mat4;
use sinew_animation::{AnimationClip, Crossfade, NodeKeyframes, Playback, TimeFormat, blend, sample};

use crate::model::SkinnedModel;
use crate::settings::AnimationSettings;

impl SkinnedModel {
    /// Poses the skeleton with `clip` at `time`, or with the bind pose when
    /// `clip` is `None`.
    ///
    /// Panics when `clip` is not a valid clip index.
    pub fn evaluate(&mut self, clip: Option<usize>, time: f32, settings: &AnimationSettings) {
        self.check_layout(settings);

        match clip {
            Some(index) => {
                let clip = resolve_clip(&self.clips, index);
                let ntime = clip.normalized_time(time, settings.time_format);
                log::trace!("Evaluating '{}' at ntime {ntime}", clip.name);
                self.graph.propagate(|index, node| {
                    sample(clip.node_keys(index.index()), &node.local_tfm, ntime)
                });
            }
            None => self.graph.reset_to_bind_pose(),
        }

        self.update_skinning(settings);
    }

    /// Poses the skeleton with a rigid blend of two clips. `frac` = 0 matches
    /// [`Self::evaluate`] with `clip0`, `frac` = 1 with `clip1`.
    ///
    /// Panics when a clip index is invalid or `frac` lies outside `[0, 1]`.
    pub fn evaluate_blend(
        &mut self,
        clip0: Option<usize>,
        clip1: Option<usize>,
        time0: f32,
        time1: f32,
        frac: f32,
        settings: &AnimationSettings,
    ) {
        assert!(
            (0.0..=1.0).contains(&frac),
            "blend fraction {frac} outside [0, 1]"
        );
        self.check_layout(settings);

        let unused = NodeKeyframes::unused();
        let clip0 = clip0.map(|i| resolve_clip(&self.clips, i));
        let clip1 = clip1.map(|i| resolve_clip(&self.clips, i));
        let ntime0 = clip0.map_or(0.0, |c| c.normalized_time(time0, settings.time_format));
        let ntime1 = clip1.map_or(0.0, |c| c.normalized_time(time1, settings.time_format));

        self.graph.propagate(|index, node| {
            let keys0 = clip0.map_or(&unused, |c| c.node_keys(index.index()));
            let keys1 = clip1.map_or(&unused, |c| c.node_keys(index.index()));
            blend(keys0, keys1, &node.local_tfm, ntime0, ntime1, frac)
        });

        self.update_skinning(settings);
    }

    /// Evaluates a [`Playback`] at its current time. Playback time is already
    /// normalized against its clip, whatever `settings` asks for.
    pub fn evaluate_playback(&mut self, playback: &Playback, settings: &AnimationSettings) {
        let settings = settings.with_time_format(TimeFormat::Normalized);
        self.evaluate(playback.clip(), playback.normalized_time(), &settings);
    }

    /// Evaluates both sides of a [`Crossfade`] blended by its current fraction.
    pub fn evaluate_crossfade(&mut self, fade: &Crossfade, settings: &AnimationSettings) {
        let settings = settings.with_time_format(TimeFormat::Normalized);
        self.evaluate_blend(
            fade.from.clip(),
            fade.to.clip(),
            fade.from.normalized_time(),
            fade.to.normalized_time(),
            fade.frac(),
            &settings,
        );
    }

    fn check_layout(&self, settings: &AnimationSettings) {
        if settings.validate_layout {
            if let Err(err) = self.graph.tree().validate() {
                panic!("skeleton layout is corrupt: {err}");
            }
        }
    }

    fn update_skinning(&mut self, settings: &AnimationSettings) {
        for (matrix, bone) in self.bone_matrices.iter_mut().zip(&self.bones) {
            *matrix = self.graph.node(bone.node_index).global_tfm * bone.inversebind_tfm;
        }

        if !settings.update_bounds {
            return;
        }
        self.model_bounds.reset();

        let bones = self.bone_matrices.iter().zip(&self.bone_bind_bounds);
        for (pose, (skin, bind)) in self.bone_pose_bounds.iter_mut().zip(bones) {
            *pose = bind.transform(&rigid_part(skin));
            self.model_bounds.grow(pose);
        }

        for mesh in &mut self.meshes {
            mesh.pose_bounds = match mesh.node_index {
                Some(node) => mesh.bind_bounds.transform(&self.graph.node(node).global_tfm),
                None => mesh.bind_bounds,
            };
            self.model_bounds.grow(&mesh.pose_bounds);
        }
    }
}

fn resolve_clip(clips: &[AnimationClip], index: usize) -> &AnimationClip {
    assert!(
        index < clips.len(),
        "clip index {index} out of range ({} clips)",
        clips.len()
    );
    &clips[index]
}

/// Rotation and translation of `matrix` with any scale dropped.
fn rigid_part(matrix: &Mat4) -> Mat4 {
    let (_, rotation, translation) = matrix.to_scale_rotation_translation();
    Mat4::from_rotation_translation(rotation, translation)
}
