//! Animation evaluator tests
//!
//! Tests for:
//! - Bind pose and single clip evaluation
//! - Parent → child transform propagation
//! - Two clip blending endpoints
//! - Bone skinning matrices and pose bounding boxes
//! - Playback / crossfade driven evaluation

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};
use sinew::{
    AnimationClip, AnimationSettings, BoundingBox, Crossfade, LoopMode, NodeKeyframes, Playback,
    SinewError, SkeletonGraph, SkinnedModel, SkinnedVertex, TimeFormat,
};

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn mat4_approx(a: Mat4, b: Mat4) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn position_of(model: &SkinnedModel, name: &str) -> Vec3 {
    model.global_transform(name).unwrap().w_axis.truncate()
}

fn settings() -> AnimationSettings {
    AnimationSettings::default().with_validation(true)
}

/// Root ── Upper ── Lower
///     └── Prop
///
/// Upper and Lower are bones; Lower sits two units along +X.
fn arm_model() -> SkinnedModel {
    let graph = SkeletonGraph::build([
        ("Root".to_owned(), None, Mat4::IDENTITY),
        ("Upper".to_owned(), Some("Root".to_owned()), Mat4::from_translation(Vec3::X)),
        ("Lower".to_owned(), Some("Upper".to_owned()), Mat4::from_translation(Vec3::X)),
        ("Prop".to_owned(), Some("Root".to_owned()), Mat4::from_translation(Vec3::Z)),
    ])
    .unwrap();

    let mut model = SkinnedModel::new(graph);
    let upper_bind = model.global_transform("Upper").unwrap();
    let lower_bind = model.global_transform("Lower").unwrap();
    model.add_bone("Upper", upper_bind.inverse()).unwrap();
    model.add_bone("Lower", lower_bind.inverse()).unwrap();
    model
}

/// Rotates Root a quarter turn about Z; two seconds long.
fn turn_clip(model: &SkinnedModel) -> AnimationClip {
    let mut clip = AnimationClip::new("turn", 50.0, 25.0, model.graph().len()).unwrap();
    let root = model.graph().find("Root").unwrap();
    let keys = NodeKeyframes::new(
        "Root",
        vec![Vec3::ZERO],
        vec![Vec3::ONE],
        vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
    )
    .unwrap();
    clip.set_node_keys(root.index(), keys);
    clip
}

/// Slides Upper from x = 1 to x = 5; four seconds long.
fn slide_clip(model: &SkinnedModel) -> AnimationClip {
    let mut clip = AnimationClip::new("slide", 100.0, 25.0, model.graph().len()).unwrap();
    let upper = model.graph().find("Upper").unwrap();
    let keys = NodeKeyframes::new(
        "Upper",
        vec![Vec3::X, Vec3::new(5.0, 0.0, 0.0)],
        vec![Vec3::ONE],
        vec![Quat::IDENTITY],
    )
    .unwrap();
    clip.set_node_keys(upper.index(), keys);
    clip
}

fn animated_model() -> SkinnedModel {
    let mut model = arm_model();
    let turn = turn_clip(&model);
    let slide = slide_clip(&model);
    model.add_clip(turn);
    model.add_clip(slide);
    model
}

// ============================================================================
// Bind pose
// ============================================================================

#[test]
fn bind_pose_gives_identity_skinning() {
    init_logger();
    let mut model = animated_model();
    model.evaluate(None, 0.0, &settings());

    assert_eq!(model.bone_matrices().len(), 2);
    for matrix in model.bone_matrices() {
        assert!(mat4_approx(*matrix, Mat4::IDENTITY));
    }
    assert!(vec3_approx(position_of(&model, "Lower"), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn bones_link_back_to_nodes() {
    let model = arm_model();
    let lower = model.graph().node_by_name("Lower").unwrap();
    assert_eq!(lower.bone_index, Some(1));
    assert_eq!(model.graph().node_by_name("Prop").unwrap().bone_index, None);
    assert_eq!(model.bones()[0].node_index, model.graph().find("Upper").unwrap());
}

#[test]
fn unknown_bone_is_rejected() {
    let mut model = arm_model();
    let err = model.add_bone("Tail", Mat4::IDENTITY).unwrap_err();
    assert!(matches!(err, SinewError::BoneNotFound(name) if name == "Tail"));
}

// ============================================================================
// Single clip
// ============================================================================

#[test]
fn parent_rotation_carries_children() {
    let mut model = animated_model();
    // One second into a two second clip: ntime 0.5, so Root turned 45°.
    model.evaluate(Some(0), 1.0, &settings());
    let half = std::f32::consts::FRAC_1_SQRT_2 * 2.0;
    assert!(vec3_approx(position_of(&model, "Lower"), Vec3::new(half, half, 0.0)));

    model.evaluate(Some(0), 0.999_999 * 2.0, &settings());
    assert!(vec3_approx(position_of(&model, "Lower"), Vec3::new(0.0, 2.0, 0.0)));
    assert!(vec3_approx(position_of(&model, "Prop"), Vec3::Z));
}

#[test]
fn unused_nodes_keep_bind_local() {
    let mut model = animated_model();
    model.evaluate(Some(1), 2.0, &settings());

    // Upper slid to x = 3, Lower follows at its bind offset.
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(3.0, 0.0, 0.0)));
    assert!(vec3_approx(position_of(&model, "Lower"), Vec3::new(4.0, 0.0, 0.0)));
    assert!(vec3_approx(position_of(&model, "Root"), Vec3::ZERO));
}

#[test]
fn normalized_time_format() {
    let mut model = animated_model();
    let settings = settings().with_time_format(TimeFormat::Normalized);
    model.evaluate(Some(1), 0.25, &settings);
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn time_wraps_past_clip_end() {
    let mut a = animated_model();
    let mut b = animated_model();
    a.evaluate(Some(1), 1.0, &settings());
    b.evaluate(Some(1), 9.0, &settings());
    assert!(mat4_approx(a.bone_matrices()[1], b.bone_matrices()[1]));
}

#[test]
fn skinning_matrix_is_global_times_inverse_bind() {
    let mut model = animated_model();
    model.evaluate(Some(0), 0.5, &settings());

    for (bone, matrix) in model.bones().iter().zip(model.bone_matrices()) {
        let global = model.graph().node(bone.node_index).global_tfm;
        assert!(mat4_approx(*matrix, global * bone.inversebind_tfm));
    }
}

#[test]
fn evaluation_visits_parents_before_children() {
    let model = animated_model();
    let tree = model.graph().tree();
    let mut seen = vec![false; tree.len()];
    tree.traverse_progressive_all(|_, _, index, parent| {
        if let Some(parent) = parent {
            assert!(seen[parent.index()]);
        }
        seen[index.index()] = true;
    });
}

#[test]
#[should_panic(expected = "out of range")]
fn invalid_clip_index_panics() {
    let mut model = animated_model();
    model.evaluate(Some(7), 0.0, &settings());
}

// ============================================================================
// Blending
// ============================================================================

#[test]
fn blend_endpoints_match_single_clip() {
    let mut single = animated_model();
    let mut blended = animated_model();

    single.evaluate(Some(0), 0.7, &settings());
    blended.evaluate_blend(Some(0), Some(1), 0.7, 1.3, 0.0, &settings());
    for (a, b) in single.bone_matrices().iter().zip(blended.bone_matrices()) {
        assert!(mat4_approx(*a, *b));
    }

    single.evaluate(Some(1), 1.3, &settings());
    blended.evaluate_blend(Some(0), Some(1), 0.7, 1.3, 1.0, &settings());
    for (a, b) in single.bone_matrices().iter().zip(blended.bone_matrices()) {
        assert!(mat4_approx(*a, *b));
    }
}

#[test]
fn blend_with_bind_pose() {
    let mut model = animated_model();
    // Upper at x = 5 (end of slide) mixed halfway with its bind x = 1.
    let settings = settings().with_time_format(TimeFormat::Normalized);
    model.evaluate_blend(Some(1), None, 1.0, 0.0, 0.5, &settings);
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
#[should_panic(expected = "outside [0, 1]")]
fn blend_fraction_is_checked() {
    let mut model = animated_model();
    model.evaluate_blend(Some(0), Some(1), 0.0, 0.0, -0.1, &settings());
}

// ============================================================================
// Bounds
// ============================================================================

fn skinned_vertices() -> Vec<SkinnedVertex> {
    vec![
        SkinnedVertex {
            position: Vec3::new(1.0, -0.5, 0.0),
            bones: [0, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        },
        SkinnedVertex {
            position: Vec3::new(2.0, 0.5, 0.0),
            bones: [0, 1, 0, 0],
            weights: [0.5, 0.5, 0.0, 0.0],
        },
        SkinnedVertex {
            position: Vec3::new(3.0, 0.5, 0.0),
            bones: [1, 9, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        },
    ]
}

#[test]
fn bind_bounds_follow_weighted_vertices() {
    init_logger();
    let mut model = animated_model();
    model.compute_bone_bind_bounds(&skinned_vertices());

    let upper = model.bone_bind_bounds()[0];
    let lower = model.bone_bind_bounds()[1];
    assert_eq!(upper, BoundingBox::new(Vec3::new(1.0, -0.5, 0.0), Vec3::new(2.0, 0.5, 0.0)));
    assert_eq!(lower, BoundingBox::new(Vec3::new(2.0, 0.5, 0.0), Vec3::new(3.0, 0.5, 0.0)));
    assert_eq!(model.model_bounds().min, Vec3::new(1.0, -0.5, 0.0));
    assert_eq!(model.model_bounds().max, Vec3::new(3.0, 0.5, 0.0));
}

#[test]
fn pose_bounds_move_with_bones() {
    let mut model = animated_model();
    model.compute_bone_bind_bounds(&skinned_vertices());
    model.evaluate(Some(1), 2.0, &settings());

    // Upper moved +2 along X, Lower with it.
    let upper = model.bone_pose_bounds()[0];
    assert!(vec3_approx(upper.min, Vec3::new(3.0, -0.5, 0.0)));
    assert!(vec3_approx(upper.max, Vec3::new(4.0, 0.5, 0.0)));
    assert!(vec3_approx(model.model_bounds().max, Vec3::new(5.0, 0.5, 0.0)));
}

#[test]
fn pose_bounds_ignore_bone_scale() {
    let mut model = animated_model();
    model.compute_bone_bind_bounds(&skinned_vertices());
    let mut clip = AnimationClip::new("grow", 10.0, 25.0, model.graph().len()).unwrap();
    let upper = model.graph().find("Upper").unwrap();
    clip.set_node_keys(
        upper.index(),
        NodeKeyframes::new("Upper", vec![Vec3::X], vec![Vec3::splat(4.0)], vec![Quat::IDENTITY]).unwrap(),
    );
    let grow = model.add_clip(clip);

    model.evaluate(Some(grow), 0.0, &settings());

    // Skin = T(1)·S(4)·T(-1): the box moves by the translation column
    // (-3, 0, 0) but keeps its bind size.
    let bind = model.bone_bind_bounds()[0];
    let pose = model.bone_pose_bounds()[0];
    assert!(vec3_approx(pose.size(), bind.size()));
    assert!(vec3_approx(pose.min, Vec3::new(-2.0, -0.5, 0.0)));
}

#[test]
fn mesh_bounds_follow_owner_node() {
    let mut model = animated_model();
    let cube = [Vec3::splat(-0.5), Vec3::splat(0.5)];
    let on_prop = model.attach_mesh(Some("Prop"), &cube).unwrap();
    let loose = model.attach_mesh(None, &cube).unwrap();
    assert_eq!(model.graph().node_by_name("Prop").unwrap().nbr_meshes, 1);

    model.evaluate(Some(0), 1.999_999, &settings());

    // Prop sits on +Z and the quarter turn about Z leaves it there.
    let carried = model.meshes()[on_prop].pose_bounds;
    assert!(vec3_approx(carried.center(), Vec3::Z));
    assert_eq!(model.meshes()[loose].pose_bounds, model.meshes()[loose].bind_bounds);
    assert!(model.model_bounds().contains_point(Vec3::new(0.0, 0.0, 1.5)));
}

#[test]
fn attach_mesh_to_unknown_node_fails() {
    let mut model = animated_model();
    assert!(matches!(
        model.attach_mesh(Some("Ghost"), &[Vec3::ZERO]),
        Err(SinewError::NodeNotFound(_))
    ));
    assert!(model.meshes().is_empty());
}

#[test]
fn disabled_bounds_keep_previous_boxes() {
    let mut model = animated_model();
    model.compute_bone_bind_bounds(&skinned_vertices());
    model.evaluate(None, 0.0, &settings());
    let before = *model.model_bounds();

    model.evaluate(Some(1), 2.0, &settings().with_bounds(false));
    assert_eq!(*model.model_bounds(), before);
    // Matrices are still produced.
    assert!(vec3_approx(model.bone_matrices()[0].w_axis.truncate(), Vec3::new(2.0, 0.0, 0.0)));
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn playback_drives_evaluation_in_seconds() {
    let mut model = animated_model();
    let mut playback = Playback::new(1, &model.clips()[1]);
    playback.update(1.0);
    playback.update(1.0);

    let normalized = settings().with_time_format(TimeFormat::Normalized);
    model.evaluate_playback(&playback, &normalized);
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
fn playback_loop_modes() {
    let model = animated_model();
    let clip = &model.clips()[0];

    let mut looping = Playback::new(0, clip);
    looping.update(2.5);
    assert!((looping.time() - 0.5).abs() < EPSILON);

    let mut once = Playback::new(0, clip).with_loop_mode(LoopMode::Once);
    once.update(3.0);
    assert!((once.time() - 2.0).abs() < EPSILON);
    assert!(once.paused);

    let mut ping = Playback::new(0, clip).with_loop_mode(LoopMode::PingPong);
    ping.update(2.5);
    assert!((ping.time() - 1.5).abs() < EPSILON);

    let mut reverse = Playback::new(0, clip).with_time_scale(-1.0);
    reverse.update(0.5);
    assert!((reverse.time() - 1.5).abs() < EPSILON);
}

#[test]
fn once_playback_holds_last_pose() {
    let mut model = animated_model();
    let mut once = Playback::new(1, &model.clips()[1]).with_loop_mode(LoopMode::Once);

    once.update(3.9);
    model.evaluate_playback(&once, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(4.9, 0.0, 0.0)));

    once.update(1.0);
    assert!(once.paused);
    model.evaluate_playback(&once, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn ping_pong_turnaround_holds_last_pose() {
    let mut model = animated_model();
    let mut ping = Playback::new(1, &model.clips()[1]).with_loop_mode(LoopMode::PingPong);

    ping.update(4.0);
    model.evaluate_playback(&ping, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(5.0, 0.0, 0.0)));

    ping.update(1.0);
    model.evaluate_playback(&ping, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(4.0, 0.0, 0.0)));
}

#[test]
fn crossfade_into_finished_once_holds_last_pose() {
    let mut model = animated_model();
    let mut to = Playback::new(1, &model.clips()[1]).with_loop_mode(LoopMode::Once);
    to.set_time(4.0);
    let fade = Crossfade::new(Playback::bind_pose(), to, 0.0);

    model.evaluate_crossfade(&fade, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn bind_pose_playback() {
    let mut model = animated_model();
    let mut playback = Playback::bind_pose();
    playback.update(3.0);
    assert_eq!(playback.clip(), None);

    model.evaluate_playback(&playback, &settings());
    assert!(vec3_approx(position_of(&model, "Lower"), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn crossfade_moves_from_source_to_target() {
    let mut model = animated_model();
    let from = Playback::new(1, &model.clips()[1]);
    let to = Playback::bind_pose();
    let mut fade = Crossfade::new(from, to, 1.0);

    fade.update(0.5);
    assert!((fade.frac() - 0.5).abs() < EPSILON);
    model.evaluate_crossfade(&fade, &settings());
    // Slide at 0.5 s puts Upper at x = 1.5; halfway back to bind x = 1.
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::new(1.25, 0.0, 0.0)));

    fade.update(1.0);
    assert!(fade.is_finished());
    model.evaluate_crossfade(&fade, &settings());
    assert!(vec3_approx(position_of(&model, "Upper"), Vec3::X));
}

#[test]
fn find_clip_by_name() {
    let model = animated_model();
    assert_eq!(model.find_clip("slide"), Some(1));
    assert_eq!(model.find_clip("run"), None);

    assert_eq!(model.clip(0).unwrap().name, "turn");
    assert!(matches!(
        model.clip(2),
        Err(SinewError::ClipIndexOutOfBounds { index: 2, count: 2 })
    ));
}
