use cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3};
use hcard::{
    animation::{
        ActionState, AnimationClip, AnimationDirector, Channel, Interpolation, Keyframes, Sample,
    },
    data_structures::scene_graph::SceneNode,
};

const EPSILON: f32 = 1e-5;

fn translation_channel(target: usize, interpolation: Interpolation, xs: &[(f32, f32)]) -> Channel {
    Channel {
        target,
        interpolation,
        timestamps: xs.iter().map(|(t, _)| *t).collect(),
        keyframes: Keyframes::Translation(
            xs.iter().map(|(_, x)| Vector3::new(*x, 0.0, 0.0)).collect(),
        ),
    }
}

fn translation_at(channel: &Channel, time: f32) -> Vector3<f32> {
    match channel.sample(time) {
        Some(Sample::Translation(value)) => value,
        other => panic!("expected a translation, got {other:?}"),
    }
}

fn assert_vec_close(a: Vector3<f32>, b: Vector3<f32>) {
    assert!((a - b).magnitude() < EPSILON, "{a:?} != {b:?}");
}

#[test]
fn should_hold_values_with_step_interpolation() {
    let channel = translation_channel(0, Interpolation::Step, &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(translation_at(&channel, 0.5).x, 0.0);
    assert_eq!(translation_at(&channel, 1.0).x, 1.0);
    assert_eq!(translation_at(&channel, 1.99).x, 1.0);
}

#[test]
fn should_interpolate_linearly_between_keyframes() {
    let channel = translation_channel(0, Interpolation::Linear, &[(0.0, 0.0), (1.0, 2.0), (3.0, 0.0)]);
    assert!((translation_at(&channel, 0.25).x - 0.5).abs() < EPSILON);
    assert!((translation_at(&channel, 2.0).x - 1.0).abs() < EPSILON);
}

#[test]
fn should_clamp_outside_the_keyframe_range() {
    let channel = translation_channel(0, Interpolation::Linear, &[(0.5, 3.0), (1.0, 5.0)]);
    assert_eq!(translation_at(&channel, 0.0).x, 3.0);
    assert_eq!(translation_at(&channel, 10.0).x, 5.0);
    assert_eq!(channel.duration(), 1.0);
}

#[test]
fn should_not_sample_empty_channels() {
    let channel = translation_channel(0, Interpolation::Linear, &[]);
    assert!(channel.sample(0.0).is_none());
    assert_eq!(channel.duration(), 0.0);
}

#[test]
fn should_slerp_rotations() {
    let start = Quaternion::from_angle_z(Deg(0.0f32));
    let end = Quaternion::from_angle_z(Deg(90.0f32));
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::Linear,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Rotation(vec![start, end]),
    };

    let Some(Sample::Rotation(halfway)) = channel.sample(0.5) else {
        panic!("expected a rotation");
    };
    let expected = Quaternion::from_angle_z(Deg(45.0f32));
    assert!(halfway.dot(expected).abs() > 1.0 - EPSILON);
    assert!((halfway.magnitude() - 1.0).abs() < EPSILON);
}

#[test]
fn should_use_the_shorter_arc() {
    let start = Quaternion::from_angle_z(Deg(10.0f32));
    // the same orientation as 20 degrees, with the opposite sign
    let end = -Quaternion::from_angle_z(Deg(20.0f32));
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::Linear,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Rotation(vec![start, end]),
    };

    let Some(Sample::Rotation(halfway)) = channel.sample(0.5) else {
        panic!("expected a rotation");
    };
    let expected = Quaternion::from_angle_z(Deg(15.0f32));
    assert!(halfway.dot(expected).abs() > 1.0 - EPSILON);
}

#[test]
fn should_read_cubic_spline_values_between_tangents() {
    let zero = Vector3::new(0.0, 0.0, 0.0);
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::CubicSpline,
        timestamps: vec![0.0, 1.0],
        // (in-tangent, value, out-tangent) per keyframe
        keyframes: Keyframes::Translation(vec![
            zero,
            Vector3::new(0.0, 0.0, 0.0),
            zero,
            zero,
            Vector3::new(4.0, 0.0, 0.0),
            zero,
        ]),
    };

    assert_vec_close(translation_at(&channel, 0.0), zero);
    assert_vec_close(translation_at(&channel, 0.5), Vector3::new(2.0, 0.0, 0.0));
    assert_vec_close(translation_at(&channel, 1.0), Vector3::new(4.0, 0.0, 0.0));
}

#[test]
fn should_take_the_longest_channel_as_clip_duration() {
    let clip = AnimationClip::new(
        "unfold",
        vec![
            translation_channel(0, Interpolation::Linear, &[(0.0, 0.0), (1.5, 1.0)]),
            translation_channel(1, Interpolation::Linear, &[(0.0, 0.0), (2.5, 1.0)]),
        ],
    );
    assert_eq!(clip.duration, 2.5);
}

/// A card with a page (node 1) that rests at x = 1 and an animation moving it
/// from x = 0 to x = 2 within one second.
fn animated_card() -> (SceneNode, AnimationDirector) {
    let mut root = SceneNode::container();
    let mut card = SceneNode::named("Card").with_index(0);
    card.add_child(
        SceneNode::named("Surface_main_front")
            .with_index(1)
            .with_local(Vector3::new(1.0, 0.0, 0.0).into()),
    );
    root.add_child(card);

    let clip = AnimationClip::new(
        "unfold",
        vec![translation_channel(1, Interpolation::Linear, &[(0.0, 0.0), (1.0, 2.0)])],
    );
    let director = AnimationDirector::new(vec![clip], &root);
    (root, director)
}

fn page_x(scene: &SceneNode) -> f32 {
    scene
        .find_by_index(1)
        .map(|node| node.local.position.x)
        .unwrap_or(f32::NAN)
}

#[test]
fn should_not_play_before_being_triggered() {
    let (mut scene, mut director) = animated_card();
    assert_eq!(director.actions()[0].state(), ActionState::Stopped);

    director.update(0.5, &mut scene);
    assert_eq!(page_x(&scene), 1.0);
}

#[test]
fn should_play_once_and_return_to_the_rest_pose() {
    let (mut scene, mut director) = animated_card();
    director.replay_all();

    director.update(0.25, &mut scene);
    assert!((page_x(&scene) - 0.5).abs() < EPSILON);
    assert!(director.actions()[0].is_running());

    // the last frame is clamped to the end of the clip
    director.update(5.0, &mut scene);
    assert_eq!(page_x(&scene), 2.0);
    assert_eq!(director.actions()[0].state(), ActionState::Finished);
    assert_eq!(director.actions()[0].time(), 1.0);

    director.update(0.1, &mut scene);
    assert_eq!(page_x(&scene), 1.0);
    director.update(0.1, &mut scene);
    assert_eq!(page_x(&scene), 1.0);
}

#[test]
fn should_keep_the_last_pose_when_clamped() {
    let (mut scene, mut director) = animated_card();
    director.actions_mut()[0].clamp_when_finished = true;
    director.replay_all();

    director.update(2.0, &mut scene);
    director.update(0.1, &mut scene);
    assert_eq!(page_x(&scene), 2.0);
}

#[test]
fn should_restart_from_the_beginning_on_replay() {
    let (mut scene, mut director) = animated_card();
    director.replay_all();
    director.update(0.75, &mut scene);

    director.replay_all();
    assert_eq!(director.actions()[0].time(), 0.0);
    assert!(director.actions()[0].is_running());
    director.update(0.25, &mut scene);
    assert!((page_x(&scene) - 0.5).abs() < EPSILON);

    // replaying a finished action works the same way
    director.update(2.0, &mut scene);
    director.replay_all();
    director.update(0.5, &mut scene);
    assert!((page_x(&scene) - 1.0).abs() < EPSILON);
    assert!(director.actions()[0].is_running());
}

#[test]
fn should_replay_idempotently() {
    let (mut once_scene, mut once) = animated_card();
    once.replay_all();
    once.update(0.3, &mut once_scene);

    let (mut twice_scene, mut twice) = animated_card();
    twice.replay_all();
    twice.replay_all();
    twice.update(0.3, &mut twice_scene);

    assert_eq!(page_x(&once_scene), page_x(&twice_scene));
    assert_eq!(once.actions()[0].time(), twice.actions()[0].time());
}

#[test]
fn should_propagate_animated_transforms_to_children() {
    let (mut scene, mut director) = animated_card();
    if let Some(card) = scene.find_by_name_mut("Card") {
        card.local.position = Vector3::new(0.0, 0.0, 3.0);
    }
    director.replay_all();
    director.update(0.5, &mut scene);
    scene.update_world_transform_all();

    let page = scene.find_by_index(1).expect("page exists");
    assert_vec_close(page.world.position, Vector3::new(1.0, 0.0, 3.0));
}
