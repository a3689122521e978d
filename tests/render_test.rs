use cgmath::{InnerSpace, Vector3};
use hcard::{
    context::pick_sample_count,
    data_structures::instance::Instance,
    render::{Instanced, Render},
};
use wgpu::TextureFormatFeatureFlags as Flags;

fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
    assert!((a - b).magnitude() < 1e-5, "{a:?} != {b:?}");
}

#[test]
fn should_flag_mirrored_instances() {
    assert_eq!(Instance::new().to_raw().handedness(), 1.0);

    let mirrored = Instance {
        scale: Vector3::new(-1.0, 1.0, 1.0),
        ..Instance::new()
    };
    let raw = mirrored.to_raw();
    assert_eq!(raw.handedness(), -1.0);
    // the outward normal follows the mirrored geometry
    assert_close(raw.normal_matrix() * Vector3::unit_x(), -Vector3::unit_x());
    assert_close(raw.normal_matrix() * Vector3::unit_y(), Vector3::unit_y());

    let twice_mirrored = Instance {
        scale: Vector3::new(-1.0, -1.0, 1.0),
        ..Instance::new()
    };
    assert_eq!(twice_mirrored.to_raw().handedness(), 1.0);
}

#[test]
fn should_keep_normals_perpendicular_under_non_uniform_scale() {
    let stretched = Instance {
        scale: Vector3::new(2.0, 1.0, 1.0),
        ..Instance::new()
    };
    // a diagonal face stretched along x
    let tangent = stretched.to_matrix() * Vector3::new(1.0, -1.0, 0.0).extend(0.0);
    let normal = stretched.normal_matrix() * Vector3::new(1.0, 1.0, 0.0);
    assert!(normal.dot(tangent.truncate()).abs() < 1e-5);
}

#[test]
fn should_fall_back_to_the_rotation_for_flat_scales() {
    let flat = Instance {
        scale: Vector3::new(1.0, 0.0, 1.0),
        ..Instance::new()
    };
    assert_close(flat.normal_matrix() * Vector3::unit_y(), Vector3::unit_y());
}

#[test]
fn should_antialias_when_both_targets_allow_it() {
    let resolvable = Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE;
    assert_eq!(pick_sample_count(resolvable, Flags::MULTISAMPLE_X4), 4);
    assert_eq!(pick_sample_count(Flags::MULTISAMPLE_X4, Flags::MULTISAMPLE_X4), 1);
    assert_eq!(pick_sample_count(resolvable, Flags::empty()), 1);
}

#[test]
fn should_render_nothing_for_an_empty_batch() {
    let render = Render::from(Vec::<Instanced>::new());
    assert!(matches!(render, Render::None));
    assert_eq!(render.instanced_count(), 0);
}
