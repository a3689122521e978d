use hcard::{
    data_structures::{
        material::{LambertMaterial, hex_to_linear_rgb},
        model::MaterialUniform,
    },
    pipelines::light::{DirectionalLight, LightUniform, MAX_LIGHTS, SceneLights},
};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn should_count_the_default_card_lights() {
    let uniform = LightUniform::from(&SceneLights::default());
    assert_eq!(uniform.directional_count(), 2);
    assert_eq!(uniform.point_count(), 2);
}

#[test]
fn should_cap_lights_at_the_shader_limit() {
    let light = DirectionalLight {
        position: [0.0, 0.0, 1.0],
        color: 0xffffff,
        intensity: 1.0,
    };
    let lights = SceneLights {
        directional: vec![light; MAX_LIGHTS + 3],
        point: Vec::new(),
        ..SceneLights::default()
    };
    let uniform = LightUniform::from(&lights);
    assert_eq!(uniform.directional_count(), MAX_LIGHTS as u32);
    assert_eq!(uniform.point_count(), 0);
}

#[test]
fn should_decode_hex_colours_to_linear_light() {
    for channel in hex_to_linear_rgb(0xffffff) {
        assert_close(channel, 1.0);
    }
    assert_eq!(hex_to_linear_rgb(0x000000), [0.0, 0.0, 0.0]);
    // sRGB mid grey is roughly a fifth of the light
    let [r, g, b] = hex_to_linear_rgb(0x808080);
    assert_close(r, 0.2158);
    assert_eq!(r, g);
    assert_eq!(g, b);
}

#[test]
fn should_keep_gltf_base_colour_factors_in_the_material_uniform() {
    let material = LambertMaterial::from_linear([0.5, 0.25, 1.0, 0.75]);
    assert_eq!(material.opacity, 0.75);
    assert!(material.map.is_none());

    let uniform = MaterialUniform::from(&material);
    for (actual, expected) in uniform.color.iter().zip([0.5, 0.25, 1.0, 0.75]) {
        assert_close(*actual, expected);
    }
}

#[test]
fn should_ignore_the_colour_alpha_in_favour_of_opacity() {
    let material = LambertMaterial::new([1.0, 1.0, 1.0, 0.0]).with_opacity(0.5);
    assert_eq!(MaterialUniform::from(&material).color[3], 0.5);
}
