use cgmath::Deg;

use crate::{
    camera::OrbitSettings,
    data_structures::{material::LambertMaterial, texture::TextureOptions},
    hcard::assembler::AssemblyMode,
    pipelines::light::SceneLights,
};

/// A mesh node that shows a page texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub name: String,
    /// Path below the assets directory.
    pub texture_file: String,
}

impl SurfaceDescriptor {
    pub fn new(name: &str, texture_file: &str) -> Self {
        Self {
            name: name.to_string(),
            texture_file: texture_file.to_string(),
        }
    }
}

/// A mesh node that gets the plain card material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub name: String,
}

impl ObjectDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Static description of the card and how it is presented.
#[derive(Clone, Debug)]
pub struct HcardConfig {
    pub model_file: String,
    pub surfaces: Vec<SurfaceDescriptor>,
    pub objects: Vec<ObjectDescriptor>,
    pub assembly: AssemblyMode,
    /// Colour of every assigned material, as a hex literal.
    pub material_color: u32,
    pub texture_options: TextureOptions,
    pub camera_position: [f32; 3],
    pub camera_up: [f32; 3],
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub orbit: OrbitSettings,
    pub lights: SceneLights,
    pub clear_colour: u32,
}

impl HcardConfig {
    /// The material assigned to object nodes.
    pub fn plain_material(&self) -> LambertMaterial {
        LambertMaterial::from_hex(self.material_color)
    }

    /// Distinct texture files the assembly mode needs, in declaration order.
    pub fn texture_files(&self) -> Vec<String> {
        let referenced: Vec<&String> = match &self.assembly {
            AssemblyMode::Descriptors => self
                .surfaces
                .iter()
                .map(|surface| &surface.texture_file)
                .collect(),
            AssemblyMode::Prefix(rule) => vec![&rule.front_texture, &rule.back_texture],
        };
        let mut files: Vec<String> = Vec::new();
        for file in referenced {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
        files
    }
}

impl Default for HcardConfig {
    fn default() -> Self {
        Self {
            model_file: "models/hcard3.glb".to_string(),
            surfaces: vec![
                SurfaceDescriptor::new("Surface_main_front", "models/hcard_page1.png"),
                SurfaceDescriptor::new("Surface_main_back", "models/hcard_page2.png"),
                SurfaceDescriptor::new("Surface_main_in_up", "models/hcard_page4.png"),
                SurfaceDescriptor::new("Surface_main_in_down", "models/hcard_page4.png"),
            ],
            objects: vec![
                ObjectDescriptor::new("Object_main1"),
                ObjectDescriptor::new("Object_main2"),
            ],
            assembly: AssemblyMode::Descriptors,
            // Only the low 24 bits count, this is 0xffffee
            material_color: 0xffffffee,
            texture_options: TextureOptions {
                flip_y: false,
                generate_mipmaps: true,
                // raised to the adapter's maximum once it is known
                anisotropy: 1,
            },
            camera_position: [0.0, 4.0, 2.0],
            camera_up: [0.0, 0.0, -1.0],
            fovy: Deg(30.0),
            znear: 0.1,
            zfar: 100.0,
            orbit: OrbitSettings::default(),
            lights: SceneLights::default(),
            clear_colour: 0xdfdfdf,
        }
    }
}
