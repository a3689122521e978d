use wgpu::util::DeviceExt;

use crate::data_structures::material::hex_to_linear_rgb;

/// Upper bound per light kind, matches the array sizes in `lambert.wgsl`.
pub const MAX_LIGHTS: usize = 4;

/// A light infinitely far away shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: [f32; 3],
    pub color: u32,
    pub intensity: f32,
}

/// A light radiating from `position`, fading out towards `distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub color: u32,
    pub intensity: f32,
    /// Cut-off distance, `0.0` means unlimited.
    pub distance: f32,
    pub decay: f32,
}

/// The lighting setup of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLights {
    pub ambient: u32,
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
}

impl Default for SceneLights {
    /// Soft ambient light, one key light per card side and one point light above
    /// each side.
    fn default() -> Self {
        Self {
            ambient: 0x404040,
            directional: vec![
                DirectionalLight {
                    position: [0.0, 1.0, 2.0],
                    color: 0xffffff,
                    intensity: 1.0,
                },
                DirectionalLight {
                    position: [0.0, -1.0, 2.0],
                    color: 0xffffff,
                    intensity: 1.0,
                },
            ],
            point: vec![
                PointLight {
                    position: [0.0, -5.0, 3.0],
                    color: 0xffffff,
                    intensity: 0.5,
                    distance: 30.0,
                    decay: 1.0,
                },
                PointLight {
                    position: [0.0, 5.0, 3.0],
                    color: 0xffffff,
                    intensity: 0.5,
                    distance: 30.0,
                    decay: 1.0,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct DirectionalRaw {
    // xyz: normalized direction towards the light
    direction: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct PointRaw {
    // w: cut-off distance
    position: [f32; 4],
    // w: decay exponent
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    // x: directional lights, y: point lights. Uniforms require 16 byte alignment.
    counts: [u32; 4],
    directional: [DirectionalRaw; MAX_LIGHTS],
    point: [PointRaw; MAX_LIGHTS],
}

impl LightUniform {
    pub fn directional_count(&self) -> u32 {
        self.counts[0]
    }

    pub fn point_count(&self) -> u32 {
        self.counts[1]
    }
}

impl From<&SceneLights> for LightUniform {
    fn from(lights: &SceneLights) -> Self {
        if lights.directional.len() > MAX_LIGHTS || lights.point.len() > MAX_LIGHTS {
            log::warn!("Only {MAX_LIGHTS} lights of each kind are supported, the rest is ignored");
        }
        let scaled = |hex: u32, intensity: f32, w: f32| {
            let [r, g, b] = hex_to_linear_rgb(hex);
            [r * intensity, g * intensity, b * intensity, w]
        };

        let mut directional = [DirectionalRaw::default(); MAX_LIGHTS];
        for (raw, light) in directional.iter_mut().zip(&lights.directional) {
            let direction = cgmath::Vector3::from(light.position);
            let direction = if cgmath::InnerSpace::magnitude2(direction) > 0.0 {
                cgmath::InnerSpace::normalize(direction)
            } else {
                cgmath::Vector3::unit_z()
            };
            raw.direction = direction.extend(0.0).into();
            raw.color = scaled(light.color, light.intensity, 0.0);
        }

        let mut point = [PointRaw::default(); MAX_LIGHTS];
        for (raw, light) in point.iter_mut().zip(&lights.point) {
            let [x, y, z] = light.position;
            raw.position = [x, y, z, light.distance];
            raw.color = scaled(light.color, light.intensity, light.decay);
        }

        let [r, g, b] = hex_to_linear_rgb(lights.ambient);
        Self {
            ambient: [r, g, b, 1.0],
            counts: [
                lights.directional.len().min(MAX_LIGHTS) as u32,
                lights.point.len().min(MAX_LIGHTS) as u32,
                0,
                0,
            ],
            directional,
            point,
        }
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(lights: &SceneLights, device: &wgpu::Device) -> Self {
        let uniform = LightUniform::from(lights);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replaces the lighting setup, e.g. when a flow configures the context.
    pub fn set_lights(&mut self, lights: &SceneLights, queue: &wgpu::Queue) {
        self.uniform = LightUniform::from(lights);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
