//! The GPU and window context shared by all flows.
//!
//! [`Context`] owns the surface, device and queue together with the camera,
//! projection, lights and pipelines. Flows get mutable access to it in
//! `on_init` and when handling custom events; everywhere else it is read-only.

use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, CameraController, CameraResources, CameraUniform, OrbitSettings, Projection},
    data_structures::{material::hex_to_linear_rgb, texture},
    pipelines::{
        Pipelines,
        basic::mk_basic_pipeline,
        light::{LightResources, SceneLights},
    },
    resources::material_layout,
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    /// Multisampled colour target resolved into the surface, `None` without MSAA.
    pub(crate) msaa: Option<texture::Texture>,
    /// Samples per pixel of the colour and depth targets.
    pub sample_count: u32,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    /// Layout of the material bind group (group 0) of the basic pipeline.
    pub material_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    /// Highest anisotropic filtering level the adapter supports, `1` if none.
    pub max_anisotropy: u16,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter found")?;
        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("failed to request a graphics device")?;

        let max_anisotropy = if adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::ANISOTROPIC_FILTERING)
        {
            16
        } else {
            1
        };

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are shaded in linear space, the surface has to encode them to sRGB.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = pick_sample_count(
            adapter.get_texture_format_features(config.format).flags,
            adapter
                .get_texture_format_features(texture::Texture::DEPTH_FORMAT)
                .flags,
        );
        log::debug!("Drawing with {sample_count} samples per pixel");

        let camera = camera::Camera::new((0.0, 4.0, 2.0), (0.0, 0.0, -1.0));
        let projection =
            camera::Projection::new(config.width, config.height, cgmath::Deg(30.0), 0.1, 100.0);
        let mut camera_controller = CameraController::new(OrbitSettings::default());
        camera_controller.set_viewport_height(config.height);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let (depth_texture, msaa) = create_attachments(&device, &config, sample_count);

        let light = LightResources::new(&SceneLights::default(), &device);
        let material_layout = material_layout(&device);
        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                &config,
                sample_count,
                &material_layout,
                &light.bind_group_layout,
                &camera.bind_group_layout,
            ),
        };

        Ok(Self {
            window,
            depth_texture,
            msaa,
            sample_count,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            material_layout,
            clear_colour: wgpu::Color::BLACK,
            max_anisotropy,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Recreates the depth buffer and the MSAA target at the surface size.
    pub(crate) fn resize_attachments(&mut self) {
        let (depth_texture, msaa) = create_attachments(&self.device, &self.config, self.sample_count);
        self.depth_texture = depth_texture;
        self.msaa = msaa;
    }

    /// Sets the clear colour from an sRGB hex literal such as `0xdfdfdf`.
    pub fn set_clear_colour_hex(&mut self, hex: u32) {
        let [r, g, b] = hex_to_linear_rgb(hex);
        self.clear_colour = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
    }

    /// Writes the current camera state into the camera uniform buffer.
    pub fn write_camera(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
    }
}

/// 4x MSAA like a browser canvas with antialiasing, if both targets support it
/// and the colour target can be resolved. Otherwise a single sample.
pub fn pick_sample_count(
    colour: wgpu::TextureFormatFeatureFlags,
    depth: wgpu::TextureFormatFeatureFlags,
) -> u32 {
    let x4 = wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4;
    if colour.contains(x4 | wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE) && depth.contains(x4) {
        4
    } else {
        1
    }
}

fn create_attachments(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> (texture::Texture, Option<texture::Texture>) {
    let size = [config.width, config.height];
    let depth = texture::Texture::create_depth_texture(device, size, sample_count, "depth_texture");
    let msaa = (sample_count > 1).then(|| {
        texture::Texture::create_attachment(device, size, config.format, sample_count, "msaa_texture")
    });
    (depth, msaa)
}

/// The handles a flow constructor needs to create GPU resources before the
/// [`Context`] is handed out.
///
/// `Device` and `Queue` are reference counted, cloning them is cheap.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub max_anisotropy: u16,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            max_anisotropy: ctx.max_anisotropy,
        }
    }
}

/// Implemented by everything that mirrors CPU state into GPU buffers once per frame.
pub trait BufferWriter {
    fn write_to_buffer(&mut self, ctx: &Context);
}
