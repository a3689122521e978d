//! Camera, projection and the orbit controller.
//!
//! The camera is a plain eye/target/up triple. The [`CameraController`] orbits it
//! around its target: every frame it re-derives spherical coordinates from the
//! current camera position, so moving the camera directly (e.g. to a preset)
//! needs no further bookkeeping.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Quaternion, Rad, Rotation, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(position: P, up: V) -> Self {
        Self {
            position: position.into(),
            target: Point3::origin(),
            up: up.into(),
        }
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Behaviour of the orbit controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per frame when damping is enabled.
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub enable_rotate: bool,
    pub rotate_speed: f32,
    /// Panning moves the orbit target; the card viewer keeps it disabled.
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.5,
            enable_zoom: true,
            zoom_speed: 1.0,
            enable_rotate: true,
            rotate_speed: 1.0,
            enable_pan: false,
            min_distance: 2.0,
            max_distance: 20.0,
        }
    }
}

/// Orbit/zoom controller for a [`Camera`].
///
/// Input handlers only accumulate deltas; [`update`](Self::update) applies them once per frame.
#[derive(Clone, Debug)]
pub struct CameraController {
    pub settings: OrbitSettings,
    /// Pending (azimuth, polar) rotation in radians.
    rotate_delta: (f32, f32),
    /// Pending distance factor, `1.0` means no zoom.
    scale: f32,
    rotating: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    /// Viewport height in pixels, used to turn cursor motion into angles.
    viewport_height: f32,
}

impl CameraController {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            rotate_delta: (0.0, 0.0),
            scale: 1.0,
            rotating: false,
            last_cursor: None,
            viewport_height: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Queues a rotation by `azimuth` around the up axis and `polar` towards it.
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        if !self.settings.enable_rotate {
            return;
        }
        self.rotate_delta.0 -= azimuth;
        self.rotate_delta.1 -= polar;
    }

    /// Queues a zoom step. Positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        if !self.settings.enable_zoom || steps == 0.0 {
            return;
        }
        let factor = 0.95f32.powf(self.settings.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else {
            self.scale /= factor;
        }
    }

    /// Cursor motion in pixels while dragging.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        let full_turn = 2.0 * PI * self.settings.rotate_speed / self.viewport_height;
        self.rotate(full_turn * dx as f32, full_turn * dy as f32);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = *state == ElementState::Pressed;
                if !self.rotating {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.rotating {
                    if let Some(last) = self.last_cursor {
                        self.handle_mouse(position.x - last.x, position.y - last.y);
                    }
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
                };
                self.zoom(steps);
            }
            WindowEvent::Resized(size) => self.set_viewport_height(size.height),
            _ => (),
        }
    }

    /**
     * Moves `camera` according to the pending input and makes it face its target.
     *
     * The spherical coordinates are measured in a frame where `camera.up` is the pole.
     * With damping only `damping_factor` of the pending rotation is applied and the
     * rest decays over the following frames.
     */
    pub fn update(&mut self, camera: &mut Camera) {
        let up = if camera.up.magnitude2() > EPS {
            camera.up.normalize()
        } else {
            Vector3::unit_y()
        };
        let to_y_up = Quaternion::from_arc(up, Vector3::unit_y(), Some(Vector3::unit_x()));
        let from_y_up = to_y_up.invert();

        let offset = to_y_up.rotate_vector(camera.position - camera.target);
        let radius = offset.magnitude();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > EPS {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let (d_theta, d_phi) = self.rotate_delta;
        if self.settings.enable_damping {
            theta += d_theta * self.settings.damping_factor;
            phi += d_phi * self.settings.damping_factor;
        } else {
            theta += d_theta;
            phi += d_phi;
        }
        phi = phi.clamp(EPS, PI - EPS);
        let radius = (radius * self.scale)
            .clamp(self.settings.min_distance, self.settings.max_distance);

        let sin_phi = phi.sin();
        let offset = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + from_y_up.rotate_vector(offset);

        if self.settings.enable_damping {
            let decay = 1.0 - self.settings.damping_factor;
            self.rotate_delta = (d_theta * decay, d_phi * decay);
        } else {
            self.rotate_delta = (0.0, 0.0);
        }
        self.scale = 1.0;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

/// GPU side of the camera plus the CPU state it is computed from.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}
