//! Render pipelines and the lighting resources they bind.
//!
//! - `basic` builds the opaque Lambert pipeline used for all meshes
//! - `light` holds the scene lights uniform (ambient, directional and point lights)

pub mod basic;
pub mod light;

/// All pipelines owned by the [`Context`](crate::context::Context).
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
}
