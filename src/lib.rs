//! hcard
//!
//! An interactive 3D business card: a GLB model whose named surfaces show the
//! pages of the card, an orbit camera with two page presets and a replayable
//! unfolding animation. Runs in a native window and, compiled to WASM, on a
//! `<canvas>` in the browser.
//!
//! High-level modules
//! - `animation`: keyframe sampling, play-once actions and the animation director
//! - `camera`: camera types, orbit controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, materials, meshes, instances and textures
//! - `flow`: the event loop and the flow abstraction driving it
//! - `hcard`: the card viewer: configuration, assembly, UI bindings
//! - `pipelines`: the Lambert render pipeline and the scene lights
//! - `resources`: helpers to load glTF models and textures
//! - `render`: render composition for the draw loop
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod hcard;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point of the WASM build, called when the module is instantiated.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = hcard::run() {
        log::error!("hcard stopped: {e:#}");
    }
}
