//! Data structures of the viewer: scene graph, materials, meshes, textures and transforms.
//!
//! - `instance` holds per-node transformation data and its GPU layout
//! - `material` contains CPU-side material descriptions assigned by name
//! - `model` contains GPU meshes, material bind groups and draw helpers
//! - `scene_graph` is the hierarchical node tree of a loaded asset
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
