//! Loading of models and textures from external files.
//!
//! Parsing is split from fetching: [`load_model_gltf`] resolves the bytes of a
//! glTF/GLB file and its buffers, [`parse_gltf`] turns them into a CPU-side
//! [`GltfAsset`] without touching the GPU.

use std::path::Path;

use anyhow::{Context, bail};
use wgpu::util::DeviceExt;

use crate::{
    animation::AnimationClip,
    data_structures::{instance::Instance, model, scene_graph::SceneNode},
};

pub mod animation;
pub mod texture;

pub use texture::{load_binary, load_texture, material_layout};

/// Geometry of one glTF primitive.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveData {
    pub vertices: Vec<model::ModelVertex>,
    pub indices: Vec<u32>,
}

/// A glTF mesh: its primitives and the base colour of its first material.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<PrimitiveData>,
    pub base_color: [f32; 4],
}

/// Everything the viewer needs from a glTF file, before GPU upload.
#[derive(Clone, Debug)]
pub struct GltfAsset {
    /// Unnamed container holding the root nodes of the displayed scene.
    pub scene: SceneNode,
    pub meshes: Vec<MeshData>,
    pub clips: Vec<AnimationClip>,
}

pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<GltfAsset> {
    let gltf_bytes = load_binary(file_name)
        .await
        .with_context(|| format!("failed to load model {file_name}"))?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)
        .with_context(|| format!("failed to parse model {file_name}"))?;

    // Load buffers
    let base_dir = Path::new(file_name).parent().unwrap_or(Path::new(""));
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => bail!("{file_name} references a binary chunk it does not contain"),
            },
            gltf::buffer::Source::Uri(uri) => {
                let path = base_dir.join(uri);
                let path = path.to_string_lossy();
                let bin = load_binary(&path)
                    .await
                    .with_context(|| format!("failed to load buffer {path} of {file_name}"))?;
                buffer_data.push(bin);
            }
        }
    }

    off_thread(move || parse_gltf(&gltf, &buffer_data))
        .await?
        .with_context(|| format!("invalid model {file_name}"))
}

/// Runs CPU heavy loading work on tokio's blocking pool so the event loop keeps
/// drawing. The browser has a single thread, there it runs in place.
pub async fn off_thread<T, F>(work: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    #[cfg(not(target_arch = "wasm32"))]
    let result = tokio::task::spawn_blocking(work)
        .await
        .context("loading task panicked")?;
    #[cfg(target_arch = "wasm32")]
    let result = work();
    Ok(result)
}

/// Builds the scene graph, meshes and animation clips of a parsed glTF document.
///
/// `buffer_data` holds the contents of the document's buffers in declaration order.
/// The default scene is used, falling back to the first one.
pub fn parse_gltf(gltf: &gltf::Document, buffer_data: &[Vec<u8>]) -> anyhow::Result<GltfAsset> {
    let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        bail!("the document contains no scene");
    };

    let mut root = SceneNode::container();
    for node in scene.nodes() {
        root.add_child(to_scene_node(&node));
    }
    root.update_world_transform_all();

    let meshes = gltf
        .meshes()
        .map(|mesh| load_mesh(&mesh, buffer_data))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let clips = animation::load_clips(gltf, buffer_data);

    Ok(GltfAsset {
        scene: root,
        meshes,
        clips,
    })
}

/// The name a node is looked up by: whitespace becomes `_`, and `[ ] . : /` are
/// dropped since they separate path segments in animation track names.
/// `"Object_main.1"` is found as `"Object_main1"`.
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn to_scene_node(node: &gltf::scene::Node) -> SceneNode {
    let mut scene_node = SceneNode {
        index: Some(node.index()),
        name: node.name().map(sanitize_node_name),
        local: Instance::from(node.transform()),
        mesh: node.mesh().map(|mesh| mesh.index()),
        ..Default::default()
    };
    for child in node.children() {
        scene_node.add_child(to_scene_node(&child));
    }
    scene_node
}

fn load_mesh(mesh: &gltf::Mesh, buffer_data: &[Vec<u8>]) -> anyhow::Result<MeshData> {
    let name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let base_color = mesh
        .primitives()
        .next()
        .map(|primitive| {
            primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor()
        })
        .unwrap_or([1.0; 4]);

    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!("Skipping non-triangle primitive of mesh {name}");
            continue;
        }
        let reader =
            primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

        let Some(positions) = reader.read_positions() else {
            bail!("a primitive of mesh {name} has no positions");
        };
        let mut vertices: Vec<model::ModelVertex> = positions
            .map(|position| model::ModelVertex {
                position,
                ..Default::default()
            })
            .collect();
        if let Some(normals) = reader.read_normals() {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
        }
        if let Some(tex_coords) = reader.read_tex_coords(0) {
            vertices
                .iter_mut()
                .zip(tex_coords.into_f32())
                .for_each(|(vertex, tex_coords)| vertex.tex_coords = tex_coords);
        }

        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        primitives.push(PrimitiveData { vertices, indices });
    }

    Ok(MeshData {
        name,
        primitives,
        base_color,
    })
}

/// Uploads every primitive of `mesh` into its own vertex/index buffer pair.
pub fn upload_mesh(device: &wgpu::Device, mesh: &MeshData) -> Vec<model::Mesh> {
    mesh.primitives
        .iter()
        .enumerate()
        .map(|(idx, primitive)| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}#{} Vertex Buffer", mesh.name, idx)),
                contents: bytemuck::cast_slice(&primitive.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}#{} Index Buffer", mesh.name, idx)),
                contents: bytemuck::cast_slice(&primitive.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            model::Mesh {
                name: mesh.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: primitive.indices.len() as u32,
                material: 0,
            }
        })
        .collect()
}
