//! GPU side of an assembled card.
//!
//! Every mesh node of the scene graph becomes one [`Model`] with a single
//! material and a one-element instance buffer holding the node's world transform.

use std::collections::HashMap;

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::LambertMaterial,
        model::{Material, Model},
        scene_graph::SceneNode,
        texture::Texture,
    },
    render::Instanced,
    resources::{MeshData, upload_mesh},
};

#[derive(Debug)]
pub struct NodeModel {
    /// glTF index of the node this model is drawn for.
    pub node: usize,
    pub model: Model,
    pub instance_buffer: wgpu::Buffer,
}

#[derive(Debug)]
pub struct HcardModel {
    nodes: Vec<NodeModel>,
}

impl HcardModel {
    /**
     * Uploads the meshes of all mesh nodes in `scene`.
     *
     * Nodes without an assigned material keep the base colour of their glTF mesh.
     * Colour maps are taken from `textures`, keyed by the path in the material's
     * [`TextureRef`](crate::data_structures::material::TextureRef).
     */
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneNode,
        meshes: &[MeshData],
        textures: &HashMap<String, Texture>,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<Self> {
        let white = Texture::create_solid([255; 4], "white", device, queue);

        let mut mesh_nodes: Vec<&SceneNode> = Vec::new();
        scene.visit(&mut |node| {
            if node.is_mesh() && node.index.is_some() {
                mesh_nodes.push(node);
            }
        });

        let mut nodes = Vec::with_capacity(mesh_nodes.len());
        for node in mesh_nodes {
            let (Some(index), Some(mesh_index)) = (node.index, node.mesh) else {
                continue;
            };
            let mesh = meshes
                .get(mesh_index)
                .with_context(|| format!("node {index} references missing mesh {mesh_index}"))?;
            let name = node.name.clone().unwrap_or_else(|| mesh.name.clone());

            let material = node
                .material
                .clone()
                .unwrap_or_else(|| LambertMaterial::from_linear(mesh.base_color));
            let map = match &material.map {
                Some(texture_ref) => textures
                    .get(&texture_ref.path)
                    .with_context(|| format!("texture {} was not loaded", texture_ref.path))?,
                None => &white,
            };

            let model = Model {
                meshes: upload_mesh(device, mesh),
                materials: vec![Material::new(device, &name, &material, map, layout)],
            };
            let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{name} Instance Buffer")),
                contents: bytemuck::cast_slice(&[node.world.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            nodes.push(NodeModel {
                node: index,
                model,
                instance_buffer,
            });
        }
        log::info!("Uploaded {} mesh nodes", nodes.len());

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[NodeModel] {
        &self.nodes
    }

    /// Copies the current world transforms of `scene` into the instance buffers.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue, scene: &SceneNode) {
        for node_model in &self.nodes {
            if let Some(node) = scene.find_by_index(node_model.node) {
                queue.write_buffer(
                    &node_model.instance_buffer,
                    0,
                    bytemuck::cast_slice(&[node.world.to_raw()]),
                );
            }
        }
    }

    pub fn get_render(&self) -> Vec<Instanced<'_>> {
        self.nodes
            .iter()
            .map(|node_model| Instanced {
                instance: &node_model.instance_buffer,
                model: &node_model.model,
                amount: 1,
            })
            .collect()
    }
}
