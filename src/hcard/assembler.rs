//! Assigns materials to the named nodes of a loaded card.

use anyhow::bail;

use crate::{
    data_structures::{
        material::{LambertMaterial, TextureRef},
        scene_graph::SceneNode,
    },
    hcard::config::{HcardConfig, ObjectDescriptor, SurfaceDescriptor},
};

/// Picks the nodes by name prefix instead of by exact descriptor.
///
/// Only the direct children of the scene root that are meshes are considered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixRule {
    pub object_prefix: String,
    pub surface_prefix: String,
    /// Surfaces whose name ends with this suffix show `front_texture`, all others `back_texture`.
    pub front_suffix: String,
    pub front_texture: String,
    pub back_texture: String,
}

impl Default for PrefixRule {
    fn default() -> Self {
        Self {
            object_prefix: "Object".to_string(),
            surface_prefix: "Surface".to_string(),
            front_suffix: "front".to_string(),
            front_texture: "models/hcard_page1.png".to_string(),
            back_texture: "models/hcard_page2.png".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AssemblyMode {
    /// Exact node names from the configured descriptors.
    #[default]
    Descriptors,
    Prefix(PrefixRule),
}

/// Names of the nodes that received a material.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assembled {
    pub objects: Vec<String>,
    pub surfaces: Vec<String>,
}

/**
 * Gives every object node `material` and every surface node `material` with the
 * surface's texture as colour map.
 *
 * Nodes are looked up with [`SceneNode::find_by_name`], so the first match of a
 * pre-order search wins. If any descriptor matches no node the scene is left
 * untouched and an error naming all missing nodes is returned.
 */
pub fn assemble(
    scene: &mut SceneNode,
    objects: &[ObjectDescriptor],
    surfaces: &[SurfaceDescriptor],
    material: &LambertMaterial,
) -> anyhow::Result<Assembled> {
    let missing: Vec<&str> = objects
        .iter()
        .map(|object| object.name.as_str())
        .chain(surfaces.iter().map(|surface| surface.name.as_str()))
        .filter(|name| scene.find_by_name(name).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("the model has no node named {}", missing.join(", "));
    }

    let mut assembled = Assembled::default();
    for object in objects {
        if let Some(node) = scene.find_by_name_mut(&object.name) {
            set_material(node, material.clone());
            assembled.objects.push(object.name.clone());
        }
    }
    for surface in surfaces {
        if let Some(node) = scene.find_by_name_mut(&surface.name) {
            let textured = material
                .clone()
                .with_map(TextureRef::from(surface.texture_file.as_str()));
            set_material(node, textured);
            assembled.surfaces.push(surface.name.clone());
        }
    }
    Ok(assembled)
}

/// Assigns materials to the mesh children of `scene` whose names start with the
/// prefixes of `rule`. Matching nothing is not an error.
pub fn assemble_by_prefix(
    scene: &mut SceneNode,
    rule: &PrefixRule,
    material: &LambertMaterial,
) -> Assembled {
    let mut assembled = Assembled::default();
    for child in scene.children.iter_mut().filter(|child| child.is_mesh()) {
        let Some(name) = child.name.clone() else {
            continue;
        };
        if name.starts_with(&rule.object_prefix) {
            child.material = Some(material.clone());
            assembled.objects.push(name);
        } else if name.starts_with(&rule.surface_prefix) {
            let texture = if name.ends_with(&rule.front_suffix) {
                &rule.front_texture
            } else {
                &rule.back_texture
            };
            child.material = Some(
                material
                    .clone()
                    .with_map(TextureRef::from(texture.as_str())),
            );
            assembled.surfaces.push(name);
        }
    }
    assembled
}

/// Assembles `scene` the way `config` asks for.
pub fn assemble_card(scene: &mut SceneNode, config: &HcardConfig) -> anyhow::Result<Assembled> {
    let material = config.plain_material();
    match &config.assembly {
        AssemblyMode::Descriptors => assemble(scene, &config.objects, &config.surfaces, &material),
        AssemblyMode::Prefix(rule) => Ok(assemble_by_prefix(scene, rule, &material)),
    }
}

fn set_material(node: &mut SceneNode, material: LambertMaterial) {
    if !node.is_mesh() {
        log::warn!(
            "Node {} has no mesh, its material is not visible",
            node.name.as_deref().unwrap_or_default()
        );
    }
    node.material = Some(material);
}
