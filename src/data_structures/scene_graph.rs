//! Scene graph and hierarchical scene organization.
//!
//! A loaded glTF scene is turned into a tree of [`SceneNode`]s. Nodes keep the
//! name assigned in the authoring tool, their local transform, an optional mesh
//! and an optional material. The tree holds no GPU resources, so it can be
//! searched, assembled and animated without a device.

use crate::data_structures::{instance::Instance, material::LambertMaterial};

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    /// Index of the node in the source glTF document. `None` for synthetic containers.
    pub index: Option<usize>,
    pub name: Option<String>,
    pub local: Instance,
    pub world: Instance,
    /// Index into the mesh list of the asset this node was loaded from.
    pub mesh: Option<usize>,
    pub material: Option<LambertMaterial>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates an unnamed container node.
    pub fn container() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_local(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /**
     * Finds the first descendant whose name equals `name`.
     *
     * The search is a pre-order traversal in child order: a child is compared before
     * its own subtree is searched, and the whole subtree is searched before the next
     * sibling. `self` is not compared.
     */
    pub fn find_by_name(&self, name: &str) -> Option<&SceneNode> {
        for child in &self.children {
            if child.name.as_deref() == Some(name) {
                return Some(child);
            }
            if let Some(found) = child.find_by_name(name) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable counterpart of [`find_by_name`](Self::find_by_name) with the same search order.
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        for child in self.children.iter_mut() {
            if child.name.as_deref() == Some(name) {
                return Some(child);
            }
            if let Some(found) = child.find_by_name_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// Finds the node that was created from the glTF node with `index`.
    pub fn find_by_index_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        if self.index == Some(index) {
            Some(self)
        } else {
            self.children
                .iter_mut()
                .find_map(|child| child.find_by_index_mut(index))
        }
    }

    pub fn find_by_index(&self, index: usize) -> Option<&SceneNode> {
        if self.index == Some(index) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by_index(index))
    }

    /// Visits `self` and all descendants in pre-order.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /**
     * Recomputes the world transforms of `self` and all descendants.
     *
     * `parent` is the world transform of the node above `self`, use `Instance::default()`
     * for the root.
     */
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    pub fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Instance::default());
    }
}
