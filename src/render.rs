//! Render composition.
//!
//! Flows describe what to draw each frame with the [`Render`] enum. The render
//! loop flattens all flows' renders into one batch for the Lambert pipeline, so a
//! flow never touches the render pass itself.

use crate::data_structures::model::Model;

/// Data for instanced object rendering: a model and the instance buffer holding its transforms.
#[derive(Clone, Copy)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Specifies how a flow's objects should be rendered.
///
/// `None` renders nothing, `Defaults` draws the models with the Lambert pipeline.
pub enum Render<'a> {
    None,
    Defaults(Vec<Instanced<'a>>),
}

impl<'a> Render<'a> {
    /// Moves the draws of `self` into the batch of the basic pipeline.
    pub(crate) fn collect_into(self, basics: &mut Vec<Instanced<'a>>) {
        if let Render::Defaults(mut vec) = self {
            basics.append(&mut vec);
        }
    }

    /// Number of instanced draws this render would issue.
    pub fn instanced_count(&self) -> usize {
        match self {
            Render::None => 0,
            Render::Defaults(vec) => vec.len(),
        }
    }
}

impl<'a> From<Vec<Instanced<'a>>> for Render<'a> {
    fn from(instanced: Vec<Instanced<'a>>) -> Self {
        if instanced.is_empty() {
            Render::None
        } else {
            Render::Defaults(instanced)
        }
    }
}
