//! The business card viewer built on top of the engine.
//!
//! - `config` holds the static description of the card: model, surfaces, camera, lights
//! - `assembler` assigns materials and page textures to the named nodes of a loaded model
//! - `model` owns the GPU side of an assembled card
//! - `ui` turns buttons and keys into [`HcardEvent`]s
//! - `viewer` is the [`GraphicsFlow`](crate::flow::GraphicsFlow) tying it all together

use std::collections::HashMap;

use cgmath::Point3;

use crate::{data_structures::texture::Texture, resources::GltfAsset};

pub mod assembler;
pub mod config;
pub mod model;
pub mod ui;
pub mod viewer;

pub use assembler::{AssemblyMode, assemble, assemble_by_prefix};
pub use config::{HcardConfig, ObjectDescriptor, SurfaceDescriptor};
pub use viewer::{HcardViewer, jump_to};

/// Fixed camera positions showing one page of the card each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraPreset {
    Page1,
    Page2,
}

impl CameraPreset {
    pub fn position(self) -> Point3<f32> {
        match self {
            CameraPreset::Page1 => Point3::new(0.0, 4.0, 2.0),
            CameraPreset::Page2 => Point3::new(0.0, -4.0, 2.0),
        }
    }
}

/// Everything fetched for a card before it is assembled and uploaded.
#[derive(Debug)]
pub struct LoadedCard {
    pub asset: GltfAsset,
    /// Page textures keyed by the path they were loaded from.
    pub textures: HashMap<String, Texture>,
}

/// Custom events of the viewer.
#[derive(Debug)]
pub enum HcardEvent {
    JumpTo(CameraPreset),
    ReplayAnimation,
    AssetLoaded(anyhow::Result<LoadedCard>),
}

/// Progress of the card load, shown to the user when it fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_ready(&self) -> bool {
        *self == LoadStatus::Ready
    }

    /// Text for a status banner, `None` once everything is in place.
    pub fn message(&self) -> Option<String> {
        match self {
            LoadStatus::Loading => Some("Loading card...".to_string()),
            LoadStatus::Ready => None,
            LoadStatus::Failed(reason) => Some(format!("Could not load the card: {reason}")),
        }
    }
}

/// Opens the viewer with the default card and runs until the window is closed.
pub fn run() -> anyhow::Result<()> {
    crate::flow::run_with_events(
        vec![HcardViewer::constructor(HcardConfig::default())],
        |sender| {
            #[cfg(target_arch = "wasm32")]
            if let Err(e) = ui::bind_buttons(&sender) {
                log::error!("Could not bind the page buttons: {e:#}");
            }
            #[cfg(not(target_arch = "wasm32"))]
            drop(sender);
        },
    )
}
