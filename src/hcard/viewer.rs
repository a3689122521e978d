//! The flow displaying the card.

use std::collections::HashMap;

use anyhow::Context as _;

use crate::{
    animation::{AnimationClip, AnimationDirector},
    camera::Camera,
    context::{BufferWriter, Context, InitContext},
    data_structures::{scene_graph::SceneNode, texture::TextureOptions},
    flow::{FlowConstructor, GraphicsFlow, Out},
    hcard::{
        CameraPreset, HcardEvent, LoadStatus, LoadedCard,
        assembler::{Assembled, assemble_card},
        config::HcardConfig,
        model::HcardModel,
        ui,
    },
    render::Render,
    resources::{load_model_gltf, load_texture},
};

/// Moves the camera straight to `preset`. Target, up vector and the
/// controller's pending input are left alone.
pub fn jump_to(camera: &mut Camera, preset: CameraPreset) {
    camera.position = preset.position();
}

/// Session state of the card viewer.
///
/// Before the card is loaded the viewer renders nothing and ignores animation
/// requests; camera jumps work at any time.
#[derive(Debug)]
pub struct HcardViewer {
    config: HcardConfig,
    init: Option<InitContext>,
    scene: Option<SceneNode>,
    model: Option<HcardModel>,
    director: Option<AnimationDirector>,
    status: LoadStatus,
}

impl HcardViewer {
    /// A viewer that has not started loading. `on_init` only starts the load when the
    /// viewer was built with [`with_init`](Self::with_init).
    pub fn new(config: HcardConfig) -> Self {
        Self {
            config,
            init: None,
            scene: None,
            model: None,
            director: None,
            status: LoadStatus::Loading,
        }
    }

    pub fn with_init(mut self, init: InitContext) -> Self {
        self.init = Some(init);
        self
    }

    /// Flow constructor for [`flow::run`](crate::flow::run).
    pub fn constructor(config: HcardConfig) -> FlowConstructor<(), HcardEvent> {
        Box::new(move |init: InitContext| {
            Box::pin(async move {
                let flow: Box<dyn GraphicsFlow<(), HcardEvent>> =
                    Box::new(HcardViewer::new(config).with_init(init));
                flow
            })
        })
    }

    pub fn config(&self) -> &HcardConfig {
        &self.config
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn scene(&self) -> Option<&SceneNode> {
        self.scene.as_ref()
    }

    pub fn director(&self) -> Option<&AnimationDirector> {
        self.director.as_ref()
    }

    /**
     * Assembles `scene` and builds the animation director for `clips`.
     *
     * This is the CPU half of finishing a load; the GPU upload happens in
     * `on_custom_events` once this succeeded. On error nothing is installed.
     */
    pub fn install_scene(
        &mut self,
        mut scene: SceneNode,
        clips: Vec<AnimationClip>,
    ) -> anyhow::Result<Assembled> {
        let assembled =
            assemble_card(&mut scene, &self.config).context("failed to assemble the card")?;
        scene.update_world_transform_all();
        log::info!(
            "Assembled {} objects and {} surfaces, {} animation clips",
            assembled.objects.len(),
            assembled.surfaces.len(),
            clips.len()
        );
        self.director = Some(AnimationDirector::new(clips, &scene));
        self.scene = Some(scene);
        Ok(assembled)
    }

    /// Restarts every animation. Returns `false` and does nothing if no card is loaded yet.
    pub fn replay_animation(&mut self) -> bool {
        match &mut self.director {
            Some(director) => {
                director.replay_all();
                true
            }
            None => {
                log::debug!("Animation requested before the card was loaded");
                false
            }
        }
    }

    /// Advances the animations by `dt` seconds and recomputes the world transforms.
    pub fn advance(&mut self, dt: f32) {
        if let (Some(director), Some(scene)) = (&mut self.director, &mut self.scene) {
            director.update(dt, scene);
            scene.update_world_transform_all();
        }
    }

    fn finish_load(&mut self, ctx: &Context, card: LoadedCard) -> anyhow::Result<()> {
        let LoadedCard { asset, textures } = card;
        self.install_scene(asset.scene, asset.clips)?;
        let Some(scene) = &self.scene else {
            return Ok(());
        };
        match HcardModel::new(
            &ctx.device,
            &ctx.queue,
            scene,
            &asset.meshes,
            &textures,
            &ctx.material_layout,
        ) {
            Ok(model) => {
                self.model = Some(model);
                Ok(())
            }
            Err(e) => {
                self.scene = None;
                self.director = None;
                Err(e)
            }
        }
    }

    fn fail(&mut self, error: anyhow::Error) {
        log::error!("Loading the card failed: {error:#}");
        self.status = LoadStatus::Failed(format!("{error:#}"));
    }

    fn show_status(&self, ctx: &Context) {
        let message = self.status.message();
        #[cfg(target_arch = "wasm32")]
        {
            let _ = ctx;
            ui::show_status(message.as_deref());
        }
        #[cfg(not(target_arch = "wasm32"))]
        match message {
            Some(message) => ctx.window().set_title(&format!("hcard - {message}")),
            None => ctx.window().set_title("hcard"),
        }
    }
}

async fn load_card(
    model_file: String,
    texture_files: Vec<String>,
    options: TextureOptions,
    init: InitContext,
) -> anyhow::Result<LoadedCard> {
    let textures = futures::future::try_join_all(
        texture_files
            .iter()
            .map(|file| load_texture(file, options, &init.device, &init.queue)),
    );
    let (asset, textures) = futures::future::try_join(load_model_gltf(&model_file), textures).await?;
    Ok(LoadedCard {
        asset,
        textures: texture_files.into_iter().zip(textures).collect::<HashMap<_, _>>(),
    })
}

impl GraphicsFlow<(), HcardEvent> for HcardViewer {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<HcardEvent> {
        ctx.set_clear_colour_hex(self.config.clear_colour);
        ctx.camera.camera = Camera::new(self.config.camera_position, self.config.camera_up);
        ctx.camera.controller.settings = self.config.orbit;
        ctx.projection.fovy = self.config.fovy.into();
        ctx.projection.znear = self.config.znear;
        ctx.projection.zfar = self.config.zfar;
        ctx.light.set_lights(&self.config.lights, &ctx.queue);
        ctx.write_camera();
        self.show_status(ctx);

        let Some(init) = self.init.clone() else {
            return Out::Empty;
        };
        let options = TextureOptions {
            anisotropy: init.max_anisotropy,
            ..self.config.texture_options
        };
        log::info!("Loading {}", self.config.model_file);
        let load = load_card(
            self.config.model_file.clone(),
            self.config.texture_files(),
            options,
            init,
        );
        Out::FutEvent(vec![Box::new(async move {
            HcardEvent::AssetLoaded(load.await)
        })])
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        _: &mut (),
        dt: instant::Duration,
    ) -> Out<HcardEvent> {
        self.advance(dt.as_secs_f32());
        self.write_to_buffer(ctx);
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut (),
        _: &winit::event::DeviceEvent,
    ) -> Out<HcardEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut (),
        event: &winit::event::WindowEvent,
    ) -> Out<HcardEvent> {
        match ui::key_event(event) {
            Some(event) => Out::event(event),
            None => Out::Empty,
        }
    }

    fn on_custom_events(
        &mut self,
        ctx: &mut Context,
        _: &mut (),
        event: HcardEvent,
    ) -> Option<HcardEvent> {
        match event {
            HcardEvent::JumpTo(preset) => jump_to(&mut ctx.camera.camera, preset),
            HcardEvent::ReplayAnimation => {
                self.replay_animation();
            }
            HcardEvent::AssetLoaded(result) => {
                match result.and_then(|card| self.finish_load(ctx, card)) {
                    Ok(()) => self.status = LoadStatus::Ready,
                    Err(e) => self.fail(e),
                }
                self.show_status(ctx);
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        match &self.model {
            Some(model) => model.get_render().into(),
            None => Render::None,
        }
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut (),
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<crate::flow::ImageTestResult, anyhow::Error> {
        Ok(crate::flow::ImageTestResult::Waiting)
    }
}

impl BufferWriter for HcardViewer {
    fn write_to_buffer(&mut self, ctx: &Context) {
        if let (Some(model), Some(scene)) = (&self.model, &self.scene) {
            model.write_to_buffers(&ctx.queue, scene);
        }
    }
}
