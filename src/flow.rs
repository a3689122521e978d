//! The winit event loop and the flows it drives.
//!
//! A "flow" is a self-contained part of the application that handles input, updates
//! its state and provides renderable objects each frame. The event loop owns the
//! [`Context`], drives all flows and batches what they want to draw.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is implemented by every part of the app that reacts to input and draws
//! - [`Out<E>`] lets hooks hand back futures resolving to custom events
//! - [`EventSender<S, E>`] injects custom events from outside the event loop (e.g. DOM callbacks)
//!
//! # Lifecycle Flow
//!
//! Per frame:
//! 1. Collect window/device events and pass them to the camera controller and all flows
//! 2. Poll pending flow futures and measure the time since the previous frame
//! 3. Advance the camera controller and upload the camera uniform
//! 4. Call `on_update` on all flows
//! 5. Collect the flows' renders and draw them
//! 6. Present frame and request the next one

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    data_structures::model::DrawModel,
    render::Instanced,
};

#[cfg(feature = "integration-tests")]
use crate::data_structures::texture::Texture;

pub use crate::render::Render;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

///
/// What a lifecycle hook hands back to the event loop.
///
/// `Out::FutEvent` resolves futures of events that are put in the event queue once resolved.
/// The futures never block the hook that returned them: natively they are polled once per
/// frame on the engine's tokio runtime, on wasm they are spawned on the browser's executor.
/// Nothing happens unless some flow handles the event in `on_custom_events`.
///
/// `Empty` is the default, nothing to do.
///
pub enum Out<E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    Empty,
}

impl<E> Default for Out<E> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<E> Out<E> {
    /// Shorthand for an already resolved event.
    pub fn event(event: E) -> Self
    where
        E: 'static,
    {
        Self::FutEvent(vec![Box::new(async move { event })])
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable scene or application state.
///
/// # Lifecycle
///
/// 1. `on_init()` runs once after the GPU context exists
/// 2. `on_window_events()` and `on_device_events()` see every winit event
/// 3. `on_update()` is called every frame, after the camera has been moved
/// 4. `on_custom_events()` is called for custom application events
/// 5. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// One-time setup, the only hook besides custom events with a mutable context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<E>;

    /// Called every frame with the time `dt` elapsed since the previous one.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: instant::Duration) -> Out<E>;

    /// Raw device input.
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<E>;

    /// Window input, after the camera controller has seen it.
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<E>;

    /// Handle custom application events.
    ///
    /// Flows are asked in order. Hand the event back to pass it on, `None` consumes it.
    fn on_custom_events(&mut self, ctx: &mut Context, state: &mut S, event: E) -> Option<E>;

    /// What to draw this frame.
    fn on_render(&self) -> Render<'_>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut S,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Builds a flow once the GPU exists.
///
/// Receives an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`, so flows can create GPU resources before the first frame.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

type Flows<State, Event> = Vec<Box<dyn GraphicsFlow<State, Event>>>;

/// Attachments of one frame.
///
/// With `integration-tests` the frame is drawn into an offscreen texture that can be
/// copied back to the CPU; the surface texture is still acquired and presented.
struct Frame {
    output: wgpu::SurfaceTexture,
    /// Single sampled view the frame ends up in, the MSAA target resolves into it.
    colour: wgpu::TextureView,
    /// Multisampled colour target and depth buffer replacing the context's ones when set.
    attachments: Option<(Option<wgpu::TextureView>, wgpu::TextureView)>,
    #[cfg(feature = "integration-tests")]
    capture: wgpu::Texture,
}

/// The GPU context and the user state, created once the window exists.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        Ok(Self {
            ctx: Context::new(window).await?,
            state: State::default(),
            is_surface_configured: false,
        })
    }
}

impl<State> AppState<State> {
    /// Applies a new window size right away: surface, depth buffer, projection and
    /// the controller's notion of the viewport. Zero sizes (minimised windows) are ignored.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let ctx = &mut self.ctx;
        ctx.config.width = width;
        ctx.config.height = height;
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.resize_attachments();
        ctx.projection.resize(width, height);
        ctx.camera.controller.set_viewport_height(height);
        self.is_surface_configured = true;
    }

    fn begin_frame(&self) -> Result<Frame, wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;

        #[cfg(not(feature = "integration-tests"))]
        let frame = Frame {
            colour: output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            attachments: None,
            output,
        };

        #[cfg(feature = "integration-tests")]
        let frame = {
            let ctx = &self.ctx;
            let capture = self.capture_texture(ctx.config.format, "Golden Image Test Output Texture");
            let extent = self.capture_extent();
            let size = [extent.width, extent.height];
            let depth = Texture::create_depth_texture(
                &ctx.device,
                size,
                ctx.sample_count,
                "Golden Image Test Depth Texture",
            );
            let msaa = (ctx.sample_count > 1).then(|| {
                Texture::create_attachment(
                    &ctx.device,
                    size,
                    ctx.config.format,
                    ctx.sample_count,
                    "Golden Image Test MSAA Texture",
                )
                .view
            });
            Frame {
                colour: capture.create_view(&wgpu::TextureViewDescriptor::default()),
                attachments: Some((msaa, depth.view)),
                capture,
                output,
            }
        };

        Ok(frame)
    }

    /// Records one render pass drawing every flow's render batch.
    fn draw_flows<Event>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &Frame,
        flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ) {
        let (msaa, depth) = match &frame.attachments {
            Some((msaa, depth)) => (msaa.as_ref(), depth),
            None => (
                self.ctx.msaa.as_ref().map(|target| &target.view),
                &self.ctx.depth_texture.view,
            ),
        };
        // Multisampled samples are only needed until they are resolved
        let (view, resolve_target, store) = match msaa {
            Some(msaa) => (msaa, Some(&frame.colour), wgpu::StoreOp::Discard),
            None => (&frame.colour, None, wgpu::StoreOp::Store),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut basics: Vec<Instanced> = Vec::new();
        for flow in flows {
            flow.on_render().collect_into(&mut basics);
        }

        render_pass.set_pipeline(&self.ctx.pipelines.basic);
        for instanced in basics {
            if instanced.amount == 0 || instanced.instance.size() == 0 {
                log::warn!("Skipping a render without instances");
                continue;
            }
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_model_instanced(
                instanced.model,
                0..instanced.amount as u32,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
            );
        }
    }

    fn render<Event: 'static>(
        &mut self,
        flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
        #[cfg_attr(not(feature = "integration-tests"), allow(unused_variables))] outputs: &Outputs<
            State,
            Event,
        >,
    ) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Nothing to draw into before the first resize
        if !self.is_surface_configured {
            return Ok(());
        }

        let frame = self.begin_frame()?;
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.draw_flows(&mut encoder, &frame, flows);

        #[cfg(feature = "integration-tests")]
        let readback = self.copy_capture(&mut encoder, &frame.capture);

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        if self.validate_capture(&readback, flows, &outputs.async_runtime)
            && outputs.proxy.send_event(FlowEvent::Exit).is_err()
        {
            panic!("All assertions passed but the winit event-loop could not safely exit");
        }

        frame.output.present();
        Ok(())
    }
}

#[cfg(feature = "integration-tests")]
impl<State> AppState<State> {
    /// Size of the test frame. Rows copied out of a texture must be 256 byte aligned.
    fn capture_extent(&self) -> wgpu::Extent3d {
        let align = |v: u32| v.div_ceil(256) * 256;
        wgpu::Extent3d {
            width: align(self.ctx.config.width),
            height: align(self.ctx.config.height),
            depth_or_array_layers: 1,
        }
    }

    fn capture_texture(&self, format: wgpu::TextureFormat, label: &str) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: self.capture_extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    fn copy_capture(&self, encoder: &mut wgpu::CommandEncoder, capture: &wgpu::Texture) -> wgpu::Buffer {
        let extent = self.capture_extent();
        let bytes_per_row = 4 * extent.width;
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Golden Image Test Readback"),
            size: (bytes_per_row * extent.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: capture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(extent.height),
                },
            },
            extent,
        );
        buffer
    }

    /// Hands the captured frame to every flow. Returns whether all of them passed.
    fn validate_capture<Event>(
        &mut self,
        readback: &wgpu::Buffer,
        flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
        async_runtime: &tokio::runtime::Runtime,
    ) -> bool {
        let slice = readback.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.ctx
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(instant::Duration::from_secs(3)),
            })
            .expect("GPU did not finish the test frame in time");
        async_runtime
            .block_on(rx.receive())
            .expect("map_async callback dropped")
            .expect("failed to map the test frame");

        let extent = self.capture_extent();
        let mut image = image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(
            extent.width,
            extent.height,
            slice.get_mapped_range(),
        )
        .expect("test frame buffer too small");

        let mut all_passed = true;
        for flow in flows.iter_mut() {
            match flow.render_to_texture(&self.ctx, &mut self.state, &mut image) {
                Err(e) => panic!("{e:#}"),
                Ok(ImageTestResult::Failed) => panic!("Assertion failed"),
                Ok(ImageTestResult::Waiting) => all_passed = false,
                Ok(ImageTestResult::Passed) => (),
            }
        }
        all_passed
    }
}

/// Sends custom events into a running event loop.
///
/// Obtained through [`run_with_events`]; cheap to clone, so every callback can own one.
pub struct EventSender<State: 'static, Event: 'static> {
    proxy: EventLoopProxy<FlowEvent<State, Event>>,
}

impl<State, Event> Clone for EventSender<State, Event> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
        }
    }
}

impl<State, Event> EventSender<State, Event> {
    /// Queues `event` for the flows. Returns `false` once the event loop is gone.
    pub fn send(&self, event: Event) -> bool {
        match self.proxy.send_event(FlowEvent::Custom(event)) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Event loop closed, dropping custom event");
                false
            }
        }
    }
}

/// Resolves what the flows return from their hooks.
///
/// Futures are spawned and report back through the event loop. Natively they live on a
/// `LocalSet` that [`poll`](Self::poll) advances once per frame, so a hook never waits for them.
struct Outputs<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(not(target_arch = "wasm32"))]
    pending: tokio::task::LocalSet,
    proxy: EventLoopProxy<FlowEvent<State, Event>>,
}

impl<State: 'static, Event: 'static> Outputs<State, Event> {
    fn handle(&self, out: Out<Event>) {
        let Out::FutEvent(futures) = out else {
            return;
        };
        let events = futures::future::join_all(futures.into_iter().map(Pin::from));
        let proxy = self.proxy.clone();
        let deliver = async move {
            for event in events.await {
                if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                    log::error!("Event loop was closed before all events could be processed");
                    break;
                }
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.pending.spawn_local(deliver);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(deliver);
    }

    /// Gives every pending future one turn. Blocking work inside them belongs on
    /// `spawn_blocking`, this only waits for what is ready right now.
    #[cfg(not(target_arch = "wasm32"))]
    fn poll(&self) {
        self.async_runtime
            .block_on(self.pending.run_until(tokio::task::yield_now()));
    }

    /// Calls `hook` on every flow and handles what each of them returns.
    fn dispatch(
        &self,
        flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
        app_state: &mut AppState<State>,
        mut hook: impl FnMut(
            &mut Box<dyn GraphicsFlow<State, Event>>,
            &mut Context,
            &mut State,
        ) -> Out<Event>,
    ) {
        for flow in flows.iter_mut() {
            let out = hook(flow, &mut app_state.ctx, &mut app_state.state);
            self.handle(out);
        }
    }
}

pub struct App<State: 'static, Event: 'static> {
    outputs: Outputs<State, Event>,
    state: Option<AppState<State>>,
    // Filled once the constructors resolved
    graphics_flows: Flows<State, Event>,
    // Taken on the first `resumed`
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
}

impl<State: 'static, Event: 'static> App<State, Event> {
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            outputs: Outputs {
                #[cfg(not(target_arch = "wasm32"))]
                async_runtime: tokio::runtime::Runtime::new()?,
                #[cfg(not(target_arch = "wasm32"))]
                pending: tokio::task::LocalSet::new(),
                proxy: event_loop.create_proxy(),
            },
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }

    /// Takes over the initialised context and flows and runs every flow's `on_init`.
    fn start(&mut self, mut app_state: AppState<State>, flows: Flows<State, Event>) {
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows = flows;
        self.outputs
            .dispatch(&mut self.graphics_flows, &mut app_state, |flow, ctx, state| {
                flow.on_init(ctx, state)
            });
        app_state.ctx.window.request_redraw();
        self.state = Some(app_state);
    }

    /// Moves the camera, updates the flows and draws them.
    fn frame(&mut self) {
        let Some(app_state) = &mut self.state else {
            return;
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.outputs.poll();
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        // Flows see the camera of this frame
        let ctx = &mut app_state.ctx;
        ctx.camera.controller.update(&mut ctx.camera.camera);
        ctx.write_camera();

        self.outputs
            .dispatch(&mut self.graphics_flows, app_state, |flow, ctx, state| {
                flow.on_update(ctx, state, dt)
            });

        match app_state.render(&mut self.graphics_flows, &self.outputs) {
            Ok(()) => (),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Flows<State, Event>,
    },
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { flows, .. } => f.debug_struct("Initialized").field("flows", flows).finish(),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again on some platforms, the flows are only built once.
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("hcard");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            // InitContext clones the Arcs inside Device and Queue, not the resources
            let flows = futures::future::join_all(
                constructors
                    .into_iter()
                    .map(|constructor| constructor((&app_state.ctx).into())),
            )
            .await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        match self.outputs.async_runtime.block_on(init_future) {
            Ok((app_state, flows)) => self.start(app_state, flows),
            Err(e) => {
                log::error!("App initialization failed. Cannot create the main context: {e:#}");
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.outputs.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy.send_event(FlowEvent::Initialized { state, flows }).is_err() {
                            log::error!("Event loop closed before the app was initialized");
                        }
                    }
                    Err(e) => {
                        log::error!("App initialization failed. Cannot create the main context: {e:#}")
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            // Sent by the wasm `spawn_local` in `resumed`
            FlowEvent::Initialized { state, flows } => self.start(state, flows),
            FlowEvent::Custom(custom_event) => {
                let Some(app_state) = &mut self.state else {
                    log::debug!("Dropping custom event received before initialization");
                    return;
                };
                let unconsumed = self
                    .graphics_flows
                    .iter_mut()
                    .try_fold(custom_event, |event, flow| {
                        flow.on_custom_events(&mut app_state.ctx, &mut app_state.state, event)
                    });
                if unconsumed.is_some() {
                    log::warn!("Custom event was not consumed by any flow");
                }
            }
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        let Some(app_state) = &mut self.state else {
            return;
        };
        self.outputs
            .dispatch(&mut self.graphics_flows, app_state, |flow, ctx, state| {
                flow.on_device_events(ctx, state, &event)
            });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(app_state) = &mut self.state else {
            return;
        };

        app_state.ctx.camera.controller.handle_window_events(&event);
        self.outputs
            .dispatch(&mut self.graphics_flows, app_state, |flow, ctx, state| {
                flow.on_window_events(ctx, state, &event)
            });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => app_state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.frame(),
            _ => (),
        }
    }
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {e}");
    }

    // Fails only if a logger is already installed
    #[cfg(target_arch = "wasm32")]
    let _ = console_log::init_with_level(log::Level::Info);
}

pub fn run<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    run_with_events(constructors, |_| ())
}

/// Like [`run`] but hands an [`EventSender`] to `bind_events` before the loop starts,
/// so that callbacks living outside the event loop can emit custom events.
pub fn run_with_events<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
    bind_events: impl FnOnce(EventSender<State, Event>),
) -> anyhow::Result<()> {
    init_logger();

    // Test binaries run the event loop off the main thread
    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    bind_events(EventSender {
        proxy: event_loop.create_proxy(),
    });

    let mut app = App::new(&event_loop, constructors)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
