//! Viewer shell and event loop.
//!
//! A scene is anything implementing [`SceneGfx`]. The shell owns the window,
//! the camera and the per-frame [`UniformArena`]; each frame it builds a
//! [`ViewerInput`] from the camera, lets the scene push its submissions into
//! a [`RenderInstManager`] and draws the resulting list in one pass.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and [`Context`], then drives the scene
//!    constructor to completion (tokio on native, `spawn_local` on the web)
//! 2. window events go to the camera controller, the layer toggles and the scene
//! 3. `RedrawRequested` renders a frame and advances the camera

use std::{fmt::Debug, future::Future, iter, pin::Pin, sync::Arc};

use cgmath::Matrix4;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    camera::{Camera, Projection},
    config::ViewerConfig,
    context::{Context, InitContext},
    data_structures::bounds::Frustum,
    render::{RenderInstManager, UniformArena},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything a scene may read while preparing a frame.
#[derive(Clone, Debug)]
pub struct ViewerInput {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub frustum: Frustum,
    /// Seconds since the scene was shown.
    pub time: f32,
    pub backbuffer_width: u32,
    pub backbuffer_height: u32,
}

impl ViewerInput {
    pub fn new(camera: &Camera, projection: &Projection, time: f32, width: u32, height: u32) -> Self {
        Self::from_matrices(projection.calc_matrix(), camera.calc_matrix(), time, width, height)
    }

    pub fn from_matrices(
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        time: f32,
        backbuffer_width: u32,
        backbuffer_height: u32,
    ) -> Self {
        Self {
            frustum: Frustum::from_view_projection(&(projection * view)),
            projection,
            view,
            time,
            backbuffer_width,
            backbuffer_height,
        }
    }
}

/// A named group of submissions that can be hidden without freeing anything.
pub trait Layer {
    fn name(&self) -> &str;
    fn visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
}

/// A renderable scene.
pub trait SceneGfx {
    /// Push this frame's submissions. Uniform blocks go into the manager's
    /// arena; bound resources must outlive the frame.
    fn prepare_to_render<'a>(&'a self, input: &ViewerInput, manager: &mut RenderInstManager<'a>);

    fn on_window_event(&mut self, _event: &WindowEvent) {}

    fn layers_mut(&mut self) -> Vec<&mut dyn Layer> {
        Vec::new()
    }
}

/// Builds the scene once the GPU is ready.
pub type SceneConstructor =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn SceneGfx>>>>>>;

/// Flip the visibility of layer `index`, if the scene has that many.
pub fn toggle_layer(scene: &mut dyn SceneGfx, index: usize) -> Option<bool> {
    let mut layers = scene.layers_mut();
    let layer = layers.get_mut(index)?;
    let visible = !layer.visible();
    layer.set_visible(visible);
    log::info!("Layer {} is now {}", layer.name(), if visible { "visible" } else { "hidden" });
    Some(visible)
}

fn layer_index(key: KeyCode) -> Option<usize> {
    let index = match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    };
    Some(index)
}

/// Record and submit one frame of `scene` into `target`.
///
/// Returns the number of draws issued.
#[allow(clippy::too_many_arguments)]
pub fn render_scene(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    arena: &mut UniformArena,
    scene: &dyn SceneGfx,
    input: &ViewerInput,
    target: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    clear_colour: wgpu::Color,
) -> usize {
    let mut manager = RenderInstManager::new(arena);
    scene.prepare_to_render(input, &mut manager);
    let draw_list = manager.finish(device, queue);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Render Encoder"),
    });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour),
                    store: wgpu::StoreOp::Store,
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
            ..Default::default()
        });
        draw_list.draw_on_pass(&mut render_pass);
    }
    queue.submit(iter::once(encoder.finish()));
    draw_list.visible_count()
}

/// GPU context plus the per-frame arena, created once the window exists.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) ctx: Context,
    arena: UniformArena,
    started: Instant,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let arena = UniformArena::new(&ctx.device);
        Ok(Self {
            ctx,
            arena,
            started: Instant::now(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, scene: &dyn SceneGfx) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let input = ViewerInput::new(
            &self.ctx.camera,
            &self.ctx.projection,
            self.started.elapsed().as_secs_f32(),
            self.ctx.config.width,
            self.ctx.config.height,
        );
        render_scene(
            &self.ctx.device,
            &self.ctx.queue,
            &mut self.arena,
            scene,
            &input,
            &view,
            &self.ctx.depth_texture.view,
            self.ctx.clear_colour,
        );
        output.present();
        Ok(())
    }
}

pub(crate) enum ViewerEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        scene: Box<dyn SceneGfx>,
    },
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { .. } => f.write_str("Initialized"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    state: Option<AppState>,
    scene: Option<Box<dyn SceneGfx>>,
    // taken on first resume
    constructor: Option<SceneConstructor>,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        config: ViewerConfig,
        constructor: SceneConstructor,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            state: None,
            scene: None,
            constructor: Some(constructor),
            last_time: Instant::now(),
        })
    }

    fn install(&mut self, mut state: AppState, scene: Box<dyn SceneGfx>) {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.scene = Some(scene);
    }
}

async fn init(
    window: Arc<Window>,
    config: ViewerConfig,
    constructor: SceneConstructor,
) -> anyhow::Result<(AppState, Box<dyn SceneGfx>)> {
    let state = AppState::new(window, &config).await?;
    let init_ctx = InitContext::new(&state.ctx, &state.arena, &config);
    let scene = constructor(init_ctx).await?;
    Ok((state, scene))
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructor) = self.constructor.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(self.config.title.clone());

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

        let init_future = init(window, self.config.clone(), constructor);

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init_future) {
            Ok((state, scene)) => self.install(state, scene),
            Err(e) => {
                log::error!("Could not build the scene: {e:#}");
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, scene)) => ViewerEvent::Initialized { state, scene },
                    Err(e) => ViewerEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the scene was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            // sent by the wasm `spawn_local` in `resumed`
            ViewerEvent::Initialized { state, scene } => self.install(state, scene),
            ViewerEvent::Failed(e) => {
                log::error!("Could not build the scene: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.ctx.mouse_look {
                state.ctx.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(state), Some(scene)) = (&mut self.state, &mut self.scene) else {
            return;
        };

        state.ctx.controller.handle_window_events(&event);
        scene.on_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(index) = layer_index(key) {
                    toggle_layer(&mut **scene, index);
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Right,
                ..
            } => state.ctx.mouse_look = button_state.is_pressed(),
            WindowEvent::RedrawRequested => {
                let dt: Duration = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&**scene) {
                    Ok(()) => state.ctx.controller.update(&mut state.ctx.camera, dt),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and show the scene `constructor` builds.
pub fn run(config: ViewerConfig, constructor: SceneConstructor) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, constructor)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
