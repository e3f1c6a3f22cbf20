use crate::config::{ViewerConfig, ViewerConfigOverrides, DEFAULT_CONFIG_PATH};
use crate::input::{Input, InputEvent, ViewerAction};
use crate::render_loop::RenderLoop;
use crate::renderer::Renderer;
use crate::scene::SurfaceSize;
use crate::selection::SelectionChannel;
use crate::viewer::ViewerController;

use anyhow::{Context, Result};
use std::path::Path;
use std::rc::Rc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};

const INPUT_BINDINGS_PATH: &str = "config/input.json";

pub async fn run() -> Result<()> {
    run_with_overrides(ViewerConfigOverrides::default()).await
}

pub async fn run_with_overrides(overrides: ViewerConfigOverrides) -> Result<()> {
    run_with_config(DEFAULT_CONFIG_PATH, overrides).await
}

pub async fn run_with_config(config_path: impl AsRef<Path>, overrides: ViewerConfigOverrides) -> Result<()> {
    let mut config = ViewerConfig::load_or_default(config_path);
    if !overrides.is_empty() {
        log::info!("command-line overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, Rc::new(SelectionChannel::new()));
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

/// Window host: owns the renderer and forwards input to the viewer.
pub struct App {
    config: ViewerConfig,
    channel: Rc<SelectionChannel>,
    renderer: Renderer,
    viewer: Option<ViewerController>,
    render_loop: RenderLoop,
    input: Input,
    should_close: bool,
}

impl App {
    /// `channel` is shared with whatever drives selections besides the keyboard.
    pub fn new(config: ViewerConfig, channel: Rc<SelectionChannel>) -> Self {
        let renderer = Renderer::new(&config.window, config.render.sample_count());
        Self {
            config,
            channel,
            renderer,
            viewer: None,
            render_loop: RenderLoop::new(),
            input: Input::from_config(INPUT_BINDINGS_PATH),
            should_close: false,
        }
    }

    fn logical_size(&self, size: PhysicalSize<u32>) -> SurfaceSize {
        let scale = self.renderer.window().map(|w| w.scale_factor()).unwrap_or(1.0);
        let logical = size.to_logical::<f64>(scale);
        SurfaceSize::new(logical.width.round() as u32, logical.height.round() as u32)
    }

    fn handle_input(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let height = viewer.scene().surface.size.height;
        if let Some((dx, dy)) = self.input.take_drag_delta() {
            viewer.scene_mut().controls.rotate(dx, dy, height);
        }
        if let Some(wheel) = self.input.consume_wheel_delta() {
            viewer.scene_mut().controls.zoom(wheel);
        }
        for action in self.input.drain_actions() {
            match action {
                ViewerAction::SelectPart(category) => viewer.select_part(category.part_name()),
                ViewerAction::NextColor => {
                    viewer.step_color(1);
                }
                ViewerAction::PreviousColor => {
                    viewer.step_color(-1);
                }
                ViewerAction::Stop => self.render_loop.handle().stop(),
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.renderer.ensure_window(event_loop) {
            log::error!("Renderer initialization error: {err:#}");
            self.should_close = true;
            return;
        }
        if self.viewer.is_none() {
            let Some(window) = self.renderer.window() else {
                return;
            };
            let scale = window.scale_factor();
            let size = self.logical_size(window.inner_size());
            self.viewer = Some(ViewerController::initialize(&self.config, self.channel.clone(), size, scale));
        }
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, _id: winit::window::WindowId, event: WindowEvent) {
        self.input.push(InputEvent::from_window_event(&event));
        match &event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::Resized(size) => {
                let logical = self.logical_size(*size);
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.resize(logical);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            event_loop.exit();
            return;
        }
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.poll_model();
        }
        self.handle_input();
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if !self.render_loop.step(viewer.scene_mut(), &mut self.renderer) {
            log::info!("render loop stopped after {} frames", self.render_loop.time().frame_count());
            self.should_close = true;
            event_loop.exit();
            return;
        }
        if let Some(window) = self.renderer.window() {
            window.request_redraw();
        }
    }
}
