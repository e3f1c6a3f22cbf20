mod mesh_pass;
pub mod window_surface;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::config::WindowConfig;
use crate::render_loop::SceneRenderer;
use crate::scene::{RenderSurface, SceneContext};

use mesh_pass::{collect_draws, MeshPass};
use window_surface::WindowSurface;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// wgpu renderer for a [`SceneContext`] drawn into a winit window.
pub struct Renderer {
    surface: WindowSurface,
    mesh_pass: MeshPass,
}

impl Renderer {
    pub fn new(window_cfg: &WindowConfig, sample_count: u32) -> Self {
        Self { surface: WindowSurface::new(window_cfg, sample_count), mesh_pass: MeshPass::new() }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.surface.ensure_window(event_loop)?;
        let format = self.surface.surface_format()?;
        let sample_count = self.surface.sample_count();
        let device = self.surface.device()?;
        self.mesh_pass.ensure_resources(device, format, sample_count)
    }

    pub fn window(&self) -> Option<&Window> {
        self.surface.window()
    }
}

/// Swapchain and target size for a scene surface: logical size times the pixel ratio.
fn drawing_buffer_size(surface: &RenderSurface) -> PhysicalSize<u32> {
    let (width, height) = surface.physical_size();
    PhysicalSize::new(width, height)
}

impl SceneRenderer for Renderer {
    fn render(&mut self, scene: &SceneContext) -> Result<()> {
        if scene.surface.size.width == 0 || scene.surface.size.height == 0 {
            return Ok(());
        }
        let target = drawing_buffer_size(&scene.surface);
        if target != self.surface.size() {
            log::debug!("resizing render targets to {}x{}", target.width, target.height);
            self.surface.resize(target);
        }
        let draws = scene.model.as_ref().map(collect_draws).unwrap_or_default();
        let frame = self.surface.acquire_surface_frame()?;
        let device = self.surface.device()?;
        let queue = self.surface.queue()?;
        self.mesh_pass.prepare(device, queue, scene, &draws)?;

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame Encoder") });
        {
            let [r, g, b, a] = scene.surface.clear_color;
            let (view, resolve_target) = match self.surface.msaa_view() {
                Some(msaa) => (msaa, Some(frame.resolve_view())),
                None => (frame.resolve_view(), None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.surface.depth_view().context("Mesh pass needs a depth target")?,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Discard }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.mesh_pass.draw(&mut pass, &draws)?;
        }
        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.mesh_pass.retain_geometry(&draws);
        Ok(())
    }
}
