use glam::Vec3;

use crate::camera3d::{Camera3D, OrbitControls, OrbitSettings};
use crate::config::RenderConfig;
use crate::model::ModelRoot;

pub const CAMERA_FOV_DEGREES: f32 = 50.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(-3.0, -3.0, 3.0);

/// Display-region size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Light shines from here towards the origin.
    pub position: Vec3,
}

impl DirectionalLight {
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub range: f32,
}

/// Fixed studio lighting: ambient fill, two opposing directionals and a point highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub key: DirectionalLight,
    pub rim: DirectionalLight,
    pub point: PointLight,
}

pub const LIGHT_RIG: LightRig = LightRig {
    ambient: AmbientLight { color: Vec3::ONE, intensity: 0.5 },
    key: DirectionalLight { color: Vec3::ONE, intensity: 1.2, position: Vec3::new(5.0, 10.0, 7.5) },
    rim: DirectionalLight { color: Vec3::ONE, intensity: 1.5, position: Vec3::new(-5.0, 5.0, -5.0) },
    point: PointLight { color: Vec3::ONE, intensity: 1.5, position: Vec3::new(0.0, 5.0, 5.0), range: 100.0 },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    pub size: SurfaceSize,
    pub pixel_ratio: f32,
    /// Linear RGBA; alpha 0 lets the host window show through.
    pub clear_color: [f32; 4],
}

impl RenderSurface {
    /// Drawing-buffer size in physical pixels, never zero. The renderer sizes its swapchain and
    /// depth/MSAA targets from this.
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.size.width), scale(self.size.height))
    }
}

/// Everything the viewport owns for its lifetime.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub camera: Camera3D,
    pub lights: LightRig,
    pub surface: RenderSurface,
    pub controls: OrbitControls,
    pub model: Option<ModelRoot>,
}

/// Builds and maintains [`SceneContext`]s.
#[derive(Debug, Clone, Copy)]
pub struct SceneManager {
    pub pixel_ratio: f32,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self { pixel_ratio: 1.0 }
    }
}

impl SceneManager {
    /// `device_scale_factor` is used unless the config pins a pixel ratio.
    pub fn from_config(render: &RenderConfig, device_scale_factor: f64) -> Self {
        let pixel_ratio = render.pixel_ratio.unwrap_or(device_scale_factor as f32);
        Self { pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 } }
    }

    pub fn initialize(&self, size: SurfaceSize) -> SceneContext {
        let mut camera =
            Camera3D::new(CAMERA_POSITION, Vec3::ZERO, CAMERA_FOV_DEGREES.to_radians(), CAMERA_NEAR, CAMERA_FAR);
        camera.set_aspect(size.width, size.height);
        let mut controls = OrbitControls::new(Vec3::ZERO, OrbitSettings::default());
        controls.update(&mut camera);
        let surface = RenderSurface { size, pixel_ratio: self.pixel_ratio, clear_color: [0.0; 4] };
        log::debug!("scene initialised at {}x{} (pixel ratio {})", size.width, size.height, surface.pixel_ratio);
        SceneContext { camera, lights: LIGHT_RIG, surface, controls, model: None }
    }

    /// Normalises the model to unit scale and hands ownership to the scene.
    pub fn attach_model(context: &mut SceneContext, mut model: ModelRoot) {
        model.scale = Vec3::ONE;
        if context.model.replace(model).is_some() {
            log::debug!("replaced previously attached model");
        }
    }

    pub fn resize(context: &mut SceneContext, size: SurfaceSize) {
        context.surface.size = size;
        context.camera.set_aspect(size.width, size.height);
    }
}
