use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

const DEFAULT_UP: Vec3 = Vec3::Y;
const POLAR_EPSILON: f32 = 1e-6;

/// Perspective camera aimed at a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, aspect: 1.0, near, far }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = if height > 0 { width as f32 / height as f32 } else { 1.0 };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection with wgpu's 0..1 depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Spherical offset from the orbit target: `theta` around +Y, `phi` measured down from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self { radius: 0.0, theta: 0.0, phi: 0.0 };
        }
        Self { radius, theta: offset.x.atan2(offset.z), phi: (offset.y / radius).clamp(-1.0, 1.0).acos() }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSettings {
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            min_polar_angle: 1.0,
            max_polar_angle: 1.3,
            min_distance: 0.5,
            max_distance: 100.0,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

/// Orbit controller around a fixed target with damped rotation.
///
/// Input accumulates into a pending spherical delta; [`OrbitControls::update`] applies a damped
/// share of it to the camera once per frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub settings: OrbitSettings,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3, settings: OrbitSettings) -> Self {
        Self { target, settings, pending_theta: 0.0, pending_phi: 0.0, pending_scale: 1.0 }
    }

    /// Queues a rotation from a pointer drag of `delta` pixels on a viewport `viewport_height`
    /// pixels tall. A drag across the full height is one full turn.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.pending_theta -= TAU * delta_x / height * self.settings.rotate_speed;
        self.pending_phi -= TAU * delta_y / height * self.settings.rotate_speed;
    }

    /// Queues a dolly. Positive `steps` move the camera towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_scale *= 0.95f32.powf(self.settings.zoom_speed * steps);
    }

    /// Advances damping and repositions `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera3D) -> bool {
        let settings = self.settings;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        if settings.enable_damping {
            spherical.theta += self.pending_theta * settings.damping_factor;
            spherical.phi += self.pending_phi * settings.damping_factor;
        } else {
            spherical.theta += self.pending_theta;
            spherical.phi += self.pending_phi;
        }
        spherical.phi = spherical
            .phi
            .clamp(settings.min_polar_angle, settings.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius =
            (spherical.radius * self.pending_scale).clamp(settings.min_distance, settings.max_distance);

        let position = self.target + spherical.to_offset();
        let moved = position.distance_squared(camera.position) > 1e-12 || camera.target != self.target;
        camera.position = position;
        camera.target = self.target;

        if settings.enable_damping {
            self.pending_theta *= 1.0 - settings.damping_factor;
            self.pending_phi *= 1.0 - settings.damping_factor;
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_scale = 1.0;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(controls: &OrbitControls) -> bool {
        controls.pending_theta.abs() < 1e-6
            && controls.pending_phi.abs() < 1e-6
            && (controls.pending_scale - 1.0).abs() < 1e-6
    }

    fn camera() -> Camera3D {
        Camera3D::new(Vec3::new(-3.0, -3.0, 3.0), Vec3::ZERO, 50f32.to_radians(), 0.1, 1000.0)
    }

    #[test]
    fn camera3d_view_projection_is_finite() {
        let mut camera = camera();
        camera.set_aspect(1280, 720);
        let vp = camera.view_projection();
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn spherical_round_trips_offset() {
        let offset = Vec3::new(-3.0, -3.0, 3.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-4);
    }

    #[test]
    fn first_update_clamps_into_polar_band() {
        let mut camera = camera();
        let distance = camera.position.length();
        let mut controls = OrbitControls::new(Vec3::ZERO, OrbitSettings::default());
        controls.update(&mut camera);
        let spherical = Spherical::from_offset(camera.position);
        assert!((spherical.phi - 1.3).abs() < 1e-4);
        assert!((spherical.radius - distance).abs() < 1e-4);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, OrbitSettings::default());
        controls.update(&mut camera);
        let start = Spherical::from_offset(camera.position).theta;

        controls.rotate(-100.0, 0.0, 720);
        let queued = TAU * 100.0 / 720.0;
        controls.update(&mut camera);
        let after_one = Spherical::from_offset(camera.position).theta;
        assert!(((after_one - start) - queued * 0.05).abs() < 1e-4);

        for _ in 0..400 {
            controls.update(&mut camera);
        }
        assert!(settled(&controls));
        let settled = Spherical::from_offset(camera.position).theta;
        let travelled = (settled - start).rem_euclid(TAU);
        assert!((travelled - queued).abs() < 1e-2);
    }

    #[test]
    fn vertical_drag_stays_in_band() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, OrbitSettings::default());
        controls.rotate(0.0, 5000.0, 720);
        for _ in 0..200 {
            controls.update(&mut camera);
            let phi = Spherical::from_offset(camera.position).phi;
            assert!((1.0 - 1e-4..=1.3 + 1e-4).contains(&phi));
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, OrbitSettings::default());
        controls.zoom(10.0);
        controls.update(&mut camera);
        assert!(camera.position.length() < 27f32.sqrt());
        controls.zoom(1000.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - 0.5).abs() < 1e-4);
    }
}
