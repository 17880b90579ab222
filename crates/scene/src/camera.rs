use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Orbit camera rotating around a target point.
///
/// `alpha` is the longitudinal angle and `beta` the latitudinal angle, both
/// in radians; `radius` is the distance from the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcRotateCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub lower_radius_limit: Option<f32>,
    pub upper_radius_limit: Option<f32>,
    pub lower_beta_limit: f32,
    pub upper_beta_limit: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
}

impl Default for ArcRotateCamera {
    fn default() -> Self {
        Self::new(-PI / 2.0, PI / 3.0, 20.0, Vec3::ZERO)
    }
}

impl ArcRotateCamera {
    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        Self {
            alpha,
            beta,
            radius,
            target,
            lower_radius_limit: None,
            upper_radius_limit: None,
            lower_beta_limit: 0.01,
            upper_beta_limit: PI - 0.01,
            fov: 0.8,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 10_000.0,
            sensitivity: 0.001,
        }
    }

    /// Set both radius limits and pull the current radius inside them.
    pub fn with_radius_limits(mut self, lower: f32, upper: f32) -> Self {
        self.lower_radius_limit = Some(lower);
        self.upper_radius_limit = Some(upper);
        self.radius = self.clamp_radius(self.radius);
        self
    }

    pub fn clamp_radius(&self, radius: f32) -> f32 {
        let mut r = radius;
        if let Some(lower) = self.lower_radius_limit {
            r = r.max(lower);
        }
        if let Some(upper) = self.upper_radius_limit {
            r = r.min(upper);
        }
        r
    }

    pub fn radius_within_limits(&self) -> bool {
        self.lower_radius_limit.is_none_or(|l| l <= self.radius)
            && self.upper_radius_limit.is_none_or(|u| self.radius <= u)
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        let (sin_a, cos_a) = self.alpha.sin_cos();
        let (sin_b, cos_b) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(cos_a * sin_b, cos_b, sin_a * sin_b)
    }

    /// Orbit by a pointer delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.alpha -= dx * self.sensitivity;
        self.beta = (self.beta - dy * self.sensitivity)
            .clamp(self.lower_beta_limit, self.upper_beta_limit);
    }

    /// Move toward (positive) or away from (negative) the target.
    pub fn zoom(&mut self, delta: f32) {
        self.radius = self.clamp_radius(self.radius - delta);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = ArcRotateCamera::default();
        assert!(cam.position().y > 0.0);
        let vp = cam.view_projection();
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn eye_sits_at_radius_from_target() {
        let target = Vec3::new(0.0, 5.0, 0.0);
        let cam = ArcRotateCamera::new(1.5, 1.0, 20.0, target);
        let dist = cam.position().distance(target);
        assert!((dist - 20.0).abs() < 1e-4);
    }

    #[test]
    fn beta_zero_looks_straight_down() {
        let cam = ArcRotateCamera::new(0.0, 0.0, 10.0, Vec3::ZERO);
        assert!((cam.position() - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn limits_clamp_radius() {
        let cam = ArcRotateCamera::new(0.0, 1.0, 80.0, Vec3::ZERO).with_radius_limits(10.0, 50.0);
        assert_eq!(cam.radius, 50.0);
        assert!(cam.radius_within_limits());

        let mut cam = ArcRotateCamera::new(0.0, 1.0, 20.0, Vec3::ZERO).with_radius_limits(10.0, 50.0);
        assert_eq!(cam.radius, 20.0);
        cam.zoom(100.0);
        assert_eq!(cam.radius, 10.0);
        cam.zoom(-100.0);
        assert_eq!(cam.radius, 50.0);
    }

    #[test]
    fn unlimited_radius_is_within_limits() {
        let cam = ArcRotateCamera::new(0.0, 1.0, 1e6, Vec3::ZERO);
        assert!(cam.radius_within_limits());
    }

    #[test]
    fn orbit_keeps_beta_off_the_poles() {
        let mut cam = ArcRotateCamera::default();
        let start = cam.position();
        cam.orbit(0.0, 1e6);
        assert_eq!(cam.beta, cam.lower_beta_limit);
        cam.orbit(0.0, -1e7);
        assert_eq!(cam.beta, cam.upper_beta_limit);
        assert_ne!(cam.position(), start);
    }
}
