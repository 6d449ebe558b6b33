use std::f32::consts::{FRAC_PI_4, PI};

use glam::{Mat4, Vec3};

/// Camera orbiting a focus point on a sphere of radius `distance`.
///
/// `theta` is the azimuth around +Y, `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub distance: f32,
    pub theta: f32,
    pub phi: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            distance: 5.0,
            theta: -FRAC_PI_4,
            phi: FRAC_PI_4,
            fov_y: FRAC_PI_4,
            near: 0.1,
            far: 100.0,
            min_distance: 1.0,
        }
    }
}

impl OrbitCamera {
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.focus + self.distance * Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    pub fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        const EPS: f32 = 1e-4;
        self.theta += d_theta;
        self.phi = (self.phi + d_phi).clamp(EPS, PI - EPS);
    }

    /// Moves toward (positive) or away from the focus; never closer than
    /// `min_distance`.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).max(self.min_distance);
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.position(), self.focus, Vec3::Y)
    }

    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, aspect.max(1e-4), self.near, self.far)
    }

    #[must_use]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// View-projection with the translation removed, for sky rays.
    #[must_use]
    pub fn rotation_view_projection(&self, aspect: f32) -> Mat4 {
        let forward = self.focus - self.position();
        self.projection(aspect) * Mat4::look_to_lh(Vec3::ZERO, forward, Vec3::Y)
    }
}
