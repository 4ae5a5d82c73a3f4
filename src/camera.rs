//! Fixed perspective camera looking at the origin.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Stationary camera on the +Z axis; only the aspect ratio changes
pub struct CameraSystem {
    eye: Vec3,
    target: Vec3,
    fov_y_rad: f32,
    near: f32,
    far: f32,
    aspect: f32,
}

impl CameraSystem {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_y_rad: config.fov_degrees.to_radians(),
            near: config.near_plane,
            far: config.far_plane,
            aspect: config.aspect_ratio(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Track a new viewport size. Zero-sized (minimised) viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = CameraSystem::new(&RenderConfig::default());
        let clip = camera.view_proj() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!((0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = CameraSystem::new(&RenderConfig {
            window_width: 800,
            window_height: 600,
            ..Default::default()
        });
        assert!((camera.aspect() - 4.0 / 3.0).abs() < 1e-6);

        assert!(camera.resize(1200, 800));
        assert!((camera.aspect() - 1.5).abs() < 1e-6);

        // Minimised window keeps the last aspect
        assert!(!camera.resize(0, 800));
        assert!((camera.aspect() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_orb_fits_in_view() {
        let camera = CameraSystem::new(&RenderConfig::default());
        // Top of a radius 2 sphere at the origin is inside the frustum
        let clip = camera.view_proj() * Vec3::new(0.0, 2.0, 0.0).extend(1.0);
        let ndc_y = clip.y / clip.w;
        assert!(ndc_y > 0.0 && ndc_y < 1.0);
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, 5.0));
    }
}
