//! Camera and view management.

use glam::{Mat4, Vec3};

use turntable_core::OrthographicCamera;

/// Smallest half-height used to build an orthographic projection.
const MIN_ORTHO_SCALE: f32 = 1e-4;

/// A 3D camera mounted on the turntable rig.
///
/// The camera keeps a fixed offset from its target; moving the target with
/// [`Camera::set_target`] carries the camera along.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Orthographic half-height.
    pub ortho_scale: f32,
}

impl Camera {
    /// Creates an orthographic camera looking down -Z at the origin.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
            ortho_scale: 1.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Moves the target, keeping the camera's offset from it.
    pub fn set_target(&mut self, target: Vec3) {
        let offset = self.position - self.target;
        self.target = target;
        self.position = target + offset;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the orthographic projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let half_height = self.ortho_scale.max(MIN_ORTHO_SCALE);
        let half_width = half_height * self.aspect_ratio;
        // Symmetric depth range around the camera so geometry on
        // either side of the target is never clipped.
        let dist = (self.position - self.target).length();
        let ortho_depth = (dist + self.far).max(half_height * 100.0);
        Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -ortho_depth,
            ortho_depth,
        )
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl OrthographicCamera for Camera {
    fn ortho_half_height(&self) -> f32 {
        self.ortho_scale
    }

    fn set_ortho_half_height(&mut self, half_height: f32) {
        self.ortho_scale = half_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.aspect_ratio, 1.0);
        assert_eq!(camera.ortho_half_height(), 1.0);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_projection_is_orthographic() {
        let mut camera = Camera::new(1.0);
        camera.ortho_scale = 5.0;
        let proj = camera.projection_matrix();
        // Orthographic matrix has w_axis.w = 1.0
        assert!((proj.w_axis.w - 1.0).abs() < 0.001);
        // A point at the top edge of the half-height maps to NDC y = 1.
        let top = camera.view_projection_matrix().project_point3(Vec3::new(0.0, 5.0, 0.0));
        assert!((top.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_ortho_scale_is_finite() {
        let mut camera = Camera::new(1.0);
        camera.set_ortho_half_height(0.0);
        assert_eq!(camera.ortho_half_height(), 0.0);
        assert!(camera.projection_matrix().is_finite());
    }

    #[test]
    fn test_set_target_keeps_offset() {
        let mut camera = Camera::new(1.0);
        camera.set_target(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 13.0));
        assert_eq!(camera.target, Vec3::new(1.0, 2.0, 3.0));
    }
}
