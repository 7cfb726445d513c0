//! Camera and view parameters.
//!
//! The camera is owned by the scene host and only read during a capture.

use glam::{Mat4, Vec3};

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

/// View-depth interval that depth shading maps onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    /// View depth that maps to 0.
    pub near: f32,
    /// View depth that maps to 1.
    pub far: f32,
}

impl DepthRange {
    /// Maps a view depth onto [0, 1] across the range.
    #[must_use]
    pub fn normalize(&self, view_depth: f32) -> f32 {
        ((view_depth - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

impl Camera {
    /// Creates a new camera with the inspector's default viewpoint.
    ///
    /// Sits at (0, 5, 10) looking at the origin with a 75 degree vertical fov.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75f32.to_radians(),
            aspect_ratio,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Sets the aspect ratio from a viewport size. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let aspect_ratio = width as f32 / height as f32;
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the perspective projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the camera along its view direction (positive in front).
    #[must_use]
    pub fn view_depth(&self, world: Vec3) -> f32 {
        -self.view_matrix().transform_point3(world).z
    }

    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// The full near/far clipping range.
    #[must_use]
    pub fn clip_range(&self) -> DepthRange {
        DepthRange {
            near: self.near,
            far: self.far,
        }
    }

    /// View-depth range spanned by a world-space box, clipped to near/far.
    ///
    /// Falls back to [`Camera::clip_range`] when there is no box or the
    /// box has no visible depth extent.
    #[must_use]
    pub fn depth_range(&self, bounds: Option<(Vec3, Vec3)>) -> DepthRange {
        let Some((min, max)) = bounds else {
            return self.clip_range();
        };
        let view = self.view_matrix();
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for i in 0..8u8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            let depth = -view.transform_point3(corner).z;
            lo = lo.min(depth);
            hi = hi.max(depth);
        }
        let lo = lo.clamp(self.near, self.far);
        let hi = hi.clamp(self.near, self.far);
        if hi - lo < 1e-4 {
            return self.clip_range();
        }
        DepthRange { near: lo, far: hi }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 5.0, 10.0));
        assert!((camera.fov_degrees() - 75.0).abs() < 1e-4);
        assert_eq!(camera.clip_range(), DepthRange { near: 0.1, far: 1000.0 });
    }

    #[test]
    fn test_projection_is_perspective() {
        let camera = Camera::new(1.0);
        let proj = camera.projection_matrix();
        // Perspective matrix has non-zero w division
        assert!(proj.w_axis.z != 0.0);
        assert_eq!(proj.w_axis.w, 0.0);
    }

    #[test]
    fn test_view_depth_in_front() {
        let camera = Camera::new(1.0);
        let depth = camera.view_depth(camera.target);
        let expected = (camera.position - camera.target).length();
        assert!((depth - expected).abs() < 1e-4);
    }

    #[test]
    fn test_zero_viewport_ignored() {
        let mut camera = Camera::new(2.0);
        camera.set_viewport(0, 100);
        assert_eq!(camera.aspect_ratio, 2.0);
        camera.set_viewport(300, 100);
        assert!((camera.aspect_ratio - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_depth_range_spans_box() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        let range = camera.depth_range(Some((Vec3::splat(-1.0), Vec3::splat(1.0))));
        assert!((range.near - 9.0).abs() < 1e-4);
        assert!((range.far - 11.0).abs() < 1e-4);
        assert!((range.normalize(10.0) - 0.5).abs() < 1e-4);
        assert_eq!(range.normalize(5.0), 0.0);
        assert_eq!(range.normalize(50.0), 1.0);
    }

    #[test]
    fn test_depth_range_clipped_to_planes() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.far = 10.5;
        let range = camera.depth_range(Some((Vec3::splat(-1.0), Vec3::splat(20.0))));
        assert_eq!(range.near, camera.near);
        assert_eq!(range.far, 10.5);
    }

    #[test]
    fn test_depth_range_fallback() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(camera.depth_range(None), camera.clip_range());

        // Flat quad facing the camera has no depth extent
        let flat = (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(camera.depth_range(Some(flat)), camera.clip_range());

        // Entirely behind the camera
        let behind = (Vec3::new(-1.0, -1.0, 20.0), Vec3::new(1.0, 1.0, 30.0));
        assert_eq!(camera.depth_range(Some(behind)), camera.clip_range());
    }
}
