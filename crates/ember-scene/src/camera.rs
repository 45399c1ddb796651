//! Orthographic 2D camera

use glam::{Mat4, Vec3};

/// Width of the lens relative to its height at the reference aspect ratio
pub const DEVICE_INVARIABLE_ASPECT: f32 = 0.46;
pub const DEFAULT_LENS_HEIGHT: f32 = 30.0;
const DEFAULT_ZNEAR: f32 = -50.0;
const DEFAULT_ZFAR: f32 = 50.0;

/// Looks down -Z at the scene plane. Matrices are recalculated whenever the
/// position, zoom or viewport aspect changes.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    zoom: f32,
    lens_width: f32,
    lens_height: f32,
    /// Viewport width / height
    aspect: f32,
    view: Mat4,
    proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::orthographic(DEFAULT_LENS_HEIGHT, DEVICE_INVARIABLE_ASPECT)
    }
}

impl Camera {
    pub fn orthographic(lens_height: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            zoom: 1.0,
            lens_width: lens_height * DEVICE_INVARIABLE_ASPECT,
            lens_height,
            aspect,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        camera.recalculate_matrices();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_matrices();
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(f32::EPSILON);
        self.recalculate_matrices();
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.recalculate_matrices();
    }

    pub fn lens_width(&self) -> f32 {
        self.lens_width
    }

    pub fn lens_height(&self) -> f32 {
        self.lens_height
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    /// Get the view matrix (4x4, column-major) for GPU upload
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        self.view.to_cols_array_2d()
    }

    /// Get the projection matrix (4x4, column-major) for GPU upload
    pub fn projection_matrix(&self) -> [[f32; 4]; 4] {
        self.proj.to_cols_array_2d()
    }

    fn recalculate_matrices(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position - Vec3::Z, Vec3::Y);

        // Wider viewports see more of the scene horizontally, never less vertically
        let half_w = self.lens_width / (DEVICE_INVARIABLE_ASPECT / self.aspect) / 2.0 / self.zoom;
        let half_h = self.lens_height / 2.0 / self.zoom;
        // Maps depth to [0, 1] (wgpu convention)
        self.proj = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, DEFAULT_ZNEAR, DEFAULT_ZFAR);
    }
}
