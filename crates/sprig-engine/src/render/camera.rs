use glam::Mat4;

use crate::coords::Viewport;

/// Orthographic screen-space camera.
///
/// Maps logical pixels (origin top-left, +Y down) over `width × height` to
/// NDC. The matrix only changes in [`Camera::update`]; until the first update
/// it is the identity.
#[derive(Debug, Clone)]
pub struct Camera {
    width: f32,
    height: f32,
    projection_view: Mat4,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            projection_view: Mat4::IDENTITY,
        }
    }

    pub fn from_viewport(viewport: Viewport) -> Self {
        Self::new(viewport.width, viewport.height)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Stores a new viewport size; returns whether it changed.
    ///
    /// The matrix is not touched until the next `update()`.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport() {
            return false;
        }
        self.width = viewport.width;
        self.height = viewport.height;
        true
    }

    /// Recomputes the projection-view matrix from the current size.
    pub fn update(&mut self) {
        let projection = Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, -1.0, 1.0);
        let view = Mat4::IDENTITY;
        self.projection_view = projection * view;
    }

    pub fn projection_view(&self) -> &Mat4 {
        &self.projection_view
    }

    /// Column-major matrix as uploaded to the uniform buffer.
    pub fn uniform(&self) -> [f32; 16] {
        self.projection_view.to_cols_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ndc(camera: &Camera, x: f32, y: f32) -> Vec3 {
        camera.projection_view().project_point3(Vec3::new(x, y, 0.0))
    }

    fn approx_xy(p: Vec3, x: f32, y: f32) -> bool {
        (p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6
    }

    #[test]
    fn identity_before_first_update() {
        let camera = Camera::new(800.0, 600.0);
        assert_eq!(*camera.projection_view(), Mat4::IDENTITY);
    }

    #[test]
    fn maps_screen_corners_to_ndc() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.update();

        assert!(approx_xy(ndc(&camera, 0.0, 0.0), -1.0, 1.0));
        assert!(approx_xy(ndc(&camera, 800.0, 600.0), 1.0, -1.0));
        assert!(approx_xy(ndc(&camera, 400.0, 300.0), 0.0, 0.0));
    }

    #[test]
    fn depth_of_sprite_plane_is_inside_clip_range() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.update();
        let z = ndc(&camera, 10.0, 10.0).z;
        assert!((0.0..=1.0).contains(&z));
    }

    #[test]
    fn update_is_bit_identical_when_size_unchanged() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.update();
        let first = camera.uniform();
        camera.update();
        let second = camera.uniform();

        let bits = |m: [f32; 16]| m.map(f32::to_bits);
        assert_eq!(bits(first), bits(second));
    }

    #[test]
    fn set_viewport_defers_until_update() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.update();
        let before = camera.uniform();

        assert!(camera.set_viewport(Viewport::new(400.0, 300.0)));
        assert_eq!(camera.uniform(), before);

        camera.update();
        assert!(approx_xy(ndc(&camera, 400.0, 300.0), 1.0, -1.0));
    }

    #[test]
    fn set_viewport_same_size_is_noop() {
        let mut camera = Camera::from_viewport(Viewport::new(800.0, 600.0));
        assert!(!camera.set_viewport(Viewport::new(800.0, 600.0)));
    }
}
