use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic 2D camera. `zoom` is pixels per world unit; world y points up while
/// window y points down.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    fn half_extents(&self) -> Vec2 {
        Vec2::new(
            (self.viewport.0 as f32) / (2.0 * self.zoom),
            (self.viewport.1 as f32) / (2.0 * self.zoom),
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extents();

        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }

    /// Map a window-space cursor (pixels, origin top-left) into world space.
    pub fn screen_to_world(&self, screen_px: Vec2) -> Vec2 {
        let center = Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5;
        let offset = (screen_px - center) / self.zoom;
        Vec2::new(self.position.x + offset.x, self.position.y - offset.y)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let center = Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5;
        let offset = world - self.position;
        Vec2::new(center.x + offset.x * self.zoom, center.y - offset.y * self.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn viewport_center_maps_to_camera_position() {
        let mut camera = Camera2D::new(800, 600);
        camera.position = Vec2::new(3.0, -2.0);
        camera.zoom = 50.0;
        assert!(approx(
            camera.screen_to_world(Vec2::new(400.0, 300.0)),
            Vec2::new(3.0, -2.0)
        ));
    }

    #[test]
    fn screen_y_grows_down_world_y_grows_up() {
        let mut camera = Camera2D::new(800, 600);
        camera.zoom = 100.0;
        let top_left = camera.screen_to_world(Vec2::ZERO);
        assert!(approx(top_left, Vec2::new(-4.0, 3.0)));
    }

    #[test]
    fn world_to_screen_inverts_screen_to_world() {
        let mut camera = Camera2D::new(1280, 720);
        camera.position = Vec2::new(10.0, 4.0);
        camera.zoom = 64.0;
        let screen = Vec2::new(123.0, 456.0);
        let world = camera.screen_to_world(screen);
        assert!(approx(camera.world_to_screen(world), screen));
    }
}
