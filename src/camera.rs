#[derive(Clone, Copy, Debug)]
pub struct Camera2D {
    pub center: [f32; 2],
    /// Pixels per world unit. Larger = zoom in.
    pub pixels_per_unit: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            pixels_per_unit: 1.0,
        }
    }
}

impl Camera2D {
    pub fn fit_bbox(&mut self, bbox: [f32; 4], viewport_px: [f32; 2], padding_frac: f32) {
        let min_x = bbox[0];
        let min_y = bbox[1];
        let max_x = bbox[2];
        let max_y = bbox[3];

        let cx = 0.5 * (min_x + max_x);
        let cy = 0.5 * (min_y + max_y);
        self.center = [cx, cy];

        let w = (max_x - min_x).max(1e-6);
        let h = (max_y - min_y).max(1e-6);

        let fill = padding_frac.clamp(0.05, 0.95);
        let sx = (viewport_px[0] * fill) / w;
        let sy = (viewport_px[1] * fill) / h;
        self.pixels_per_unit = sx.min(sy);
        self.pixels_per_unit = self.pixels_per_unit.clamp(1e-6, 1e9);
    }

    pub fn pan_by_pixels(&mut self, delta_px: [f32; 2]) {
        // Screen y grows downwards, world y upwards.
        self.center[0] -= delta_px[0] / self.pixels_per_unit;
        self.center[1] += delta_px[1] / self.pixels_per_unit;
    }

    pub fn zoom_at_viewport_pixel(
        &mut self,
        mouse_px: [f32; 2],
        viewport_px: [f32; 2],
        zoom_factor: f32,
    ) {
        let old_ppu = self.pixels_per_unit;
        let new_ppu = (old_ppu * zoom_factor).clamp(1e-6, 1e9);

        // Keep the world point under the cursor stable.
        let before = self.screen_to_world(mouse_px, viewport_px);

        self.pixels_per_unit = new_ppu;

        let after = self.screen_to_world(mouse_px, viewport_px);
        self.center[0] += before[0] - after[0];
        self.center[1] += before[1] - after[1];
    }

    pub fn world_to_screen(&self, world: [f32; 2], viewport_px: [f32; 2]) -> [f32; 2] {
        [
            0.5 * viewport_px[0] + (world[0] - self.center[0]) * self.pixels_per_unit,
            0.5 * viewport_px[1] - (world[1] - self.center[1]) * self.pixels_per_unit,
        ]
    }

    pub fn screen_to_world(&self, screen_px: [f32; 2], viewport_px: [f32; 2]) -> [f32; 2] {
        [
            self.center[0] + (screen_px[0] - 0.5 * viewport_px[0]) / self.pixels_per_unit,
            self.center[1] - (screen_px[1] - 0.5 * viewport_px[1]) / self.pixels_per_unit,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_bbox_centers_the_view() {
        let mut cam = Camera2D::default();
        cam.fit_bbox([-2.0, -1.0, 4.0, 3.0], [1000.0, 700.0], 0.9);
        assert!((cam.center[0] - 1.0).abs() < f32::EPSILON);
        assert!((cam.center[1] - 1.0).abs() < f32::EPSILON);
        assert!(cam.pixels_per_unit > 0.0);
    }

    #[test]
    fn world_screen_round_trip() {
        let mut cam = Camera2D::default();
        cam.center = [3.0, -2.0];
        cam.pixels_per_unit = 40.0;
        let viewport = [800.0, 600.0];
        let world = [5.5, 1.25];
        let back = cam.screen_to_world(cam.world_to_screen(world, viewport), viewport);
        assert!((back[0] - world[0]).abs() < 1e-4);
        assert!((back[1] - world[1]).abs() < 1e-4);
    }

    #[test]
    fn zoom_keeps_the_anchor_point_fixed() {
        let mut cam = Camera2D::default();
        cam.pixels_per_unit = 10.0;
        let viewport = [800.0, 600.0];
        let mouse = [200.0, 450.0];
        let anchor = cam.screen_to_world(mouse, viewport);
        cam.zoom_at_viewport_pixel(mouse, viewport, 1.5);
        let after = cam.screen_to_world(mouse, viewport);
        assert!((anchor[0] - after[0]).abs() < 1e-4);
        assert!((anchor[1] - after[1]).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_against_the_drag() {
        let mut cam = Camera2D::default();
        cam.pixels_per_unit = 10.0;
        cam.pan_by_pixels([50.0, -20.0]);
        assert!((cam.center[0] + 5.0).abs() < 1e-6);
        assert!((cam.center[1] + 2.0).abs() < 1e-6);
    }
}
