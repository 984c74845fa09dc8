//! # Controls Module
//!
//! Orbit controls: drag to orbit, wheel to zoom (distance bounded), and
//! a slow continuous auto-rotation while the user is idle.

use crate::camera::PerspectiveCamera;
use crate::math::Vector3;

/// Orbit controls rotating the camera around a target point.
pub struct OrbitControls {
    /// Target point to orbit around.
    pub target: Vector3,
    /// Minimum distance from target.
    pub min_distance: f32,
    /// Maximum distance from target.
    pub max_distance: f32,
    /// Rotation speed multiplier for drags.
    pub rotate_speed: f32,
    /// Zoom speed multiplier.
    pub zoom_speed: f32,
    /// Auto-rotate the camera while idle.
    pub auto_rotate: bool,
    /// Auto-rotation speed (radians per update call).
    pub auto_rotate_speed: f32,
    // Accumulated input, consumed by the next update.
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    had_input: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vector3::ZERO,
            min_distance: 3.0,
            max_distance: 8.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            auto_rotate: true,
            auto_rotate_speed: 0.002,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            had_input: false,
        }
    }
}

impl OrbitControls {
    /// Create new orbit controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a drag, in pixels.
    pub fn rotate_by_pixels(&mut self, delta_x: f32, delta_y: f32) {
        // About 0.2 degrees per pixel.
        let rotate_scale = 0.004 * self.rotate_speed;
        self.delta_theta -= delta_x * rotate_scale;
        self.delta_phi += delta_y * rotate_scale;
        self.had_input = true;
    }

    /// Accumulate a mouse-wheel zoom. Scroll up (negative delta) zooms in.
    pub fn zoom_by_wheel(&mut self, delta: f32) {
        let amount = delta * 0.001 * self.zoom_speed;
        self.scale *= 1.0 + amount;
        self.had_input = true;
    }

    /// Apply accumulated input to the camera, plus the idle auto-rotation.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length().max(1e-4);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).asin();

        theta += self.delta_theta;
        phi += self.delta_phi;
        if self.auto_rotate && !self.had_input {
            theta += self.auto_rotate_speed;
        }
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.had_input = false;

        // Avoid flipping over the poles.
        phi = phi.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.1,
            std::f32::consts::FRAC_PI_2 - 0.1,
        );

        let new_radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        let new_offset = Vector3::new(
            new_radius * phi.cos() * theta.sin(),
            new_radius * phi.sin(),
            new_radius * phi.cos() * theta.cos(),
        );
        camera.set_position(self.target + new_offset);
        camera.set_target(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_distance_is_bounded() {
        let mut controls = OrbitControls::new();
        controls.auto_rotate = false;
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vector3::new(0.0, 0.0, 5.0));

        for _ in 0..100 {
            controls.zoom_by_wheel(500.0);
            controls.update(&mut camera);
        }
        assert!(camera.distance() <= 8.0 + 1e-3);

        for _ in 0..100 {
            controls.zoom_by_wheel(-500.0);
            controls.update(&mut camera);
        }
        assert!(camera.distance() >= 3.0 - 1e-3);
    }

    #[test]
    fn test_auto_rotate_only_when_idle() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vector3::new(0.0, 0.0, 5.0));

        let before = camera.position;
        controls.update(&mut camera);
        assert!(!camera.position.approx_eq(&before, 1e-7), "idle frame should auto-rotate");

        // A drag suppresses the auto-rotation for that frame: two
        // opposite drags return exactly to the starting position.
        let drag_start = camera.position;
        controls.rotate_by_pixels(10.0, 0.0);
        controls.update(&mut camera);
        controls.rotate_by_pixels(-10.0, 0.0);
        controls.update(&mut camera);
        assert!(camera.position.approx_eq(&drag_start, 1e-4));
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut controls = OrbitControls::new();
        controls.auto_rotate = false;
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vector3::new(0.0, 0.0, 5.0));

        controls.rotate_by_pixels(40.0, 25.0);
        controls.update(&mut camera);
        assert!((camera.distance() - 5.0).abs() < 1e-4);
    }
}
