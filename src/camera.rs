//! A first-person fly camera with left-handed view and projection matrices.
//!
//! The camera owns a [`Transform`] and rebuilds its view matrix from it on
//! every [`update`](Camera::update). The projection is only rebuilt when the
//! aspect ratio or field of view changes.
//!
//! # Controls
//!
//! | Input | Action |
//! |---|---|
//! | W / S | Move forward / back along the view direction |
//! | A / D | Strafe left / right |
//! | Space / X | Move up / down in world space |
//! | Left Shift | Double movement speed |
//! | Left mouse drag | Look around |
//!
//! # Example
//!
//! ```ignore
//! use penumbra::{Camera, Vec3};
//!
//! let mut camera = Camera::new(Vec3::new(0.0, 0.0, -5.0), 16.0 / 9.0, 4.0, 2.0, FRAC_PI_2);
//! camera.update(dt, &input);
//! let view_proj = camera.projection() * camera.view();
//! ```

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Mat4, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::input::Input;
use crate::transform::Transform;

/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 0.01;
/// Far clip plane distance.
pub const FAR_PLANE: f32 = 100.0;

/// Fly camera state.
#[derive(Clone, Debug)]
pub struct Camera {
    transform: Transform,
    view: Mat4,
    projection: Mat4,
    fov: f32,
    aspect_ratio: f32,
    movement_speed: f32,
    mouse_look_speed: f32,
}

impl Camera {
    /// Create a camera at `position` looking down +Z.
    ///
    /// `fov` is the vertical field of view in radians. View and projection
    /// are valid immediately.
    pub fn new(
        position: Vec3,
        aspect_ratio: f32,
        movement_speed: f32,
        mouse_look_speed: f32,
        fov: f32,
    ) -> Self {
        let mut transform = Transform::new();
        transform.set_position(position.x, position.y, position.z);

        let mut camera = Self {
            transform,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            fov,
            aspect_ratio,
            movement_speed,
            mouse_look_speed,
        };
        camera.update_view_matrix();
        camera.update_projection_matrix(aspect_ratio);
        camera
    }

    /// A camera with movement speed 2, look speed 2 and a 45° field of view.
    pub fn with_defaults(position: Vec3, aspect_ratio: f32) -> Self {
        Self::new(position, aspect_ratio, 2.0, 2.0, FRAC_PI_4)
    }

    /// Apply one frame of keyboard and mouse input, then rebuild the view.
    pub fn update(&mut self, dt: f32, input: &Input) {
        let mut speed = self.movement_speed * dt;
        if input.key_down(KeyCode::ShiftLeft) {
            speed *= 2.0;
        }

        if input.key_down(KeyCode::KeyW) {
            self.transform.move_relative(0.0, 0.0, speed);
        }
        if input.key_down(KeyCode::KeyS) {
            self.transform.move_relative(0.0, 0.0, -speed);
        }
        if input.key_down(KeyCode::KeyA) {
            self.transform.move_relative(-speed, 0.0, 0.0);
        }
        if input.key_down(KeyCode::KeyD) {
            self.transform.move_relative(speed, 0.0, 0.0);
        }
        if input.key_down(KeyCode::Space) {
            self.transform.move_absolute(0.0, speed, 0.0);
        }
        if input.key_down(KeyCode::KeyX) {
            self.transform.move_absolute(0.0, -speed, 0.0);
        }

        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta() * self.mouse_look_speed * dt;
            self.transform.rotate(delta.y, delta.x, 0.0);
            self.clamp_pitch();
        }

        self.update_view_matrix();
    }

    /// Keep pitch within ±90° so the camera never flips over the top.
    fn clamp_pitch(&mut self) {
        let Vec3 {
            x: pitch,
            y: yaw,
            z: roll,
        } = self.transform.pitch_yaw_roll();
        // Yaw and roll are written back unchanged.
        if pitch > FRAC_PI_2 {
            self.transform.set_rotation(FRAC_PI_2, yaw, roll);
        } else if pitch < -FRAC_PI_2 {
            self.transform.set_rotation(-FRAC_PI_2, yaw, roll);
        }
    }

    /// Rebuild the view matrix from the transform.
    pub fn update_view_matrix(&mut self) {
        let position = self.transform.position();
        let forward = self.transform.forward();
        // Straight up or down has no usable world-up; fall back to the
        // camera's own up axis.
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            self.transform.up()
        } else {
            Vec3::Y
        };
        self.view = Mat4::look_to_lh(position, forward, up);
    }

    /// Store a new aspect ratio and rebuild the projection.
    pub fn update_projection_matrix(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.projection = Mat4::perspective_lh(self.fov, aspect_ratio, NEAR_PLANE, FAR_PLANE);
    }

    /// Change the vertical field of view (radians) and rebuild the projection.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection_matrix(self.aspect_ratio);
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable access to the camera's transform.
    ///
    /// The view matrix picks up changes on the next [`update`](Self::update)
    /// or [`update_view_matrix`](Self::update_view_matrix).
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn mouse_look_speed(&self) -> f32 {
        self.mouse_look_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    fn demo_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, -5.0), 16.0 / 9.0, 4.0, 2.0, FRAC_PI_2)
    }

    #[test]
    fn test_defaults() {
        let camera = Camera::with_defaults(Vec3::ZERO, 1.0);
        assert_eq!(camera.movement_speed(), 2.0);
        assert_eq!(camera.mouse_look_speed(), 2.0);
        assert_eq!(camera.fov(), FRAC_PI_4);
    }

    #[test]
    fn test_view_moves_world_into_camera_space() {
        let camera = demo_camera();
        // The origin is five units in front of a camera at z = -5 looking +Z.
        let p = camera.view().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn test_projection_depth_range() {
        let camera = demo_camera();
        let near = camera.projection() * Vec4::new(0.0, 0.0, NEAR_PLANE, 1.0);
        let far = camera.projection() * Vec4::new(0.0, 0.0, FAR_PLANE, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_aspect_change_only_alters_x_scale() {
        let mut camera = demo_camera();
        let before = camera.projection();
        camera.update_projection_matrix(1.0);
        let after = camera.projection();

        assert_ne!(before.x_axis.x, after.x_axis.x);
        assert_eq!(before.y_axis, after.y_axis);
        assert_eq!(before.z_axis, after.z_axis);
        assert_eq!(before.w_axis, after.w_axis);
        assert_eq!(camera.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_set_fov_keeps_aspect() {
        let mut camera = demo_camera();
        camera.set_fov(FRAC_PI_4);
        let expected = Mat4::perspective_lh(FRAC_PI_4, 16.0 / 9.0, NEAR_PLANE, FAR_PLANE);
        assert!(camera.projection().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_w_moves_forward() {
        let mut camera = demo_camera();
        let mut input = Input::new();
        input.press_key(KeyCode::KeyW);
        camera.update(0.5, &input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), 1e-5));
    }

    #[test]
    fn test_shift_doubles_speed() {
        let mut camera = demo_camera();
        let mut input = Input::new();
        input.press_key(KeyCode::KeyD);
        input.press_key(KeyCode::ShiftLeft);
        camera.update(0.25, &input);
        assert!(camera.position().abs_diff_eq(Vec3::new(2.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn test_space_moves_up_in_world_space() {
        let mut camera = demo_camera();
        camera.transform_mut().set_rotation(0.5, 0.0, 0.0);
        let mut input = Input::new();
        input.press_key(KeyCode::Space);
        camera.update(1.0, &input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 4.0, -5.0), 1e-5));
    }

    #[test]
    fn test_mouse_look_requires_left_button() {
        let mut camera = demo_camera();
        let mut input = Input::new();
        input.add_mouse_delta(glam::Vec2::new(10.0, 0.0));
        camera.update(0.1, &input);
        assert_eq!(camera.transform().pitch_yaw_roll(), Vec3::ZERO);

        input.press_mouse(MouseButton::Left);
        camera.update(0.1, &input);
        // yaw += look * dt * dx = 2 * 0.1 * 10
        assert_relative_eq!(camera.transform().pitch_yaw_roll().y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_clamps_to_exactly_half_pi() {
        let mut camera = demo_camera();
        let mut input = Input::new();
        input.press_mouse(MouseButton::Left);
        input.add_mouse_delta(glam::Vec2::new(0.0, 1000.0));
        camera.update(0.1, &input);
        assert_eq!(camera.transform().pitch_yaw_roll().x, FRAC_PI_2);
        assert!(camera.view().is_finite());

        input.begin_frame();
        input.add_mouse_delta(glam::Vec2::new(0.0, -5000.0));
        camera.update(0.1, &input);
        assert_eq!(camera.transform().pitch_yaw_roll().x, -FRAC_PI_2);
        assert!(camera.view().is_finite());
    }
}
