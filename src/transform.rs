//! Position, orientation and scale with a lazily rebuilt world matrix.
//!
//! Orientation is stored as pitch/yaw/roll in radians and applied roll first
//! (about Z), then pitch (about X), then yaw (about Y). The world matrix is
//! scale, then rotation, then translation. All directions follow the
//! left-handed convention used by the renderer: +Z is forward, +Y is up and
//! +X is right.
//!
//! Mutators only touch the stored scalars and mark the cached matrices
//! stale; the matrices are rebuilt together the next time either is read.
//!
//! # Example
//!
//! ```
//! use penumbra::Transform;
//!
//! let mut t = Transform::new();
//! t.set_position(1.0, 2.0, 3.0);
//! t.set_scale(2.0, 2.0, 2.0);
//! let p = t.world_matrix().transform_point3(glam::Vec3::X);
//! assert!((p - glam::Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Object placement in world space.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    /// x = pitch, y = yaw, z = roll.
    pitch_yaw_roll: Vec3,
    scale: Vec3,
    world: Mat4,
    world_inverse_transpose: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            pitch_yaw_roll: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            world_inverse_transpose: Mat4::IDENTITY,
            dirty: false,
        }
    }
}

impl Transform {
    /// A transform at the origin with no rotation and unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
        self.dirty = true;
    }

    /// Set orientation in radians.
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.pitch_yaw_roll = Vec3::new(pitch, yaw, roll);
        self.dirty = true;
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vec3::new(x, y, z);
        self.dirty = true;
    }

    /// Move in world space.
    pub fn move_absolute(&mut self, x: f32, y: f32, z: f32) {
        self.position += Vec3::new(x, y, z);
        self.dirty = true;
    }

    /// Move along the transform's own axes.
    ///
    /// The offset is rotated by the current orientation before it is added,
    /// so `move_relative(0.0, 0.0, 1.0)` always steps one unit along
    /// [`forward`](Self::forward).
    pub fn move_relative(&mut self, x: f32, y: f32, z: f32) {
        self.position += self.orientation() * Vec3::new(x, y, z);
        self.dirty = true;
    }

    /// Add to pitch, yaw and roll (radians).
    pub fn rotate(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.pitch_yaw_roll += Vec3::new(pitch, yaw, roll);
        self.dirty = true;
    }

    /// Multiply the current scale component-wise.
    pub fn scale_by(&mut self, x: f32, y: f32, z: f32) {
        self.scale *= Vec3::new(x, y, z);
        self.dirty = true;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation as (pitch, yaw, roll) in radians.
    pub fn pitch_yaw_roll(&self) -> Vec3 {
        self.pitch_yaw_roll
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Whether the cached matrices are out of date.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// World matrix, rebuilt first if any component changed.
    pub fn world_matrix(&mut self) -> Mat4 {
        self.update_matrices();
        self.world
    }

    /// Inverse-transpose of the world matrix, for transforming normals.
    ///
    /// A zero scale component makes the world matrix singular and the result
    /// non-finite.
    pub fn world_inverse_transpose_matrix(&mut self) -> Mat4 {
        self.update_matrices();
        self.world_inverse_transpose
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// Local +X in world space.
    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    fn orientation(&self) -> Quat {
        let Vec3 {
            x: pitch,
            y: yaw,
            z: roll,
        } = self.pitch_yaw_roll;
        Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll)
    }

    fn update_matrices(&mut self) {
        if !self.dirty {
            return;
        }
        self.world =
            Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position);
        self.world_inverse_transpose = self.world.inverse().transpose();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_new_is_identity_and_clean() {
        let mut t = Transform::new();
        assert!(!t.is_dirty());
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
        assert_eq!(t.world_inverse_transpose_matrix(), Mat4::IDENTITY);
        assert_eq!(t.scale(), Vec3::ONE);
    }

    #[test]
    fn test_mutators_mark_dirty_without_rebuilding() {
        let mut t = Transform::new();
        t.move_absolute(1.0, 0.0, 0.0);
        assert!(t.is_dirty());
        // Cached value is still the old one until read through the accessor.
        assert_eq!(t.world, Mat4::IDENTITY);

        let m = t.world_matrix();
        assert!(!t.is_dirty());
        assert_eq!(m.w_axis.truncate(), Vec3::X);
    }

    #[test]
    fn test_world_matrix_is_idempotent() {
        let mut t = Transform::new();
        t.set_position(4.0, -1.0, 2.5);
        t.set_rotation(0.3, 1.2, -0.4);
        t.set_scale(1.0, 2.0, 3.0);
        let a = t.world_matrix();
        let b = t.world_matrix();
        assert_eq!(a, b);
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_scale_then_translate() {
        let mut t = Transform::new();
        t.set_position(1.0, 2.0, 3.0);
        t.set_scale(2.0, 2.0, 2.0);
        let p = t.world_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), EPS));
    }

    #[test]
    fn test_yaw_quarter_turn_faces_positive_x() {
        let mut t = Transform::new();
        t.set_rotation(0.0, FRAC_PI_2, 0.0);
        assert!(t.forward().abs_diff_eq(Vec3::X, EPS));
        assert!(t.right().abs_diff_eq(Vec3::NEG_Z, EPS));
        assert!(t.up().abs_diff_eq(Vec3::Y, EPS));

        t.move_relative(0.0, 0.0, 1.0);
        assert!(t.position().abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn test_positive_pitch_looks_down() {
        let mut t = Transform::new();
        t.set_rotation(FRAC_PI_2, 0.0, 0.0);
        assert!(t.forward().abs_diff_eq(Vec3::NEG_Y, EPS));
    }

    #[test]
    fn test_rotate_and_scale_accumulate() {
        let mut t = Transform::new();
        t.rotate(0.1, 0.2, 0.3);
        t.rotate(0.1, 0.2, 0.3);
        assert!(t.pitch_yaw_roll().abs_diff_eq(Vec3::new(0.2, 0.4, 0.6), EPS));

        t.scale_by(2.0, 3.0, 4.0);
        t.scale_by(0.5, 1.0, 0.5);
        assert_eq!(t.scale(), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_basis_does_not_touch_cache() {
        let mut t = Transform::new();
        t.rotate(0.0, 0.5, 0.0);
        let _ = t.forward();
        assert!(t.is_dirty());
    }

    #[test]
    fn test_inverse_transpose_keeps_normals_perpendicular() {
        let mut t = Transform::new();
        t.set_scale(1.0, 4.0, 1.0);
        t.set_rotation(0.0, 0.0, 0.7);
        let world = t.world_matrix();
        let it = t.world_inverse_transpose_matrix();

        // Surface tangent along X with normal along Y.
        let tangent = world.transform_vector3(Vec3::X);
        let normal = it.transform_vector3(Vec3::Y);
        assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = EPS);
    }
}
