//! First-person camera.

use glam::{Mat4, Vec3};
use quadray_math::{perspective_projection, rotation, translation};

const WORLD_UP: Vec3 = Vec3::Y;

/// Pitch is kept strictly inside the open interval around the poles to
/// avoid gimbal lock.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A yaw/pitch/roll camera with derived view, projection and
/// ray-direction matrices.
///
/// Every mutation recomputes all derived state in full; there are no
/// incremental updates and therefore no stale matrices. The redundant trig
/// work is irrelevant at per-frame call rates.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    roll: f32,

    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,

    rotation: Mat4,
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    ray_dir: Mat4,

    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov_y: 75_f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
            rotation: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            ray_dir: Mat4::IDENTITY,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.update();
        camera
    }

    /// Update the aspect ratio, e.g. after a window resize.
    pub fn rescale(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update();
    }

    /// Set the vertical field of view (degrees) and clip planes.
    pub fn configure(&mut self, fov_y_degrees: f32, near: f32, far: f32) {
        self.fov_y = fov_y_degrees.to_radians();
        self.near = near;
        self.far = far;
        self.update();
    }

    /// Translate by a world-space delta.
    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
        self.update();
    }

    /// Move along camera-local right, world up and camera-local forward.
    ///
    /// `delta` is `[right, up, forward]`. The caller scales it by elapsed
    /// time and a speed constant for frame-rate independent movement.
    pub fn move_along(&mut self, delta: Vec3) {
        self.position += delta.x * self.right;
        self.position += delta.y * WORLD_UP;
        self.position += delta.z * self.forward;
        self.update();
    }

    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.update();
    }

    /// Apply yaw/pitch deltas (mouse look).
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch += delta_pitch;
        self.update();
    }

    /// Set absolute yaw and pitch.
    ///
    /// Yaw is unbounded and wraps through trig periodicity; pitch is
    /// clamped to `±(π/2 - 0.01)`.
    pub fn rotate_to(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;

        if self.pitch >= std::f32::consts::FRAC_PI_2 {
            self.pitch = PITCH_LIMIT;
        }
        if self.pitch <= -std::f32::consts::FRAC_PI_2 {
            self.pitch = -PITCH_LIMIT;
        }

        self.update();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// The matrix the shading program uses to turn a screen-space pixel
    /// into a world-space ray direction without per-pixel trig.
    pub fn ray_dir_matrix(&self) -> Mat4 {
        self.ray_dir
    }

    fn update(&mut self) {
        self.rotation = rotation(self.yaw, self.pitch, self.roll);

        let world = translation(self.position) * self.rotation;
        self.view = world.inverse();

        self.projection = perspective_projection(self.fov_y, self.aspect, self.near, self.far);
        self.view_projection = self.projection * self.view;

        // Inverse of the position-translated view-projection: applied to a
        // clip-space point it yields `world_point - position`, which is the
        // (unnormalized) ray direction for that pixel.
        self.ray_dir = (self.view_projection * translation(self.position)).inverse();

        self.right = self.rotation.x_axis.truncate();
        self.up = self.rotation.y_axis.truncate();
        self.forward = -self.rotation.z_axis.truncate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_pitch_clamps_at_poles() {
        let mut camera = Camera::new();
        camera.rotate_to(1.0, PI);
        assert_eq!(camera.pitch(), FRAC_PI_2 - 0.01);
        assert_eq!(camera.yaw(), 1.0);

        camera.rotate_to(1.0, -PI);
        assert_eq!(camera.pitch(), -(FRAC_PI_2 - 0.01));
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut camera = Camera::new();
        camera.rotate_to(10.0 * PI, 0.0);
        assert_eq!(camera.yaw(), 10.0 * PI);
    }

    #[test]
    fn test_move_along_default_orientation() {
        let mut camera = Camera::new();
        camera.move_along(Vec3::new(1.0, 2.0, 3.0));
        // right = +X, up = world +Y, forward = -Z
        assert!((camera.position() - Vec3::new(1.0, 2.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn test_move_by_is_world_space() {
        let mut camera = Camera::new();
        camera.rotate_to(-FRAC_PI_2, 0.5);
        camera.move_by(Vec3::new(1.0, 2.0, 3.0));
        camera.move_by(Vec3::new(0.0, -2.0, 0.0));
        // Deltas ignore the orientation entirely.
        assert!((camera.position() - Vec3::new(1.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_move_along_follows_yaw() {
        let mut camera = Camera::new();
        camera.rotate_to(-FRAC_PI_2, 0.0);
        camera.move_along(Vec3::new(0.0, 0.0, 1.0));
        // Yawed -90 degrees, forward is now +X.
        assert!((camera.position() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_up_movement_ignores_pitch() {
        let mut camera = Camera::new();
        camera.rotate_to(0.3, 1.0);
        camera.move_along(Vec3::new(0.0, 1.0, 0.0));
        // World up, not camera up.
        assert!((camera.position() - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_ray_dir_matrix_inverts_translated_view_projection() {
        let mut camera = Camera::new();
        camera.move_to(Vec3::new(1.0, 2.0, 3.0));
        camera.rotate_to(0.5, -0.2);
        camera.rescale(16.0 / 9.0);

        let product = camera.ray_dir_matrix()
            * (camera.view_projection() * translation(camera.position()));
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }

    #[test]
    fn test_mutation_recomputes_view() {
        let mut camera = Camera::new();
        let before = camera.view_projection();
        camera.move_to(Vec3::new(0.0, 5.0, 0.0));
        assert!(!camera.view_projection().abs_diff_eq(before, 1e-6));
    }
}
