// Affine transform helpers shared by the camera and the quadric surfaces.
//
// Everything is column-vector convention, matching glam: a matrix product
// `a * b` applies `b` to a point first.

use glam::{Mat4, Vec3};

/// Rotation about the camera-local forward axis (Z).
pub fn roll_rotation(roll: f32) -> Mat4 {
    Mat4::from_rotation_z(roll)
}

/// Rotation about the camera-local right axis (X).
pub fn pitch_rotation(pitch: f32) -> Mat4 {
    Mat4::from_rotation_x(pitch)
}

/// Rotation about the world up axis (Y).
pub fn yaw_rotation(yaw: f32) -> Mat4 {
    Mat4::from_rotation_y(yaw)
}

/// Combined yaw/pitch/roll rotation.
///
/// Roll is applied first, then pitch, then yaw, so the matrix reads
/// `yaw * pitch * roll`.
pub fn rotation(yaw: f32, pitch: f32, roll: f32) -> Mat4 {
    yaw_rotation(yaw) * pitch_rotation(pitch) * roll_rotation(roll)
}

/// Translation by `offset`.
pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Non-uniform scale.
pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

/// Right-handed perspective projection with a [0, 1] depth range.
pub fn perspective_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}
