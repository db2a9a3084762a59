//! Point lights.

use glam::Vec3;

/// A point light with distance falloff.
///
/// Immutable after construction. The received intensity at distance `d` is
/// `intensity / (falloff.x + falloff.y * d + falloff.z * d²)`.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,

    /// Emitted intensity (RGB, linear)
    pub intensity: Vec3,

    /// Constant / linear / quadratic falloff coefficients
    pub falloff: Vec3,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: Vec3, falloff: Vec3) -> Self {
        Self {
            position,
            intensity,
            falloff,
        }
    }
}
