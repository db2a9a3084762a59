//! Renderable surfaces: a quadric shape clipped by a quadric volume.

use glam::Mat4;
use quadray_math::QuadricMatrix;

/// A scene surface.
///
/// The primary quadric `q` defines the shape, the clipping quadric `c`
/// discards intersections outside its volume (intersection-of-halfspace
/// semantics; use [`quadray_math::everywhere`] to keep everything).
/// `material_id` indexes the scene's material table and is validated when
/// uniforms are pushed.
///
/// Surfaces stay mutable in transform after being added to a scene, but
/// their count and material assignment are fixed.
#[derive(Clone, Debug)]
pub struct Surface {
    q: QuadricMatrix,
    c: QuadricMatrix,
    material_id: i32,
}

impl Surface {
    pub fn new(q: QuadricMatrix, c: QuadricMatrix, material_id: i32) -> Self {
        Self { q, c, material_id }
    }

    /// Effective matrix of the primary quadric.
    pub fn q(&self) -> Mat4 {
        self.q.matrix()
    }

    /// Effective matrix of the clipping quadric.
    pub fn c(&self) -> Mat4 {
        self.c.matrix()
    }

    pub fn material_id(&self) -> i32 {
        self.material_id
    }

    /// Compose a transform onto the primary quadric.
    pub fn transform_q(&mut self, delta: Mat4) {
        self.q.transform(delta);
    }

    /// Compose a transform onto the clipping quadric.
    pub fn transform_c(&mut self, delta: Mat4) {
        self.c.transform(delta);
    }

    /// Replace the primary quadric's transform.
    pub fn transform_q_to(&mut self, t: Mat4) {
        self.q.transform_to(t);
    }

    /// Replace the clipping quadric's transform.
    pub fn transform_c_to(&mut self, t: Mat4) {
        self.c.transform_to(t);
    }
}
