//! Quadric surface matrices.
//!
//! A quadric surface is the zero set of a second-degree implicit equation.
//! In homogeneous coordinates that equation is `pᵀ · Q · p = 0` for a
//! symmetric 4x4 matrix `Q`, evaluated with `p = (x, y, z, 1)`. Points with
//! a negative form value are inside the surface, which is what the clipping
//! volume test relies on.

use glam::{Mat4, Vec4};

/// Evaluate the quadric form `pᵀ · Q · p` at a homogeneous point.
pub fn quadric_form(q: &Mat4, p: Vec4) -> f32 {
    p.dot(*q * p)
}

/// A quadric surface under a cumulative affine transform.
///
/// The base matrix `m` stays fixed; placing the surface in the world is
/// done by composing affine transforms onto `t`. The matrix handed to the
/// shading program is `t⁻¹ · m · (t⁻¹)ᵀ`, re-derived eagerly on every
/// mutation so no stale state is ever observable.
///
/// A singular `t` has no inverse; the effective matrix then fills with
/// NaNs. Callers must avoid degenerate transforms, this is not a checked
/// error.
#[derive(Clone, Debug)]
pub struct QuadricMatrix {
    m: Mat4,
    t: Mat4,
    effective: Mat4,
}

impl QuadricMatrix {
    /// Wrap a base quadric matrix with an identity transform.
    pub fn new(m: Mat4) -> Self {
        let mut q = Self {
            m,
            t: Mat4::IDENTITY,
            effective: Mat4::IDENTITY,
        };
        q.update();
        q
    }

    /// Compose `delta` onto the cumulative transform: `t = t * delta`.
    pub fn transform(&mut self, delta: Mat4) {
        self.t = self.t * delta;
        self.update();
    }

    /// Replace the cumulative transform wholesale.
    pub fn transform_to(&mut self, t: Mat4) {
        self.t = t;
        self.update();
    }

    /// Builder form of [`transform`](Self::transform) for scene assembly.
    pub fn transformed(mut self, delta: Mat4) -> Self {
        self.transform(delta);
        self
    }

    /// The effective matrix `t⁻¹ · m · (t⁻¹)ᵀ` exposed to the shading
    /// program.
    pub fn matrix(&self) -> Mat4 {
        self.effective
    }

    fn update(&mut self) {
        let t_inv = self.t.inverse();
        self.effective = t_inv * self.m * t_inv.transpose();
    }
}

/// The unit sphere `x² + y² + z² - 1 = 0`.
pub fn unit_sphere() -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(1.0, 1.0, 1.0, -1.0)))
}

/// The plane `y = 0`, inside below.
pub fn unit_plane() -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_cols(
        Vec4::ZERO,
        Vec4::new(0.0, 0.0, 0.0, 0.5),
        Vec4::ZERO,
        Vec4::new(0.0, 0.5, 0.0, 0.0),
    ))
}

/// The infinite cylinder `x² + z² - 1 = 0` around the Y axis.
pub fn unit_cylinder() -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(1.0, 0.0, 1.0, -1.0)))
}

/// A degenerate quadric whose form value is -1 everywhere.
///
/// Used as a clipping volume that keeps the whole primary surface.
pub fn everywhere() -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(0.0, 0.0, 0.0, -1.0)))
}

/// The unit hyperboloid `x² + y² - z² - 1 = 0`.
pub fn unit_hyperboloid() -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(1.0, 1.0, -1.0, -1.0)))
}

/// An axis-aligned ellipsoid `a·x² + b·y² + c·z² - 1 = 0`.
pub fn ellipsoid(a: f32, b: f32, c: f32) -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(a, b, c, -1.0)))
}

/// A hyperboloid `a·x² + b·y² - c·z² - 1 = 0`.
pub fn hyperboloid(a: f32, b: f32, c: f32) -> QuadricMatrix {
    QuadricMatrix::new(Mat4::from_diagonal(Vec4::new(a, b, -c, -1.0)))
}
