//! Surface materials for the shading program.

use glam::{Vec3, Vec4};

/// A Phong-style material with optional mirror reflection and refraction.
///
/// Immutable after construction; build one with [`Material::new`] and the
/// `with_*` methods, then hand it to the scene registry.
#[derive(Clone, Debug)]
pub struct Material {
    /// Diffuse color (RGB, linear)
    pub diffuse: Vec3,

    /// Specular color (RGB, linear)
    pub specular: Vec3,

    /// Specular exponent
    pub shininess: f32,

    /// Emitted radiance (RGB, linear)
    pub emissive: Vec3,

    /// Mirror reflection tint (RGB) and blend factor (w)
    pub reflectivity: Vec4,

    /// Refraction tint (RGB) and blend factor (w)
    pub refractivity: Vec4,

    /// Index of refraction
    pub ior: f32,
}

impl Material {
    /// A matte material with the given diffuse color.
    pub fn new(diffuse: Vec3) -> Self {
        Self {
            diffuse,
            specular: Vec3::ZERO,
            shininess: 1.0,
            emissive: Vec3::ZERO,
            reflectivity: Vec4::ZERO,
            refractivity: Vec4::ZERO,
            ior: 1.0,
        }
    }

    /// Set the specular color and exponent.
    pub fn with_specular(mut self, specular: Vec3, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Set the emitted radiance.
    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.emissive = emissive;
        self
    }

    /// Set the reflection tint (RGB) and blend factor (w).
    pub fn with_reflectivity(mut self, reflectivity: Vec4) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    /// Set the refraction tint (RGB), blend factor (w) and index of
    /// refraction.
    pub fn with_refractivity(mut self, refractivity: Vec4, ior: f32) -> Self {
        self.refractivity = refractivity;
        self.ior = ior;
        self
    }

    /// Check if this material emits light.
    pub fn is_emissive(&self) -> bool {
        self.emissive.length_squared() > 0.0
    }
}
