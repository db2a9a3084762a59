//! GPU uniform layouts.
//!
//! These Pod structs mirror the uniform blocks declared by the shading
//! programs (std140 layout, every member padded to 16 bytes). The slot
//! arrays replace per-frame uniform-name lookups: the slot table is built
//! once at program introspection time and indexed numerically afterwards.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::camera::Camera;
use crate::light::PointLight;
use crate::material::Material;
use crate::surface::Surface;

/// Array capacities declared by a compiled shading program.
///
/// The pathtracer declares fixed-size uniform arrays; a scene can only be
/// bound to a program whose arrays are at least as large as the scene's
/// configured maxima.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    pub max_surfaces: usize,
    pub max_materials: usize,
    pub max_lights: usize,
}

/// One surface slot of the pathtracer's `surfaces` array.
///
/// `material_id == -1` marks the slot unused; the shading program skips it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceSlot {
    pub q: [[f32; 4]; 4],
    pub c: [[f32; 4]; 4],
    pub material_id: i32,
    pub _pad: [u32; 3],
}

impl SurfaceSlot {
    pub const INACTIVE: Self = Self {
        q: [[0.0; 4]; 4],
        c: [[0.0; 4]; 4],
        material_id: -1,
        _pad: [0; 3],
    };

    pub fn from_surface(surface: &Surface) -> Self {
        Self {
            q: surface.q().to_cols_array_2d(),
            c: surface.c().to_cols_array_2d(),
            material_id: surface.material_id(),
            _pad: [0; 3],
        }
    }
}

/// One material slot. Shininess rides in `specular.w`, the index of
/// refraction in `ior.x`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialSlot {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub reflectivity: [f32; 4],
    pub refractivity: [f32; 4],
    pub ior: [f32; 4],
}

impl MaterialSlot {
    pub fn from_material(material: &Material) -> Self {
        Self {
            diffuse: material.diffuse.extend(0.0).to_array(),
            specular: material.specular.extend(material.shininess).to_array(),
            emissive: material.emissive.extend(0.0).to_array(),
            reflectivity: material.reflectivity.to_array(),
            refractivity: material.refractivity.to_array(),
            ior: [material.ior, 0.0, 0.0, 0.0],
        }
    }
}

/// One point-light slot. `enabled == 0` disables the slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightSlot {
    pub position: [f32; 4],
    pub intensity: [f32; 4],
    pub falloff: [f32; 4],
    pub enabled: u32,
    pub _pad: [u32; 3],
}

impl LightSlot {
    pub const DISABLED: Self = Self {
        position: [0.0; 4],
        intensity: [0.0; 4],
        falloff: [0.0; 4],
        enabled: 0,
        _pad: [0; 3],
    };

    pub fn from_light(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            intensity: light.intensity.extend(0.0).to_array(),
            falloff: light.falloff.extend(0.0).to_array(),
            enabled: 1,
            _pad: [0; 3],
        }
    }
}

/// Per-frame uniforms of the pathtracer program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TraceUniforms {
    pub ray_dir_matrix: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub time: f32,
    pub seed: u32,
    pub pixel_size: [f32; 2],
}

impl TraceUniforms {
    pub fn new(camera: &Camera, time: f32, seed: u32, width: u32, height: u32) -> Self {
        let p = camera.position();
        Self {
            ray_dir_matrix: camera.ray_dir_matrix().to_cols_array_2d(),
            position: Vec4::new(p.x, p.y, p.z, 1.0).to_array(),
            time,
            seed,
            pixel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
        }
    }
}

/// The resolved slot table for one compiled pathtracer program.
///
/// Built by [`Scene::introspect_program`](crate::Scene::introspect_program),
/// filled by [`Scene::push_uniforms`](crate::Scene::push_uniforms) and
/// uploaded verbatim by the renderer.
#[derive(Clone, Debug)]
pub struct SceneUniformData {
    pub surfaces: Vec<SurfaceSlot>,
    pub materials: Vec<MaterialSlot>,
    pub lights: Vec<LightSlot>,
}

impl SceneUniformData {
    pub fn new(max_surfaces: usize, max_materials: usize, max_lights: usize) -> Self {
        Self {
            surfaces: vec![SurfaceSlot::INACTIVE; max_surfaces],
            materials: vec![MaterialSlot::zeroed(); max_materials],
            lights: vec![LightSlot::DISABLED; max_lights],
        }
    }
}
