//! Fixed-capacity scene registry.
//!
//! The shading program declares fixed-size uniform arrays, so the scene is
//! bounded by configured maxima and entries are only ever added, never
//! removed. A dirty flag tracks whether the GPU-side uniform state must be
//! re-pushed; pushing is a no-op otherwise.

use thiserror::Error;

use crate::light::PointLight;
use crate::material::Material;
use crate::surface::Surface;
use crate::uniforms::{LightSlot, MaterialSlot, ProgramLayout, SceneUniformData, SurfaceSlot};

/// Errors raised by the scene registry.
///
/// All of these are fatal to the operation that triggered them and commit
/// no partial state; there is no retry path.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("cannot add more than {max} {what}")]
    CapacityExceeded { what: &'static str, max: usize },

    #[error("invalid material id {id} (scene has room for {max} materials)")]
    InvalidMaterialId { id: i32, max: usize },

    #[error("scene needs {required} {what} slots but the shading program declares {available}")]
    LayoutTooSmall {
        what: &'static str,
        required: usize,
        available: usize,
    },
}

/// Ordered tables of surfaces, materials and point lights, bounded by the
/// maxima passed at construction.
#[derive(Debug)]
pub struct Scene {
    surfaces: Vec<Surface>,
    materials: Vec<Material>,
    point_lights: Vec<PointLight>,

    max_surfaces: usize,
    max_materials: usize,
    max_point_lights: usize,

    should_apply_uniforms: bool,
}

impl Scene {
    pub fn new(max_surfaces: usize, max_materials: usize, max_point_lights: usize) -> Self {
        Self {
            surfaces: Vec::with_capacity(max_surfaces),
            materials: Vec::with_capacity(max_materials),
            point_lights: Vec::with_capacity(max_point_lights),
            max_surfaces,
            max_materials,
            max_point_lights,
            should_apply_uniforms: true,
        }
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn point_light_count(&self) -> usize {
        self.point_lights.len()
    }

    pub fn max_surfaces(&self) -> usize {
        self.max_surfaces
    }

    pub fn max_materials(&self) -> usize {
        self.max_materials
    }

    pub fn max_point_lights(&self) -> usize {
        self.max_point_lights
    }

    /// Mutable access to a surface, for transform animation.
    ///
    /// Marks the uniform state dirty: the next push re-uploads the scene.
    pub fn surface_mut(&mut self, index: usize) -> Option<&mut Surface> {
        self.should_apply_uniforms = true;
        self.surfaces.get_mut(index)
    }

    pub fn add_surface(&mut self, surface: Surface) -> Result<(), SceneError> {
        self.add_surfaces([surface])
    }

    /// Append surfaces. Fails without appending anything if the batch
    /// would exceed the configured maximum.
    pub fn add_surfaces(
        &mut self,
        surfaces: impl IntoIterator<Item = Surface>,
    ) -> Result<(), SceneError> {
        let batch: Vec<Surface> = surfaces.into_iter().collect();
        if self.surfaces.len() + batch.len() > self.max_surfaces {
            return Err(SceneError::CapacityExceeded {
                what: "surfaces",
                max: self.max_surfaces,
            });
        }
        self.surfaces.extend(batch);
        self.should_apply_uniforms = true;
        Ok(())
    }

    pub fn add_material(&mut self, material: Material) -> Result<(), SceneError> {
        self.add_materials([material])
    }

    pub fn add_materials(
        &mut self,
        materials: impl IntoIterator<Item = Material>,
    ) -> Result<(), SceneError> {
        let batch: Vec<Material> = materials.into_iter().collect();
        if self.materials.len() + batch.len() > self.max_materials {
            return Err(SceneError::CapacityExceeded {
                what: "materials",
                max: self.max_materials,
            });
        }
        self.materials.extend(batch);
        self.should_apply_uniforms = true;
        Ok(())
    }

    pub fn add_point_light(&mut self, light: PointLight) -> Result<(), SceneError> {
        self.add_point_lights([light])
    }

    pub fn add_point_lights(
        &mut self,
        lights: impl IntoIterator<Item = PointLight>,
    ) -> Result<(), SceneError> {
        let batch: Vec<PointLight> = lights.into_iter().collect();
        if self.point_lights.len() + batch.len() > self.max_point_lights {
            return Err(SceneError::CapacityExceeded {
                what: "point lights",
                max: self.max_point_lights,
            });
        }
        self.point_lights.extend(batch);
        self.should_apply_uniforms = true;
        Ok(())
    }

    /// Resolve the slot table for a compiled shading program.
    ///
    /// Allocates one slot per configured maximum (not just occupied slots,
    /// since the program's arrays are fixed-size) after checking that the
    /// scene fits the program's declared capacities. Must be re-run
    /// whenever the program is recompiled; always marks the uniform state
    /// dirty so the next push re-uploads everything.
    pub fn introspect_program(
        &mut self,
        layout: &ProgramLayout,
    ) -> Result<SceneUniformData, SceneError> {
        if self.max_surfaces > layout.max_surfaces {
            return Err(SceneError::LayoutTooSmall {
                what: "surface",
                required: self.max_surfaces,
                available: layout.max_surfaces,
            });
        }
        if self.max_materials > layout.max_materials {
            return Err(SceneError::LayoutTooSmall {
                what: "material",
                required: self.max_materials,
                available: layout.max_materials,
            });
        }
        if self.max_point_lights > layout.max_lights {
            return Err(SceneError::LayoutTooSmall {
                what: "light",
                required: self.max_point_lights,
                available: layout.max_lights,
            });
        }

        self.should_apply_uniforms = true;

        log::debug!(
            "introspected shading program: {}/{} surface, {}/{} material, {}/{} light slots",
            self.max_surfaces,
            layout.max_surfaces,
            self.max_materials,
            layout.max_materials,
            self.max_point_lights,
            layout.max_lights,
        );

        Ok(SceneUniformData::new(
            self.max_surfaces,
            self.max_materials,
            self.max_point_lights,
        ))
    }

    /// Fill the slot table from the current scene state.
    ///
    /// Returns `Ok(false)` without touching `data` when nothing changed
    /// since the last push. Otherwise every surface slot is either filled
    /// from its surface (after validating the material reference) or
    /// marked inactive with `material_id = -1`, and every unused light
    /// slot is disabled.
    ///
    /// Material references are validated for the whole scene before any
    /// slot is written, so a failed push leaves `data` untouched.
    pub fn push_uniforms(&mut self, data: &mut SceneUniformData) -> Result<bool, SceneError> {
        if !self.should_apply_uniforms {
            return Ok(false);
        }

        for surface in &self.surfaces {
            let id = surface.material_id();
            if id < 0 || id as usize >= self.max_materials {
                return Err(SceneError::InvalidMaterialId {
                    id,
                    max: self.max_materials,
                });
            }
        }

        for (i, slot) in data.surfaces.iter_mut().enumerate() {
            *slot = match self.surfaces.get(i) {
                Some(surface) => SurfaceSlot::from_surface(surface),
                None => SurfaceSlot::INACTIVE,
            };
        }

        for (i, slot) in data.materials.iter_mut().enumerate() {
            if let Some(material) = self.materials.get(i) {
                *slot = MaterialSlot::from_material(material);
            }
        }

        for (i, slot) in data.lights.iter_mut().enumerate() {
            *slot = match self.point_lights.get(i) {
                Some(light) => LightSlot::from_light(light),
                None => LightSlot::DISABLED,
            };
        }

        self.should_apply_uniforms = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use quadray_math::{everywhere, translation, unit_sphere};

    fn sphere_surface(material_id: i32) -> Surface {
        Surface::new(
            unit_sphere().transformed(translation(Vec3::new(0.0, 1.0, 0.0))),
            everywhere(),
            material_id,
        )
    }

    fn grey() -> Material {
        Material::new(Vec3::splat(0.5))
    }

    fn lamp() -> PointLight {
        PointLight::new(Vec3::new(0.0, 4.0, 0.0), Vec3::splat(2.0), Vec3::new(1.0, 0.5, 0.25))
    }

    fn layout(s: usize, m: usize, l: usize) -> ProgramLayout {
        ProgramLayout {
            max_surfaces: s,
            max_materials: m,
            max_lights: l,
        }
    }

    #[test]
    fn test_capacity_violation_never_partially_appends() {
        let mut scene = Scene::new(2, 4, 2);
        scene.add_surface(sphere_surface(0)).unwrap();

        let err = scene
            .add_surfaces([sphere_surface(0), sphere_surface(1)])
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::CapacityExceeded {
                what: "surfaces",
                max: 2
            }
        );
        assert_eq!(scene.surface_count(), 1);

        // Failing again keeps failing; the registry is statically sized.
        assert!(scene
            .add_surfaces([sphere_surface(0), sphere_surface(1)])
            .is_err());
        assert_eq!(scene.surface_count(), 1);
    }

    #[test]
    fn test_material_and_light_capacity() {
        let mut scene = Scene::new(8, 1, 1);
        scene.add_material(grey()).unwrap();
        assert!(scene.add_material(grey()).is_err());
        assert_eq!(scene.material_count(), 1);

        scene.add_point_light(lamp()).unwrap();
        assert!(scene.add_point_lights([lamp(), lamp()]).is_err());
        assert_eq!(scene.point_light_count(), 1);
    }

    #[test]
    fn test_introspection_rejects_small_program() {
        let mut scene = Scene::new(16, 8, 8);
        let err = scene.introspect_program(&layout(8, 8, 8)).unwrap_err();
        assert_eq!(
            err,
            SceneError::LayoutTooSmall {
                what: "surface",
                required: 16,
                available: 8
            }
        );
    }

    #[test]
    fn test_push_uniforms_end_to_end() {
        let mut scene = Scene::new(8, 4, 2);
        scene.add_surface(sphere_surface(0)).unwrap();
        scene.add_material(grey()).unwrap();

        let mut data = scene.introspect_program(&layout(16, 8, 8)).unwrap();
        assert_eq!(data.surfaces.len(), 8);
        assert_eq!(data.materials.len(), 4);
        assert_eq!(data.lights.len(), 2);

        assert!(scene.push_uniforms(&mut data).unwrap());

        assert_eq!(data.surfaces[0].material_id, 0);
        for slot in &data.surfaces[1..] {
            assert_eq!(slot.material_id, -1);
        }
        for slot in &data.lights {
            assert_eq!(slot.enabled, 0);
        }
    }

    #[test]
    fn test_push_is_noop_when_clean() {
        let mut scene = Scene::new(4, 2, 1);
        scene.add_material(grey()).unwrap();
        scene.add_surface(sphere_surface(0)).unwrap();

        let mut data = scene.introspect_program(&layout(4, 2, 1)).unwrap();
        assert!(scene.push_uniforms(&mut data).unwrap());
        assert!(!scene.push_uniforms(&mut data).unwrap());

        // Any add re-arms the push.
        scene.add_point_light(lamp()).unwrap();
        assert!(scene.push_uniforms(&mut data).unwrap());
        assert_eq!(data.lights[0].enabled, 1);

        // So does re-introspection after a program recompile.
        let mut data = scene.introspect_program(&layout(4, 2, 1)).unwrap();
        assert!(scene.push_uniforms(&mut data).unwrap());
    }

    #[test]
    fn test_invalid_material_id_fails_before_any_write() {
        let mut scene = Scene::new(4, 2, 1);
        scene.add_material(grey()).unwrap();
        scene.add_surface(sphere_surface(0)).unwrap();
        scene.add_surface(sphere_surface(5)).unwrap();

        let mut data = scene.introspect_program(&layout(4, 2, 1)).unwrap();
        let before = data.clone();

        let err = scene.push_uniforms(&mut data).unwrap_err();
        assert_eq!(err, SceneError::InvalidMaterialId { id: 5, max: 2 });

        // Slot 0 references a valid material but must not have been
        // written either.
        assert_eq!(data.surfaces[0], before.surfaces[0]);
        assert_eq!(data.lights[0], before.lights[0]);
    }

    #[test]
    fn test_surface_mut_marks_dirty() {
        let mut scene = Scene::new(4, 2, 1);
        scene.add_material(grey()).unwrap();
        scene.add_surface(sphere_surface(0)).unwrap();

        let mut data = scene.introspect_program(&layout(4, 2, 1)).unwrap();
        scene.push_uniforms(&mut data).unwrap();

        scene
            .surface_mut(0)
            .unwrap()
            .transform_q(translation(Vec3::new(1.0, 0.0, 0.0)));
        assert!(scene.push_uniforms(&mut data).unwrap());

        // Wholesale transform replacement takes the same upload path.
        let t = translation(Vec3::new(0.0, 2.0, 0.0));
        let surface = scene.surface_mut(0).unwrap();
        surface.transform_q_to(t);
        surface.transform_c_to(t);
        assert!(scene.push_uniforms(&mut data).unwrap());

        let expected = Surface::new(
            unit_sphere().transformed(t),
            everywhere().transformed(t),
            0,
        );
        let pushed_q = Mat4::from_cols_array_2d(&data.surfaces[0].q);
        let pushed_c = Mat4::from_cols_array_2d(&data.surfaces[0].c);
        assert!(pushed_q.abs_diff_eq(expected.q(), 1e-6));
        assert!(pushed_c.abs_diff_eq(expected.c(), 1e-6));
    }
}
