//! The built-in demonstration scene: a walled room with a few quadric
//! shapes, one of them clipped, lit by three point lights.

use std::f32::consts::FRAC_PI_2;

use anyhow::Result;
use glam::{Vec3, Vec4};
use quadray_core::{Material, PointLight, Scene, Surface};
use quadray_math::{
    everywhere, hyperboloid, rotation, scaling, translation, unit_cylinder, unit_plane,
    unit_sphere,
};

const WALL_RED: i32 = 0;
const WALL_GREEN: i32 = 1;
const WALL_BLUE: i32 = 2;
const GLASS: i32 = 3;
const MIRROR_WHITE: i32 = 6;

fn room_walls() -> Vec<Surface> {
    // Floor and ceiling keep the plane's identity orientation; the side
    // walls pitch or roll the plane upright before translating it out.
    vec![
        Surface::new(unit_plane(), everywhere(), WALL_RED),
        Surface::new(
            unit_plane().transformed(translation(Vec3::new(0.0, 8.0, 0.0))),
            everywhere(),
            WALL_RED,
        ),
        Surface::new(
            unit_plane().transformed(
                translation(Vec3::new(0.0, 0.0, -4.0)) * rotation(0.0, -FRAC_PI_2, 0.0),
            ),
            everywhere(),
            WALL_GREEN,
        ),
        Surface::new(
            unit_plane().transformed(
                translation(Vec3::new(0.0, 0.0, 4.0)) * rotation(0.0, -FRAC_PI_2, 0.0),
            ),
            everywhere(),
            WALL_GREEN,
        ),
        Surface::new(
            unit_plane().transformed(
                translation(Vec3::new(4.0, 0.0, 0.0)) * rotation(0.0, 0.0, FRAC_PI_2),
            ),
            everywhere(),
            WALL_BLUE,
        ),
        Surface::new(
            unit_plane().transformed(
                translation(Vec3::new(-4.0, 0.0, 0.0)) * rotation(0.0, 0.0, FRAC_PI_2),
            ),
            everywhere(),
            WALL_BLUE,
        ),
    ]
}

/// Build the demonstration scene.
pub fn create_scene() -> Result<Scene> {
    let mut scene = Scene::new(16, 8, 8);

    scene.add_materials([
        Material::new(Vec3::new(1.0, 0.05, 0.05)).with_specular(Vec3::splat(0.1), 12.0),
        Material::new(Vec3::new(0.05, 1.0, 0.05)).with_specular(Vec3::splat(0.1), 12.0),
        Material::new(Vec3::new(0.05, 0.05, 1.0)).with_specular(Vec3::splat(0.1), 12.0),
        Material::new(Vec3::new(1.0, 1.0, 0.05))
            .with_specular(Vec3::splat(0.3), 80.0)
            .with_refractivity(Vec4::new(0.9, 0.9, 0.8, 0.7), 1.45),
        Material::new(Vec3::new(1.0, 0.05, 1.0)).with_specular(Vec3::splat(0.3), 80.0),
        Material::new(Vec3::new(0.05, 1.0, 1.0)).with_specular(Vec3::splat(0.3), 80.0),
        Material::new(Vec3::splat(1.0))
            .with_specular(Vec3::splat(0.5), 240.0)
            .with_reflectivity(Vec4::new(0.25, 0.25, 0.25, 1.0)),
        Material::new(Vec3::ZERO).with_emissive(Vec3::new(15.0, 1.0, 1.0)),
    ])?;

    scene.add_point_lights([
        PointLight::new(
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::splat(2.0),
            Vec3::new(1.0, 0.55, 0.75),
        ),
        PointLight::new(
            Vec3::new(2.0, 7.0, -2.0),
            Vec3::splat(2.0),
            Vec3::new(1.0, 0.15, 0.25),
        ),
        PointLight::new(
            Vec3::new(-2.0, 1.0, 2.0),
            Vec3::splat(2.0),
            Vec3::new(1.0, 0.15, 0.25),
        ),
    ])?;

    let mut surfaces = vec![
        Surface::new(
            unit_sphere().transformed(translation(Vec3::new(-2.0, 3.0, 0.0))),
            everywhere(),
            MIRROR_WHITE,
        ),
        // A sphere cut open by a second sphere offset into its corner.
        Surface::new(
            unit_sphere(),
            unit_sphere().transformed(translation(Vec3::new(0.5, 0.5, 0.0))),
            GLASS,
        ),
        Surface::new(
            unit_cylinder().transformed(translation(Vec3::new(2.0, 5.0, 0.0))),
            everywhere(),
            MIRROR_WHITE,
        ),
        // An hourglass: a hyperboloid kept only inside a sphere.
        Surface::new(
            hyperboloid(6.0, 4.0, 6.0).transformed(translation(Vec3::new(0.0, 4.0, 0.0))),
            unit_sphere().transformed(
                translation(Vec3::new(0.0, 4.0, 0.0)) * scaling(1.25, 1.25, 1.25),
            ),
            MIRROR_WHITE,
        ),
    ];
    surfaces.extend(room_walls());
    scene.add_surfaces(surfaces)?;

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadray_core::ProgramLayout;

    #[test]
    fn test_demo_scene_builds() {
        let scene = create_scene().unwrap();
        assert_eq!(scene.surface_count(), 10);
        assert_eq!(scene.material_count(), 8);
        assert_eq!(scene.point_light_count(), 3);
    }

    #[test]
    fn test_demo_scene_pushes_cleanly() {
        let mut scene = create_scene().unwrap();
        let mut data = scene
            .introspect_program(&ProgramLayout {
                max_surfaces: 16,
                max_materials: 8,
                max_lights: 8,
            })
            .unwrap();
        assert!(scene.push_uniforms(&mut data).unwrap());

        // 10 used slots, the rest inactive.
        assert!(data.surfaces[..10].iter().all(|s| s.material_id >= 0));
        assert!(data.surfaces[10..].iter().all(|s| s.material_id == -1));
        assert_eq!(data.lights.iter().filter(|l| l.enabled == 1).count(), 3);
    }
}
