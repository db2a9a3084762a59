//! Quadray core - CPU-side scene and camera state for the path tracer.
//!
//! This crate provides:
//!
//! - **Scene registry**: fixed-capacity tables of [`Surface`], [`Material`]
//!   and [`PointLight`] entries, plus the dirty-tracked uniform push that
//!   feeds the shading program.
//! - **Camera**: first-person camera with derived view/projection and
//!   ray-direction matrices.
//! - **Uniform layouts**: `bytemuck`-Pod structs matching the shading
//!   program's uniform blocks.
//!
//! Nothing in here owns GPU handles; the render crate decides when and
//! where the described data is uploaded.

pub mod camera;
pub mod light;
pub mod material;
pub mod scene;
pub mod surface;
pub mod uniforms;

pub use camera::Camera;
pub use light::PointLight;
pub use material::Material;
pub use scene::{Scene, SceneError};
pub use surface::Surface;
pub use uniforms::{
    LightSlot, MaterialSlot, ProgramLayout, SceneUniformData, SurfaceSlot, TraceUniforms,
};
