//! GPU renderer: wgpu device management, shading programs, the
//! progressive accumulation compositor and frame orchestration.

pub mod compositor;
pub mod context;
pub mod passes;
pub mod pipelines;
pub mod renderer;
pub mod screenshot;
pub mod target;

pub use compositor::{Compositor, FramePasses, TargetId};
pub use context::GpuContext;
pub use pipelines::{Pipelines, MAX_LIGHTS, MAX_MATERIALS, MAX_SURFACES};
pub use renderer::Renderer;
pub use target::{RenderTarget, TargetPool};
