//! Frame orchestration.
//!
//! Owns the GPU context, the shading programs, the target pool and the
//! compositor, and moves scene and camera state into uniform buffers
//! before handing the tick to the compositor.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quadray_core::{Camera, Scene, SceneUniformData, TraceUniforms};

use crate::compositor::{Compositor, TargetId};
use crate::context::GpuContext;
use crate::passes::GpuPasses;
use crate::pipelines::Pipelines;
use crate::screenshot;
use crate::target::TargetPool;

pub struct Renderer {
    context: GpuContext,
    pipelines: Pipelines,
    targets: TargetPool,
    compositor: Compositor,
    scene_data: Option<SceneUniformData>,
    rng: StdRng,
    screenshot_requested: bool,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let context = GpuContext::new(window).await?;
        let pipelines = Pipelines::new(&context.device, context.config.format);
        let targets = TargetPool::create(
            &context.device,
            context.size.0,
            context.size.1,
            Compositor::DEFAULT_POOL_SIZE,
        )?;
        let compositor = Compositor::new(Compositor::DEFAULT_POOL_SIZE);

        Ok(Self {
            context,
            pipelines,
            targets,
            compositor,
            scene_data: None,
            rng: StdRng::from_entropy(),
            screenshot_requested: false,
        })
    }

    /// Bind a scene to the compiled pathtracer program.
    ///
    /// Fails when the scene's configured maxima exceed the program's
    /// declared array sizes.
    pub fn attach_scene(&mut self, scene: &mut Scene) -> Result<()> {
        let data = scene.introspect_program(&self.pipelines.layout())?;
        self.scene_data = Some(data);
        Ok(())
    }

    /// Capture the next presented frame to `screenshot.png`.
    pub fn request_screenshot(&mut self) {
        self.screenshot_requested = true;
    }

    /// Run one tick: upload dirty uniforms, trace, composite, present.
    ///
    /// `drop_signaled` invalidates all accumulated results first, which
    /// the caller raises on camera movement.
    pub fn render_frame(
        &mut self,
        camera: &Camera,
        scene: &mut Scene,
        time: f32,
        drop_signaled: bool,
    ) -> Result<()> {
        if let Some(data) = self.scene_data.as_mut() {
            if scene.push_uniforms(data)? {
                self.context.queue.write_buffer(
                    &self.pipelines.surface_buffer,
                    0,
                    bytemuck::cast_slice(&data.surfaces),
                );
                self.context.queue.write_buffer(
                    &self.pipelines.material_buffer,
                    0,
                    bytemuck::cast_slice(&data.materials),
                );
                self.context.queue.write_buffer(
                    &self.pipelines.light_buffer,
                    0,
                    bytemuck::cast_slice(&data.lights),
                );
            }
        }

        let uniforms = TraceUniforms::new(
            camera,
            time,
            self.rng.gen(),
            self.context.size.0,
            self.context.size.1,
        );
        self.context.queue.write_buffer(
            &self.pipelines.trace_uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );

        let mut passes = GpuPasses {
            context: &self.context,
            pipelines: &self.pipelines,
            targets: &self.targets,
        };
        self.compositor.render(drop_signaled, &mut passes)?;

        if self.screenshot_requested {
            self.screenshot_requested = false;
            // The tick above advanced the index, so the slot just traced
            // is the one before it.
            let pool_size = self.compositor.pool_size();
            let just_traced =
                (self.compositor.current_target_index() + pool_size - 1) % pool_size;
            let source = if self.compositor.finished_accumulation() {
                TargetId::Accumulator
            } else {
                TargetId::Pool(just_traced)
            };
            let target = match source {
                TargetId::Pool(i) => self.targets.pool_target(i),
                TargetId::Preview => self.targets.preview(),
                TargetId::Accumulator => self.targets.accumulator(),
            };
            screenshot::save_png(
                &self.context.device,
                &self.context.queue,
                &target.texture,
                self.context.size.0,
                self.context.size.1,
                std::path::Path::new("screenshot.png"),
            )?;
            log::info!("saved screenshot.png");
        }

        Ok(())
    }

    /// Rebuild the swapchain and the whole target pool at the new size.
    ///
    /// All accumulated results are discarded; a fresh compositor restarts
    /// accumulation from batch 1.
    pub fn resize(&mut self, new_size: (u32, u32)) -> Result<()> {
        if new_size.0 == 0 || new_size.1 == 0 {
            return Ok(());
        }

        self.context.resize(new_size);
        self.targets.dispose();
        self.targets = TargetPool::create(
            &self.context.device,
            new_size.0,
            new_size.1,
            self.compositor.pool_size(),
        )?;
        self.compositor = Compositor::new(self.compositor.pool_size());

        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        self.context.size
    }

    pub fn aspect(&self) -> f32 {
        self.context.size.0 as f32 / self.context.size.1.max(1) as f32
    }
}
