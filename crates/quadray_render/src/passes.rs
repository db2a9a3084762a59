//! wgpu execution of the compositor's pass contract.
//!
//! Every operation records and submits its own command encoder. Bind
//! groups are rebuilt per pass; at a handful of compositing passes per
//! tick the churn is irrelevant next to the trace itself.

use anyhow::Result;

use crate::compositor::{FramePasses, TargetId};
use crate::context::GpuContext;
use crate::pipelines::Pipelines;
use crate::target::TargetPool;

/// Borrows the GPU state for the duration of one compositor tick.
pub struct GpuPasses<'a> {
    pub context: &'a GpuContext,
    pub pipelines: &'a Pipelines,
    pub targets: &'a TargetPool,
}

impl<'a> GpuPasses<'a> {
    fn view(&self, id: TargetId) -> &wgpu::TextureView {
        match id {
            TargetId::Pool(i) => &self.targets.pool_target(i).view,
            TargetId::Preview => &self.targets.preview().view,
            TargetId::Accumulator => &self.targets.accumulator().view,
        }
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    fn two_texture_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        a: TargetId,
        b: TargetId,
    ) -> wgpu::BindGroup {
        self.context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("compositing inputs"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.view(a)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(self.view(b)),
                    },
                ],
            })
    }

    fn fullscreen_pass(
        &self,
        label: &str,
        dest: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut encoder = self.encoder(label);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: dest,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.submit(encoder);
    }
}

impl FramePasses for GpuPasses<'_> {
    fn clear(&mut self, target: TargetId) {
        let view = self.view(target);
        let mut encoder = self.encoder("clear");
        {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.submit(encoder);
    }

    fn trace(&mut self, dest: TargetId, previous: TargetId) {
        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("trace inputs"),
                layout: &self.pipelines.trace_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.pipelines.trace_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.pipelines.surface_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.pipelines.material_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.pipelines.light_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(self.view(previous)),
                    },
                ],
            });

        self.fullscreen_pass(
            "trace",
            self.view(dest),
            &self.pipelines.trace_pipeline,
            &bind_group,
        );
    }

    fn blend(&mut self, a: TargetId, b: TargetId, dest: TargetId) {
        let bind_group =
            self.two_texture_bind_group(&self.pipelines.blend_bind_group_layout, a, b);
        self.fullscreen_pass(
            "blend",
            self.view(dest),
            &self.pipelines.blend_pipeline,
            &bind_group,
        );
    }

    fn average(&mut self, a: TargetId, b: TargetId, dest: TargetId, frame_count: u32) {
        // One average pass per reduction, so writing the weight right
        // before submission cannot race a previous use of the buffer.
        let weight = [1.0 / frame_count as f32, 0.0, 0.0, 0.0];
        self.context.queue.write_buffer(
            &self.pipelines.average_uniform_buffer,
            0,
            bytemuck::bytes_of(&weight),
        );

        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("average inputs"),
                layout: &self.pipelines.average_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.view(a)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(self.view(b)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.pipelines.average_uniform_buffer.as_entire_binding(),
                    },
                ],
            });

        self.fullscreen_pass(
            "average",
            self.view(dest),
            &self.pipelines.average_pipeline,
            &bind_group,
        );
    }

    fn present(&mut self, source: TargetId) -> Result<()> {
        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // The present program is the blend program compiled for the
        // swapchain format; feeding both inputs the same texture makes it
        // a blit.
        let bind_group =
            self.two_texture_bind_group(&self.pipelines.blend_bind_group_layout, source, source);
        self.fullscreen_pass(
            "present",
            &view,
            &self.pipelines.present_pipeline,
            &bind_group,
        );

        output.present();
        Ok(())
    }
}
