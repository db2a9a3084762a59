//! Offscreen render targets and the accumulation pool.
//!
//! Every target is a linear Rgba32Float color buffer. These are data
//! buffers, not display textures: no mipmaps, no filtering, fetched by
//! exact texel coordinates in the compositing programs.

use anyhow::Result;

/// A single-owner color buffer with its render-attachment view.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Allocate a target sized to the viewport.
    ///
    /// Allocation failure (validation or out-of-memory) is fatal and
    /// surfaces immediately; it is never retried.
    pub fn create(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let oom = pollster::block_on(device.pop_error_scope());
        let validation = pollster::block_on(device.pop_error_scope());
        if let Some(error) = oom.or(validation) {
            anyhow::bail!("failed to allocate render target '{label}': {error}");
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self { texture, view })
    }

    /// Release the GPU memory eagerly. Safe to call before the pool is
    /// rebuilt at a new resolution.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// The compositor's buffers: a fixed-size pool of sample targets plus the
/// preview scratch target and the persistent accumulator.
///
/// Built complete or not at all; on resize the whole pool is disposed and
/// recreated, stale partial-resolution buffers are never reused.
pub struct TargetPool {
    pool: Vec<RenderTarget>,
    preview: RenderTarget,
    accumulator: RenderTarget,
}

impl TargetPool {
    pub fn create(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        pool_size: usize,
    ) -> Result<Self> {
        let mut pool = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            pool.push(RenderTarget::create(
                device,
                width,
                height,
                &format!("pool target {i}"),
            )?);
        }
        let preview = RenderTarget::create(device, width, height, "preview target")?;
        let accumulator = RenderTarget::create(device, width, height, "accumulator target")?;

        log::debug!("created target pool: {pool_size} + 2 targets at {width}x{height}");

        Ok(Self {
            pool,
            preview,
            accumulator,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn pool_target(&self, index: usize) -> &RenderTarget {
        &self.pool[index]
    }

    pub fn preview(&self) -> &RenderTarget {
        &self.preview
    }

    pub fn accumulator(&self) -> &RenderTarget {
        &self.accumulator
    }

    /// Release every owned buffer.
    pub fn dispose(&self) {
        for target in &self.pool {
            target.destroy();
        }
        self.preview.destroy();
        self.accumulator.destroy();
    }
}
