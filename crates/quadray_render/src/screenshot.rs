//! Render-target capture to PNG.
//!
//! Reads back an Rgba32Float target through a padded staging buffer and
//! tonemaps the linear values to 8-bit sRGB on the CPU. Blocking here is
//! fine: screenshots are user-triggered and a stalled frame is expected.

use std::path::Path;

use anyhow::{Context, Result};

const BYTES_PER_PIXEL: u32 = 16; // Rgba32Float

fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

/// Copy `texture` into host memory and write it to `path` as PNG.
pub fn save_png(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<()> {
    let unpadded_bytes_per_row = width * BYTES_PER_PIXEL;
    let padded_bytes_per_row =
        align_to(unpadded_bytes_per_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("screenshot readback"),
        size: (padded_bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("screenshot encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &readback,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().context("waiting for screenshot readback")??;

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let start = (row * padded_bytes_per_row) as usize;
        let end = start + unpadded_bytes_per_row as usize;
        let texels: &[f32] = bytemuck::cast_slice(&mapped[start..end]);
        for pixel in texels.chunks_exact(4) {
            pixels.push(encode_channel(pixel[0]));
            pixels.push(encode_channel(pixel[1]));
            pixels.push(encode_channel(pixel[2]));
            pixels.push(255);
        }
    }
    drop(mapped);
    readback.unmap();

    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("screenshot buffer has wrong size")?;
    image.save(path)?;

    Ok(())
}

/// Linear to 8-bit with a gamma 2.2 transfer.
fn encode_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0 + 0.5) as u8
}
