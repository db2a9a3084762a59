//! Shading programs and their GPU-side uniform storage.
//!
//! Four programs share one fullscreen-triangle vertex stage: the
//! pathtracer, the equal-weight blend, the running average and the final
//! present blit. All compositing inputs are fetched with `textureLoad`, so
//! no samplers are bound anywhere.

use bytemuck::{bytes_of, Zeroable};
use quadray_core::{LightSlot, MaterialSlot, ProgramLayout, SurfaceSlot};
use wgpu::util::DeviceExt;

/// Array capacities declared in `shaders/pathtracer.wgsl`. Scenes are
/// validated against these at introspection time.
pub const MAX_SURFACES: usize = 16;
pub const MAX_MATERIALS: usize = 8;
pub const MAX_LIGHTS: usize = 8;

const PATHTRACER_SHADER: &str = include_str!("shaders/pathtracer.wgsl");
const BLEND_SHADER: &str = include_str!("shaders/blend.wgsl");
const AVERAGE_SHADER: &str = include_str!("shaders/average.wgsl");

/// All compiled pipelines plus the uniform buffers they read.
///
/// The scene buffers start out with every slot inactive, so a pipeline
/// whose scene has not been pushed yet renders an empty world instead of
/// garbage.
pub struct Pipelines {
    pub trace_pipeline: wgpu::RenderPipeline,
    pub blend_pipeline: wgpu::RenderPipeline,
    pub average_pipeline: wgpu::RenderPipeline,
    pub present_pipeline: wgpu::RenderPipeline,

    pub trace_bind_group_layout: wgpu::BindGroupLayout,
    pub blend_bind_group_layout: wgpu::BindGroupLayout,
    pub average_bind_group_layout: wgpu::BindGroupLayout,

    pub trace_uniform_buffer: wgpu::Buffer,
    pub surface_buffer: wgpu::Buffer,
    pub material_buffer: wgpu::Buffer,
    pub light_buffer: wgpu::Buffer,
    pub average_uniform_buffer: wgpu::Buffer,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let trace_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trace uniforms"),
            size: std::mem::size_of::<quadray_core::TraceUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("surface slots"),
            contents: bytemuck::cast_slice(&[SurfaceSlot::INACTIVE; MAX_SURFACES]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("material slots"),
            contents: bytemuck::cast_slice(&[MaterialSlot::zeroed(); MAX_MATERIALS]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light slots"),
            contents: bytemuck::cast_slice(&[LightSlot::DISABLED; MAX_LIGHTS]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let average_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("average uniforms"),
            contents: bytes_of(&[0.5f32, 0.0, 0.0, 0.0]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let trace_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("trace bind group layout"),
                entries: &[
                    uniform_entry(0),
                    uniform_entry(1),
                    uniform_entry(2),
                    uniform_entry(3),
                    texture_entry(4),
                ],
            });

        // Blend and present share a layout: two unfiltered input textures.
        let blend_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("blend bind group layout"),
                entries: &[texture_entry(0), texture_entry(1)],
            });

        let average_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("average bind group layout"),
                entries: &[texture_entry(0), texture_entry(1), uniform_entry(2)],
            });

        let trace_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pathtracer shader"),
            source: wgpu::ShaderSource::Wgsl(PATHTRACER_SHADER.into()),
        });
        let blend_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blend shader"),
            source: wgpu::ShaderSource::Wgsl(BLEND_SHADER.into()),
        });
        let average_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("average shader"),
            source: wgpu::ShaderSource::Wgsl(AVERAGE_SHADER.into()),
        });

        let trace_pipeline = build_pipeline(
            device,
            "trace pipeline",
            &trace_bind_group_layout,
            &trace_shader,
            wgpu::TextureFormat::Rgba32Float,
        );
        let blend_pipeline = build_pipeline(
            device,
            "blend pipeline",
            &blend_bind_group_layout,
            &blend_shader,
            wgpu::TextureFormat::Rgba32Float,
        );
        let average_pipeline = build_pipeline(
            device,
            "average pipeline",
            &average_bind_group_layout,
            &average_shader,
            wgpu::TextureFormat::Rgba32Float,
        );
        // Presenting runs the blend program against the swapchain format;
        // both inputs are the same texture so it acts as a blit.
        let present_pipeline = build_pipeline(
            device,
            "present pipeline",
            &blend_bind_group_layout,
            &blend_shader,
            surface_format,
        );

        log::info!(
            "compiled shading programs: {MAX_SURFACES} surface, {MAX_MATERIALS} material, {MAX_LIGHTS} light slots"
        );

        Self {
            trace_pipeline,
            blend_pipeline,
            average_pipeline,
            present_pipeline,
            trace_bind_group_layout,
            blend_bind_group_layout,
            average_bind_group_layout,
            trace_uniform_buffer,
            surface_buffer,
            material_buffer,
            light_buffer,
            average_uniform_buffer,
        }
    }

    /// The capacities a scene must fit inside.
    pub fn layout(&self) -> ProgramLayout {
        ProgramLayout {
            max_surfaces: MAX_SURFACES,
            max_materials: MAX_MATERIALS,
            max_lights: MAX_LIGHTS,
        }
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            // Rgba32Float is not filterable without an extra feature, and
            // the programs only use textureLoad anyway.
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
