//! Vignette post-processing effect.

use super::pass::{self, Pass, FullscreenVertex, FULLSCREEN_QUAD_VERTICES};
use wgpu::util::DeviceExt;

/// Vignette settings.
#[derive(Debug, Clone)]
pub struct VignetteSettings {
    /// Darkness of the edges (0.0 = none, 1.0 = black corners).
    pub darkness: f32,
    /// Offset shifting where the darkening begins.
    pub offset: f32,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            darkness: 0.8,
            offset: 0.1,
        }
    }
}

/// Vignette uniform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct VignetteUniform {
    /// darkness, offset, unused, unused
    params: [f32; 4],
}

/// Vignette post-processing pass.
pub struct VignettePass {
    enabled: bool,
    settings: VignetteSettings,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl VignettePass {
    /// Create a new vignette pass with default settings.
    pub fn new() -> Self {
        Self::with_settings(VignetteSettings::default())
    }

    /// Create with custom settings.
    pub fn with_settings(settings: VignetteSettings) -> Self {
        Self {
            enabled: true,
            settings,
            pipeline: None,
            bind_group_layout: None,
            uniform_buffer: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Get settings.
    pub fn settings(&self) -> &VignetteSettings {
        &self.settings
    }

    /// Set settings.
    pub fn set_settings(&mut self, settings: VignetteSettings) {
        self.settings = settings;
    }

    fn update_uniforms(&self, queue: &wgpu::Queue) {
        if let Some(ref buffer) = self.uniform_buffer {
            let uniform = VignetteUniform {
                params: [self.settings.darkness, self.settings.offset, 0.0, 0.0],
            };
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}

impl Default for VignettePass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for VignettePass {
    fn name(&self) -> &str {
        "vignette"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, _width: u32, _height: u32) {
        self.sampler = Some(pass::create_sampler(device, "Vignette Sampler"));

        let bind_group_layout = pass::create_pass_layout(device, "Vignette Bind Group Layout");

        let uniform = VignetteUniform {
            params: [self.settings.darkness, self.settings.offset, 0.0, 0.0],
        };
        self.uniform_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vignette Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }));

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vignette Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vignette Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vignette Shader"),
            source: wgpu::ShaderSource::Wgsl(VIGNETTE_SHADER.into()),
        });

        self.pipeline = Some(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vignette Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[FullscreenVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        }));

        self.bind_group_layout = Some(bind_group_layout);
    }

    fn resize(&mut self, _width: u32, _height: u32, _device: &wgpu::Device) {}

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let Some(ref pipeline) = self.pipeline else { return };
        let Some(ref bind_group_layout) = self.bind_group_layout else { return };
        let Some(ref sampler) = self.sampler else { return };
        let Some(ref uniform_buffer) = self.uniform_buffer else { return };
        let Some(ref quad_buffer) = self.quad_buffer else { return };

        self.update_uniforms(queue);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vignette Bind Group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Vignette Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
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

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.set_vertex_buffer(0, quad_buffer.slice(..));
        render_pass.draw(0..6, 0..1);
    }
}

const VIGNETTE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    // darkness, offset, unused, unused
    params: vec4<f32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let darkness = params.params.x;
    let offset = params.params.y;

    let color = textureSample(input_texture, input_sampler, in.uv);

    let d = distance(in.uv, vec2<f32>(0.5));
    let vignette = smoothstep(0.8, offset * 0.799, d * (darkness + offset));

    return vec4<f32>(color.rgb * vignette, color.a);
}
"#;
