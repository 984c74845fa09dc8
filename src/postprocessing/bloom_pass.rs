//! Bloom post-processing effect.

use super::pass::{self, Pass, FullscreenVertex, FULLSCREEN_QUAD_VERTICES};
use wgpu::util::DeviceExt;

/// Bloom effect settings.
#[derive(Debug, Clone)]
pub struct BloomSettings {
    /// Strength of the bloom added back onto the frame.
    pub intensity: f32,
    /// Luminance threshold for a pixel to bloom.
    pub threshold: f32,
    /// Width of the smooth transition above the threshold.
    pub smoothing: f32,
    /// Number of blur iterations.
    pub blur_iterations: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            intensity: 1.5,
            threshold: 0.2,
            smoothing: 0.9,
            blur_iterations: 4,
        }
    }
}

/// Bloom uniform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomUniform {
    /// threshold, smoothing, intensity, unused
    params: [f32; 4],
    /// texel width, texel height, blur direction x, blur direction y
    texel: [f32; 4],
}

/// Bloom post-processing pass: bright-pass threshold, separable
/// gaussian blur, additive composite.
pub struct BloomPass {
    enabled: bool,
    settings: BloomSettings,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    threshold_pipeline: Option<wgpu::RenderPipeline>,
    blur_pipeline: Option<wgpu::RenderPipeline>,
    combine_pipeline: Option<wgpu::RenderPipeline>,
    single_layout: Option<wgpu::BindGroupLayout>,
    combine_layout: Option<wgpu::BindGroupLayout>,
    // Ping-pong textures for threshold/blur results.
    work_textures: Vec<(wgpu::Texture, wgpu::TextureView)>,
    threshold_uniform: Option<wgpu::Buffer>,
    blur_uniforms: Vec<wgpu::Buffer>,
    combine_uniform: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl BloomPass {
    /// Create a new bloom pass with default settings.
    pub fn new() -> Self {
        Self::with_settings(BloomSettings::default())
    }

    /// Create with custom settings.
    pub fn with_settings(settings: BloomSettings) -> Self {
        Self {
            enabled: true,
            settings,
            width: 0,
            height: 0,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            threshold_pipeline: None,
            blur_pipeline: None,
            combine_pipeline: None,
            single_layout: None,
            combine_layout: None,
            work_textures: Vec::new(),
            threshold_uniform: None,
            blur_uniforms: Vec::new(),
            combine_uniform: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Get settings.
    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    /// Set settings.
    pub fn set_settings(&mut self, settings: BloomSettings) {
        self.settings = settings;
    }

    fn uniform(&self, direction: [f32; 2]) -> BloomUniform {
        BloomUniform {
            params: [
                self.settings.threshold,
                self.settings.smoothing,
                self.settings.intensity,
                0.0,
            ],
            texel: [
                1.0 / self.width.max(1) as f32,
                1.0 / self.height.max(1) as f32,
                direction[0],
                direction[1],
            ],
        }
    }

    fn create_work_textures(&mut self, device: &wgpu::Device) {
        self.work_textures = (0..2)
            .map(|_| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Bloom Work Texture"),
                    size: wgpu::Extent3d {
                        width: self.width.max(1),
                        height: self.height.max(1),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: self.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();
    }

    fn fullscreen_pipeline(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        shader_source: &str,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
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
                    format: self.format,
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
        })
    }

    fn single_bind_group(
        &self,
        device: &wgpu::Device,
        input: &wgpu::TextureView,
        uniform: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Bind Group"),
            layout: self.single_layout.as_ref().expect("initialized"),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        self.sampler.as_ref().expect("initialized"),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        })
    }

    fn run_fullscreen(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        quad_buffer: &wgpu::Buffer,
        output: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
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
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, quad_buffer.slice(..));
        render_pass.draw(0..6, 0..1);
    }
}

impl Default for BloomPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for BloomPass {
    fn name(&self) -> &str {
        "bloom"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.format = format;

        self.sampler = Some(pass::create_sampler(device, "Bloom Sampler"));
        let single_layout = pass::create_pass_layout(device, "Bloom Bind Group Layout");

        // The combine stage reads the original frame plus the blurred
        // bright texture.
        let combine_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Combine Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        let make_uniform = |direction: [f32; 2]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Uniform Buffer"),
                contents: bytemuck::cast_slice(&[self.uniform(direction)]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let threshold_uniform = make_uniform([0.0, 0.0]);
        let blur_uniforms = vec![make_uniform([1.0, 0.0]), make_uniform([0.0, 1.0])];
        let combine_uniform = make_uniform([0.0, 0.0]);
        self.threshold_uniform = Some(threshold_uniform);
        self.blur_uniforms = blur_uniforms;
        self.combine_uniform = Some(combine_uniform);

        self.threshold_pipeline =
            Some(self.fullscreen_pipeline(device, "Bloom Threshold", &single_layout, THRESHOLD_SHADER));
        self.blur_pipeline =
            Some(self.fullscreen_pipeline(device, "Bloom Blur", &single_layout, BLUR_SHADER));
        self.combine_pipeline =
            Some(self.fullscreen_pipeline(device, "Bloom Combine", &combine_layout, COMBINE_SHADER));

        self.single_layout = Some(single_layout);
        self.combine_layout = Some(combine_layout);
        self.create_work_textures(device);
    }

    fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.create_work_textures(device);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let (Some(threshold_pipeline), Some(blur_pipeline), Some(combine_pipeline)) = (
            &self.threshold_pipeline,
            &self.blur_pipeline,
            &self.combine_pipeline,
        ) else {
            return;
        };
        let Some(quad_buffer) = &self.quad_buffer else { return };
        if self.work_textures.len() < 2 {
            return;
        }

        // Refresh uniforms so settings changes take effect.
        if let Some(buffer) = &self.threshold_uniform {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[self.uniform([0.0, 0.0])]));
        }
        for (buffer, direction) in self.blur_uniforms.iter().zip([[1.0, 0.0], [0.0, 1.0]]) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[self.uniform(direction)]));
        }

        // 1. Bright pass: threshold the scene into work texture 0.
        let bind = self.single_bind_group(
            device,
            input,
            self.threshold_uniform.as_ref().expect("initialized"),
        );
        Self::run_fullscreen(
            encoder,
            "Bloom Threshold Pass",
            threshold_pipeline,
            &bind,
            quad_buffer,
            &self.work_textures[0].1,
        );

        // 2. Separable blur, ping-ponging between the work textures.
        let mut source = 0;
        for _ in 0..self.settings.blur_iterations {
            for buffer in &self.blur_uniforms {
                let bind = self.single_bind_group(device, &self.work_textures[source].1, buffer);
                Self::run_fullscreen(
                    encoder,
                    "Bloom Blur Pass",
                    blur_pipeline,
                    &bind,
                    quad_buffer,
                    &self.work_textures[1 - source].1,
                );
                source = 1 - source;
            }
        }

        // 3. Composite the blurred brights back over the scene.
        let combine_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Combine Bind Group"),
            layout: self.combine_layout.as_ref().expect("initialized"),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        self.sampler.as_ref().expect("initialized"),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self
                        .combine_uniform
                        .as_ref()
                        .expect("initialized")
                        .as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.work_textures[source].1),
                },
            ],
        });
        Self::run_fullscreen(
            encoder,
            "Bloom Combine Pass",
            combine_pipeline,
            &combine_bind,
            quad_buffer,
            output,
        );
    }
}

const THRESHOLD_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    // threshold, smoothing, intensity, unused
    params: vec4<f32>,
    // texel width, texel height, blur direction x, blur direction y
    texel: vec4<f32>,
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
    let color = textureSample(input_texture, input_sampler, in.uv);
    let luma = dot(color.rgb, vec3<f32>(0.299, 0.587, 0.114));
    let weight = smoothstep(params.params.x, params.params.x + params.params.y, luma);
    return vec4<f32>(color.rgb * weight, 1.0);
}
"#;

const BLUR_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    // threshold, smoothing, intensity, unused
    params: vec4<f32>,
    // texel width, texel height, blur direction x, blur direction y
    texel: vec4<f32>,
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
    let step = params.texel.xy * params.texel.zw;
    var result = textureSample(input_texture, input_sampler, in.uv).rgb * 0.2270270270;
    result += textureSample(input_texture, input_sampler, in.uv + step * 1.3846153846).rgb * 0.3162162162;
    result += textureSample(input_texture, input_sampler, in.uv - step * 1.3846153846).rgb * 0.3162162162;
    result += textureSample(input_texture, input_sampler, in.uv + step * 3.2307692308).rgb * 0.0702702703;
    result += textureSample(input_texture, input_sampler, in.uv - step * 3.2307692308).rgb * 0.0702702703;
    return vec4<f32>(result, 1.0);
}
"#;

const COMBINE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    // threshold, smoothing, intensity, unused
    params: vec4<f32>,
    // texel width, texel height, blur direction x, blur direction y
    texel: vec4<f32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;
@group(0) @binding(3) var bloom_texture: texture_2d<f32>;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(input_texture, input_sampler, in.uv);
    let bloom = textureSample(bloom_texture, input_sampler, in.uv).rgb;
    return vec4<f32>(base.rgb + bloom * params.params.z, base.a);
}
"#;
