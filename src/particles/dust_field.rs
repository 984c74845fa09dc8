//! The ambient dust field: a static-count drift of faint motes.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use wgpu::util::DeviceExt;

use super::{ParticleAttributes, SIZE_FACTOR};
use crate::config::DiskSceneConfig;
use crate::math::{Color, Matrix4, Vector3};

/// Per-instance GPU attributes: base position, seed, and drift speed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DustInstance {
    position: [f32; 3],
    seed: f32,
    speed: f32,
}

impl DustInstance {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Shared shader uniforms for the dust field.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DustUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    /// rgb = base color, w = elapsed time.
    color_time: [f32; 4],
    /// x = point size, y = size factor.
    params: [f32; 4],
}

struct DustGpu {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

/// The dust field renderer.
///
/// Unlike the head cloud there is no load path: positions are scattered
/// through the drift volume at construction and the field is immediately
/// drawable. Each particle wanders independently in the shader.
pub struct DustField {
    positions: Vec<Vector3>,
    attributes: ParticleAttributes,
    color: Color,
    point_size: f32,
    time: f32,
    gpu: Option<DustGpu>,
}

impl DustField {
    const SHADER_SOURCE: &'static str = include_str!("../shaders/dust_particle.wgsl");

    /// Scatter `dust_count` motes through the configured drift volume.
    pub fn new(config: &DiskSceneConfig) -> Self {
        let mut rng = rand::thread_rng();
        let half = config.drift_volume * 0.5;
        let positions = (0..config.dust_count)
            .map(|_| {
                Vector3::new(
                    rng.gen_range(-half..=half),
                    rng.gen_range(-half..=half),
                    rng.gen_range(-half..=half),
                )
            })
            .collect();
        let attributes = ParticleAttributes::with_speeds(config.dust_count, 0.4..1.6, &mut rng);

        Self {
            positions,
            attributes,
            color: config.base_color().lerp(&Color::WHITE, 0.4),
            point_size: 0.03,
            time: 0.0,
            gpu: None,
        }
    }

    /// Per-frame advance: write the elapsed time into the uniform state.
    pub fn advance(&mut self, elapsed_time: f32) {
        self.time = elapsed_time;
    }

    /// Number of dust particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// Build or refresh GPU state for this frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        view: &Matrix4,
        proj: &Matrix4,
    ) {
        if self.gpu.is_none() {
            self.gpu = Some(self.build_gpu(device, format, depth_format));
        }

        let uniform = DustUniform {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            color_time: [self.color.r, self.color.g, self.color.b, self.time],
            params: [self.point_size, SIZE_FACTOR, 0.0, 0.0],
        };
        let gpu = self.gpu.as_ref().expect("gpu state just built");
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn build_gpu(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> DustGpu {
        let instances: Vec<DustInstance> = self
            .positions
            .iter()
            .zip(self.attributes.seeds().iter().zip(self.attributes.speeds()))
            .map(|(p, (&seed, &speed))| DustInstance {
                position: p.to_array(),
                seed,
                speed,
            })
            .collect();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Dust Field Instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Dust Field Uniforms"),
            contents: bytemuck::cast_slice(&[DustUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Dust Field Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Dust Field Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Dust Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(Self::SHADER_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Dust Field Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Dust Field Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[DustInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        DustGpu {
            pipeline,
            bind_group,
            uniform_buffer,
            instance_buffer,
            instance_count: instances.len() as u32,
        }
    }

    /// Record the draw.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let Some(gpu) = &self.gpu else { return };
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.instance_buffer.slice(..));
        pass.draw(0..4, 0..gpu.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_fills_volume() {
        let config = DiskSceneConfig {
            dust_count: 400,
            drift_volume: 10.0,
            ..Default::default()
        };
        let field = DustField::new(&config);
        assert_eq!(field.count(), 400);
        for p in &field.positions {
            assert!(p.x.abs() <= 5.0 && p.y.abs() <= 5.0 && p.z.abs() <= 5.0);
        }
    }

    #[test]
    fn test_attributes_align() {
        let field = DustField::new(&DiskSceneConfig::default());
        assert_eq!(field.attributes.len(), field.count());
        assert_eq!(field.attributes.speeds().len(), field.count());
    }
}
