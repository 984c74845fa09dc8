//! The head particle cloud: mesh-sampled points with drift animation.

use std::path::PathBuf;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{ParticleAttributes, SIZE_FACTOR};
use crate::config::DiskSceneConfig;
use crate::math::{Color, Matrix4};
use crate::sampler::{self, PointSet};
use crate::scene::Group;

/// Lifecycle of the cloud's point data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudState {
    /// Constructed but not yet configured.
    Uninitialized,
    /// A mesh load is in flight; the cloud renders nothing.
    Loading,
    /// Points are available (real or fallback); buffers may be built.
    Ready,
}

/// Per-instance GPU attributes: base position plus random seed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct HeadInstance {
    position: [f32; 3],
    seed: f32,
}

impl HeadInstance {
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
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Shared shader uniforms, rewritten once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CloudUniform {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    /// rgb = base color, w = elapsed time.
    color_time: [f32; 4],
    /// x = drift scale, y = drift speed, z = point size, w = size factor.
    params: [f32; 4],
}

/// GPU resources, built lazily once points are Ready.
struct CloudGpu {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

/// The head particle cloud renderer.
///
/// Owns its point set and attribute buffers exclusively; particle count
/// and the buffers are frozen at construction. Only the drift scale and
/// base color may be changed in place afterwards.
pub struct HeadCloud {
    state: CloudState,
    group: Group,
    particle_count: usize,
    rotation_speed: f32,
    drift_scale: f32,
    drift_speed: f32,
    point_size: f32,
    color: Color,
    time: f32,
    points: Option<PointSet>,
    attributes: Option<ParticleAttributes>,
    pending: Option<mpsc::Receiver<PointSet>>,
    gpu: Option<CloudGpu>,
}

impl HeadCloud {
    const SHADER_SOURCE: &'static str = include_str!("../shaders/head_particle.wgsl");

    /// Create the cloud from scene configuration.
    ///
    /// With a model path, a load is dispatched off the frame path and
    /// the cloud stays in `Loading` until [`poll`](Self::poll) receives
    /// the result. Without one, the fallback sphere is generated
    /// immediately and no load is ever dispatched.
    pub fn new(config: &DiskSceneConfig) -> Self {
        let mut cloud = Self {
            state: CloudState::Uninitialized,
            group: Group::named("head-cloud"),
            particle_count: config.particle_count,
            rotation_speed: config.rotation_speed,
            drift_scale: config.drift_scale,
            drift_speed: 0.6,
            point_size: 0.05,
            color: config.base_color(),
            time: 0.0,
            points: None,
            attributes: None,
            pending: None,
            gpu: None,
        };

        match &config.model_path {
            Some(path) => cloud.begin_load(path.clone(), config.outer_radius),
            None => {
                let mut rng = rand::thread_rng();
                let points = sampler::fallback(cloud.particle_count, config.outer_radius, &mut rng);
                cloud.finish(points);
            }
        }
        cloud
    }

    /// Dispatch the mesh load on a worker thread.
    ///
    /// The worker always resolves to a usable point set — load failures
    /// are absorbed into the fallback inside the sampler — so the cloud
    /// can never strand in `Loading` once the worker finishes.
    fn begin_load(&mut self, path: PathBuf, radius: f32) {
        let (sender, receiver) = mpsc::channel();
        let count = self.particle_count;
        std::thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let points = sampler::load_point_set(&path, count, radius, &mut rng);
            // The receiver may have been dropped; nothing to do then.
            let _ = sender.send(points);
        });
        self.pending = Some(receiver);
        self.state = CloudState::Loading;
    }

    fn finish(&mut self, points: PointSet) {
        let mut rng = rand::thread_rng();
        self.attributes = Some(ParticleAttributes::seeds_only(points.len(), &mut rng));
        self.points = Some(points);
        self.pending = None;
        self.gpu = None;
        self.state = CloudState::Ready;
    }

    /// Drain the load channel; transitions `Loading` to `Ready` when the
    /// worker has delivered. Called once per frame, and a no-op in every
    /// other state.
    pub fn poll(&mut self) {
        if self.state != CloudState::Loading {
            return;
        }
        let Some(receiver) = &self.pending else { return };
        if let Ok(points) = receiver.try_recv() {
            log::info!("head cloud ready with {} particles", points.len());
            self.finish(points);
        }
    }

    /// Per-frame advance: write the elapsed time into the uniform state
    /// and accumulate the group rotation by one frame tick.
    pub fn advance(&mut self, elapsed_time: f32) {
        self.time = elapsed_time;
        self.group.spin(self.rotation_speed);
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> CloudState {
        self.state
    }

    /// The points, once Ready.
    #[inline]
    pub fn points(&self) -> Option<&PointSet> {
        self.points.as_ref()
    }

    /// Number of particles this cloud was configured for.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// The rotating container node.
    #[inline]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Update the drift scale in place (no buffer rebuild).
    pub fn set_drift_scale(&mut self, drift_scale: f32) {
        self.drift_scale = drift_scale;
    }

    /// Update the base color in place (no buffer rebuild).
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Build or refresh GPU state for this frame. A no-op until Ready.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        view: &Matrix4,
        proj: &Matrix4,
    ) {
        if self.state != CloudState::Ready {
            return;
        }
        if self.gpu.is_none() {
            self.gpu = Some(self.build_gpu(device, format, depth_format));
        }

        let uniform = CloudUniform {
            model: self.group.local_matrix().to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            color_time: [self.color.r, self.color.g, self.color.b, self.time],
            params: [self.drift_scale, self.drift_speed, self.point_size, SIZE_FACTOR],
        };
        let gpu = self.gpu.as_ref().expect("gpu state just built");
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn build_gpu(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> CloudGpu {
        let points = self.points.as_ref().expect("ready without points");
        let attributes = self.attributes.as_ref().expect("ready without attributes");

        let instances: Vec<HeadInstance> = points
            .points()
            .iter()
            .zip(attributes.seeds())
            .map(|(p, &seed)| HeadInstance {
                position: p.to_array(),
                seed,
            })
            .collect();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Head Cloud Instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Head Cloud Uniforms"),
            contents: bytemuck::cast_slice(&[CloudUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Head Cloud Bind Group Layout"),
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
            label: Some("Head Cloud Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Head Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(Self::SHADER_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Head Cloud Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Head Cloud Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[HeadInstance::layout()],
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

        CloudGpu {
            pipeline,
            bind_group,
            uniform_buffer,
            instance_buffer,
            instance_count: instances.len() as u32,
        }
    }

    /// Record the draw. Silently skips while Loading.
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
    use std::time::{Duration, Instant};

    fn wait_ready(cloud: &mut HeadCloud) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while cloud.state() != CloudState::Ready {
            assert!(Instant::now() < deadline, "load never completed");
            cloud.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_no_model_path_is_ready_immediately() {
        let config = DiskSceneConfig {
            particle_count: 2000,
            ..Default::default()
        };
        let cloud = HeadCloud::new(&config);
        // No load dispatched: Ready before any poll.
        assert_eq!(cloud.state(), CloudState::Ready);
        assert_eq!(cloud.points().unwrap().len(), 2000);
    }

    #[test]
    fn test_unsupported_extension_reaches_ready_with_fallback() {
        let config = DiskSceneConfig {
            model_path: Some("identity_disk.xyz".into()),
            particle_count: 500,
            ..Default::default()
        };
        let mut cloud = HeadCloud::new(&config);
        assert_eq!(cloud.state(), CloudState::Loading);
        assert!(cloud.points().is_none());
        wait_ready(&mut cloud);
        assert_eq!(cloud.points().unwrap().len(), 500);
    }

    #[test]
    fn test_large_mesh_is_sampled_to_count() {
        use std::io::Write;

        let path = std::env::temp_dir().join("gyre_head_cloud_test.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..200 {
            for j in 0..200 {
                writeln!(file, "v {} {} {}", i, j, (i + j) % 17).unwrap();
            }
        }
        drop(file);

        let config = DiskSceneConfig {
            model_path: Some(path.clone()),
            particle_count: 1500,
            ..Default::default()
        };
        let mut cloud = HeadCloud::new(&config);
        wait_ready(&mut cloud);

        let points = cloud.points().unwrap();
        assert_eq!(points.len(), 1500);
        for p in points.points() {
            assert!(p.length() <= config.outer_radius * (1.0 + 1e-4));
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_advance_accumulates_rotation() {
        let config = DiskSceneConfig {
            particle_count: 10,
            ..Default::default()
        };
        let mut cloud = HeadCloud::new(&config);
        let before = cloud.group().rotation_y;
        cloud.advance(1.0);
        cloud.advance(2.0);
        assert!(cloud.group().rotation_y > before);
    }

    #[test]
    fn test_attributes_align_with_points() {
        let config = DiskSceneConfig {
            particle_count: 128,
            ..Default::default()
        };
        let cloud = HeadCloud::new(&config);
        assert_eq!(
            cloud.attributes.as_ref().unwrap().len(),
            cloud.points().unwrap().len()
        );
    }
}
