//! The disk frame renderer: procedural or model-based ring structure.

use std::path::PathBuf;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{classify, FrameMaterial, FrameRole};
use crate::config::DiskSceneConfig;
use crate::geometry::{AnnulusGeometry, GpuMesh, MeshData, TorusGeometry, Vertex};
use crate::loaders::{LoadedMaterial, LoadedScene, ModelCache};
use crate::math::{Box3, Color, Matrix4, Vector3};
use crate::scene::{Fog, Group, Lighting};

/// Lifecycle of the frame's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// A model load is in flight; the frame renders nothing.
    Loading,
    /// Sub-meshes are available (model or procedural); buffers may be built.
    Ready,
}

/// One renderable piece of the frame: geometry plus its material recipe.
#[derive(Debug, Clone)]
pub struct FrameSubmesh {
    /// CPU-side mesh data.
    pub mesh: MeshData,
    /// Material recipe.
    pub material: FrameMaterial,
    /// Role this sub-mesh was classified into.
    pub role: FrameRole,
}

/// Scene-level shader uniforms, rewritten once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    /// rgb = ambient color.
    ambient: [f32; 4],
    /// rgb = fog color, w = density.
    fog: [f32; 4],
    /// xyz = camera world position.
    camera_position: [f32; 4],
    light0_position: [f32; 4],
    light0_color: [f32; 4],
    light1_position: [f32; 4],
    light1_color: [f32; 4],
}

/// Per-sub-mesh material uniform, written once at build time.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MaterialUniform {
    color: [f32; 4],
    /// rgb = emissive, w = unlit flag.
    emissive: [f32; 4],
    /// x = metallic, y = roughness.
    params: [f32; 4],
}

impl From<&FrameMaterial> for MaterialUniform {
    fn from(m: &FrameMaterial) -> Self {
        Self {
            color: m.color,
            emissive: [
                m.emissive[0],
                m.emissive[1],
                m.emissive[2],
                if m.unlit { 1.0 } else { 0.0 },
            ],
            params: [m.metallic, m.roughness, 0.0, 0.0],
        }
    }
}

struct SubmeshGpu {
    mesh: GpuMesh,
    bind_group: wgpu::BindGroup,
    double_sided: bool,
}

struct FrameGpu {
    /// [0] culls back faces, [1] renders both.
    pipelines: [wgpu::RenderPipeline; 2],
    scene_uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    submeshes: Vec<SubmeshGpu>,
}

/// The disk frame renderer.
///
/// Selects between the procedural five-primitive frame and an external
/// model at construction; both end up as a list of classified sub-meshes
/// inside one rotating group node.
pub struct DiskFrame {
    state: FrameState,
    group: Group,
    rotation_speed: f32,
    accent: Color,
    submeshes: Vec<FrameSubmesh>,
    pending: Option<mpsc::Receiver<Vec<FrameSubmesh>>>,
    gpu: Option<FrameGpu>,
}

impl DiskFrame {
    const SHADER_SOURCE: &'static str = include_str!("../shaders/frame_mesh.wgsl");

    /// Create the frame from scene configuration.
    ///
    /// With a model path the load runs on a worker thread; load failures
    /// fall back to the procedural frame so something always renders.
    pub fn new(config: &DiskSceneConfig, cache: &ModelCache) -> Self {
        let accent = config.base_color();
        let mut frame = Self {
            state: FrameState::Ready,
            group: Group::named("disk-frame"),
            rotation_speed: config.rotation_speed,
            accent,
            submeshes: Vec::new(),
            pending: None,
            gpu: None,
        };

        match &config.frame_model_path {
            Some(path) => frame.begin_load(path.clone(), cache.clone(), config.outer_radius),
            None => {
                frame.submeshes = build_procedural(config.outer_radius, accent);
            }
        }
        frame
    }

    fn begin_load(&mut self, path: PathBuf, cache: ModelCache, outer_radius: f32) {
        let (sender, receiver) = mpsc::channel();
        let accent = self.accent;
        std::thread::spawn(move || {
            let submeshes = match cache.get_or_load(&path) {
                Ok(scene) => build_from_model(&scene, accent, outer_radius * 2.0),
                Err(e) => {
                    log::warn!("frame model load failed ({e}), using procedural frame");
                    build_procedural(outer_radius, accent)
                }
            };
            let _ = sender.send(submeshes);
        });
        self.pending = Some(receiver);
        self.state = FrameState::Loading;
    }

    /// Drain the load channel; transitions `Loading` to `Ready`.
    pub fn poll(&mut self) {
        if self.state != FrameState::Loading {
            return;
        }
        let Some(receiver) = &self.pending else { return };
        if let Ok(submeshes) = receiver.try_recv() {
            log::info!("disk frame ready with {} sub-meshes", submeshes.len());
            self.submeshes = submeshes;
            self.pending = None;
            self.gpu = None;
            self.state = FrameState::Ready;
        }
    }

    /// Per-frame advance: accumulate the group rotation by one tick.
    pub fn advance(&mut self, _elapsed_time: f32) {
        self.group.spin(self.rotation_speed);
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// The classified sub-meshes, once Ready.
    #[inline]
    pub fn submeshes(&self) -> &[FrameSubmesh] {
        &self.submeshes
    }

    /// The rotating container node.
    #[inline]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Build or refresh GPU state for this frame. A no-op until Ready.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        view: &Matrix4,
        proj: &Matrix4,
        eye: &Vector3,
        lighting: &Lighting,
        fog: &Fog,
    ) {
        if self.state != FrameState::Ready {
            return;
        }
        if self.gpu.is_none() {
            self.gpu = Some(self.build_gpu(device, format, depth_format));
        }

        let l = &lighting.lights;
        let uniform = SceneUniform {
            model: self.group.local_matrix().to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            ambient: [lighting.ambient.r, lighting.ambient.g, lighting.ambient.b, 0.0],
            fog: [fog.color.r, fog.color.g, fog.color.b, fog.density],
            camera_position: [eye.x, eye.y, eye.z, 0.0],
            light0_position: [l[0].position.x, l[0].position.y, l[0].position.z, 0.0],
            light0_color: [l[0].color.r, l[0].color.g, l[0].color.b, l[0].intensity],
            light1_position: [l[1].position.x, l[1].position.y, l[1].position.z, 0.0],
            light1_color: [l[1].color.r, l[1].color.g, l[1].color.b, l[1].intensity],
        };
        let gpu = self.gpu.as_ref().expect("gpu state just built");
        queue.write_buffer(&gpu.scene_uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn build_gpu(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> FrameGpu {
        let scene_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Scene Uniforms"),
            contents: bytemuck::cast_slice(&[SceneUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Scene Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Material Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_uniform_buffer.as_entire_binding(),
            }],
        });

        let submeshes = self
            .submeshes
            .iter()
            .map(|submesh| {
                let material_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Frame Material Uniforms"),
                        contents: bytemuck::cast_slice(&[MaterialUniform::from(&submesh.material)]),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Frame Material Bind Group"),
                    layout: &material_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: material_buffer.as_entire_binding(),
                    }],
                });
                SubmeshGpu {
                    mesh: submesh.mesh.upload(device, "Frame Submesh"),
                    bind_group,
                    double_sided: submesh.material.double_sided,
                }
            })
            .collect();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Frame Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(Self::SHADER_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Frame Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Frame Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout()],
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
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        FrameGpu {
            pipelines: [make_pipeline(Some(wgpu::Face::Back)), make_pipeline(None)],
            scene_uniform_buffer,
            scene_bind_group,
            submeshes,
        }
    }

    /// Record the draw. Silently skips while Loading.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let Some(gpu) = &self.gpu else { return };
        pass.set_bind_group(0, &gpu.scene_bind_group, &[]);
        for submesh in &gpu.submeshes {
            let pipeline = if submesh.double_sided {
                &gpu.pipelines[1]
            } else {
                &gpu.pipelines[0]
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &submesh.bind_group, &[]);
            pass.set_vertex_buffer(0, submesh.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(submesh.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..submesh.mesh.index_count, 0, 0..1);
        }
    }
}

/// Build the procedural frame: outer glow ring, inner dimmer ring, a
/// facing annulus pair forming the body, and a thin accent ring.
pub fn build_procedural(outer_radius: f32, accent: Color) -> Vec<FrameSubmesh> {
    let default_material = LoadedMaterial::default();
    let glow = FrameMaterial::glow(accent, &default_material);
    let dim_glow = FrameMaterial {
        color: [accent.r * 0.45, accent.g * 0.45, accent.b * 0.45, 1.0],
        ..glow
    };
    let body = FrameMaterial::body(accent, &default_material);

    let inner = outer_radius * 0.62;
    vec![
        FrameSubmesh {
            mesh: TorusGeometry::new(outer_radius, outer_radius * 0.02, 16, 96).build(),
            material: glow,
            role: FrameRole::Glow,
        },
        FrameSubmesh {
            mesh: TorusGeometry::new(inner, outer_radius * 0.012, 12, 96).build(),
            material: dim_glow,
            role: FrameRole::Glow,
        },
        FrameSubmesh {
            mesh: AnnulusGeometry::new(inner, outer_radius * 0.985, 96, 1.0).build(),
            material: body,
            role: FrameRole::Body,
        },
        FrameSubmesh {
            mesh: AnnulusGeometry::new(inner, outer_radius * 0.985, 96, -1.0).build(),
            material: body,
            role: FrameRole::Body,
        },
        FrameSubmesh {
            mesh: TorusGeometry::new(outer_radius * 0.8, outer_radius * 0.006, 8, 96).build(),
            material: glow,
            role: FrameRole::Glow,
        },
    ]
}

/// Build the frame from a loaded model.
///
/// The cached scene is only ever read: world transforms are baked into
/// fresh vertex data, which is then uniformly rescaled to
/// `target_diameter` and recentered at the origin, and every sub-mesh's
/// material is replaced through the glow/body classification.
pub fn build_from_model(
    scene: &LoadedScene,
    accent: Color,
    target_diameter: f32,
) -> Vec<FrameSubmesh> {
    // First pass: bake world transforms and gather overall bounds.
    let mut baked: Vec<(Vec<Vector3>, Vec<Vector3>, Vec<u32>, Option<usize>)> = Vec::new();
    let mut bounds = Box3::EMPTY;
    scene.visit_meshes(|mesh, world| {
        let positions: Vec<Vector3> = mesh
            .geometry
            .positions
            .iter()
            .map(|p| world.transform_point(&Vector3::from_array(*p)))
            .collect();
        for p in &positions {
            bounds.expand_by_point(p);
        }
        let normals: Vec<Vector3> = mesh
            .geometry
            .normals
            .iter()
            .map(|n| world.transform_direction(&Vector3::from_array(*n)).normalized())
            .collect();
        baked.push((
            positions,
            normals,
            mesh.geometry.indices.clone(),
            mesh.material_index,
        ));
    });

    if baked.is_empty() || bounds.is_empty() {
        log::warn!("frame model contains no geometry, using procedural frame");
        return build_procedural(target_diameter * 0.5, accent);
    }

    let center = bounds.center();
    let max_extent = bounds.max_extent();
    let scale = if max_extent > 0.0 {
        target_diameter / max_extent
    } else {
        1.0
    };

    let default_material = LoadedMaterial::default();
    baked
        .into_iter()
        .map(|(positions, normals, indices, material_index)| {
            let original = material_index
                .and_then(|i| scene.materials.get(i))
                .unwrap_or(&default_material);
            let role = classify(original);

            let mut mesh = MeshData::default();
            mesh.vertices = positions
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let scaled = (*p - center) * scale;
                    let normal = normals.get(i).copied().unwrap_or(Vector3::UP);
                    Vertex::new(scaled.to_array(), normal.to_array(), [0.0, 0.0])
                })
                .collect();
            mesh.indices = indices;

            FrameSubmesh {
                mesh,
                material: FrameMaterial::for_role(role, accent, original),
                role,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::{LoadedGeometry, LoadedMesh};
    use std::time::{Duration, Instant};

    #[test]
    fn test_procedural_frame_structure() {
        let submeshes = build_procedural(2.0, Color::from_hex(0x00F6FF));
        assert_eq!(submeshes.len(), 5);
        let glow_count = submeshes.iter().filter(|s| s.role == FrameRole::Glow).count();
        assert_eq!(glow_count, 3);
        // The body pair faces opposite ways but shares geometry extents.
        let body: Vec<_> = submeshes.iter().filter(|s| s.role == FrameRole::Body).collect();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].mesh.vertices.len(), body[1].mesh.vertices.len());
    }

    fn two_material_scene() -> LoadedScene {
        let mut scene = LoadedScene::new("model");
        scene.materials.push(LoadedMaterial {
            base_color: [1.0, 1.0, 1.0, 1.0],
            ..LoadedMaterial::new("edge")
        });
        scene.materials.push(LoadedMaterial {
            base_color: [0.1, 0.1, 0.1, 1.0],
            ..LoadedMaterial::new("hull")
        });
        for (material_index, offset) in [(0usize, 10.0f32), (1, 14.0)] {
            scene.meshes.push(LoadedMesh {
                name: "part".into(),
                geometry: LoadedGeometry {
                    positions: vec![
                        [offset, 0.0, 0.0],
                        [offset + 2.0, 0.0, 0.0],
                        [offset, 2.0, 0.0],
                    ],
                    normals: vec![[0.0, 0.0, 1.0]; 3],
                    indices: vec![0, 1, 2],
                },
                material_index: Some(material_index),
            });
        }
        scene
    }

    #[test]
    fn test_model_build_rescales_and_classifies() {
        let scene = two_material_scene();
        let submeshes = build_from_model(&scene, Color::from_hex(0x00F6FF), 4.0);
        assert_eq!(submeshes.len(), 2);
        assert_eq!(submeshes[0].role, FrameRole::Glow);
        assert_eq!(submeshes[1].role, FrameRole::Body);

        // Rebuilt geometry is centered at the origin and spans the
        // target diameter along its widest axis.
        let mut bounds = Box3::EMPTY;
        for submesh in &submeshes {
            for v in &submesh.mesh.vertices {
                bounds.expand_by_point(&Vector3::from_array(v.position));
            }
        }
        assert!(bounds.center().approx_eq(&Vector3::ZERO, 1e-4));
        assert!((bounds.max_extent() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_model_build_leaves_source_untouched() {
        let scene = two_material_scene();
        let first_before = scene.meshes[0].geometry.positions[0];
        let _ = build_from_model(&scene, Color::WHITE, 4.0);
        assert_eq!(scene.meshes[0].geometry.positions[0], first_before);
    }

    #[test]
    fn test_no_model_path_is_ready_with_procedural() {
        let frame = DiskFrame::new(&DiskSceneConfig::default(), &ModelCache::new());
        assert_eq!(frame.state(), FrameState::Ready);
        assert_eq!(frame.submeshes().len(), 5);
    }

    #[test]
    fn test_bad_model_falls_back_to_procedural() {
        use std::io::Write;

        let path = std::env::temp_dir().join("gyre_frame_test.glb");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"definitely not a glb").unwrap();
        drop(file);

        let config = DiskSceneConfig {
            frame_model_path: Some(path.clone()),
            ..Default::default()
        };
        let mut frame = DiskFrame::new(&config, &ModelCache::new());
        assert_eq!(frame.state(), FrameState::Loading);

        let deadline = Instant::now() + Duration::from_secs(5);
        while frame.state() != FrameState::Ready {
            assert!(Instant::now() < deadline, "load never completed");
            frame.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(frame.submeshes().len(), 5);

        std::fs::remove_file(&path).ok();
    }
}
