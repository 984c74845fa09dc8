//! # Scene Composer
//!
//! Assembles the identity-disk scene: camera, lights, fog, the three
//! renderers, and the bloom + vignette post chain, all driven by one
//! per-frame clock.

use crate::camera::PerspectiveCamera;
use crate::config::DiskSceneConfig;
use crate::controls::OrbitControls;
use crate::core::{Clock, Context, ContextError, RenderConfig};
use crate::disk::DiskFrame;
use crate::loaders::ModelCache;
use crate::particles::{DustField, HeadCloud};
use crate::postprocessing::{BloomPass, EffectComposer, RenderTarget, VignettePass};
use crate::scene::{Fog, Lighting};

/// Fixed camera starting position.
const CAMERA_POSITION: [f32; 3] = [0.0, 1.2, 5.5];
/// Fixed camera field of view in degrees.
const CAMERA_FOV: f32 = 50.0;

/// The top-level scene: owns the GPU context, the renderers, and the
/// per-frame clock, and composes them into frames.
pub struct DiskScene {
    context: Context,
    clock: Clock,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    lighting: Lighting,
    fog: Fog,
    cache: ModelCache,
    head: HeadCloud,
    frame: DiskFrame,
    dust: DustField,
    composer: EffectComposer,
    scene_target: RenderTarget,
    depth_view: wgpu::TextureView,
    pixel_ratio: f32,
    logical_width: u32,
    logical_height: u32,
}

impl DiskScene {
    /// Create the scene on a window surface.
    ///
    /// `width` and `height` are logical pixels; the render resolution is
    /// scaled by the config's pixel ratio, which is clamped to [1, 2].
    pub async fn new<W>(
        window: W,
        width: u32,
        height: u32,
        render_config: RenderConfig,
        config: DiskSceneConfig,
    ) -> Result<Self, ContextError>
    where
        W: Into<wgpu::SurfaceTarget<'static>>,
    {
        let pixel_ratio = render_config.pixel_ratio.clamp(1.0, 2.0);
        let physical_width = (width as f32 * pixel_ratio) as u32;
        let physical_height = (height as f32 * pixel_ratio) as u32;

        let context = Context::new(window, physical_width, physical_height, &render_config).await?;

        let mut camera = PerspectiveCamera::new(
            CAMERA_FOV,
            context.aspect_ratio(),
            0.1,
            100.0,
        );
        camera.set_position(CAMERA_POSITION.into());

        let accent = config.base_color();
        let fog = Fog::default();
        let lighting = Lighting::for_accent(accent);

        let cache = ModelCache::new();
        let head = HeadCloud::new(&config);
        let frame = DiskFrame::new(&config, &cache);
        let dust = DustField::new(&config);

        let mut composer = EffectComposer::new(
            &context.device,
            physical_width,
            physical_height,
            context.surface_format,
        );
        composer.add_pass(&context.device, Box::new(BloomPass::new()));
        composer.add_pass(&context.device, Box::new(VignettePass::new()));

        let scene_target = RenderTarget::new(
            &context.device,
            physical_width,
            physical_height,
            context.surface_format,
        );
        let depth_view = context
            .create_depth_texture()
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            context,
            clock: Clock::start_new(),
            camera,
            controls: OrbitControls::new(),
            lighting,
            fog,
            cache,
            head,
            frame,
            dust,
            composer,
            scene_target,
            depth_view,
            pixel_ratio,
            logical_width: width,
            logical_height: height,
        })
    }

    /// Forward a pointer drag, in logical pixels.
    pub fn pointer_drag(&mut self, delta_x: f32, delta_y: f32) {
        self.controls.rotate_by_pixels(delta_x, delta_y);
    }

    /// Forward a mouse-wheel delta.
    pub fn wheel(&mut self, delta: f32) {
        self.controls.zoom_by_wheel(delta);
    }

    /// Handle a window resize, in logical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.logical_width = width;
        self.logical_height = height;
        let physical_width = (width as f32 * self.pixel_ratio) as u32;
        let physical_height = (height as f32 * self.pixel_ratio) as u32;

        self.context.resize(physical_width, physical_height);
        self.camera.set_aspect(self.context.aspect_ratio());
        self.composer
            .resize(physical_width, physical_height, &self.context.device);
        self.scene_target = RenderTarget::new(
            &self.context.device,
            physical_width,
            physical_height,
            self.context.surface_format,
        );
        self.depth_view = self
            .context
            .create_depth_texture()
            .create_view(&wgpu::TextureViewDescriptor::default());
    }

    /// Update the base color of the particle head in place.
    pub fn set_color(&mut self, color: crate::math::Color) {
        self.head.set_color(color);
        self.lighting = Lighting::for_accent(color);
    }

    /// Update the particle drift scale in place.
    pub fn set_drift_scale(&mut self, drift_scale: f32) {
        self.head.set_drift_scale(drift_scale);
    }

    /// The model cache (shared with the disk frame's loader).
    pub fn model_cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Current logical size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    /// The clamped device pixel ratio in effect.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Render one frame.
    ///
    /// Samples the clock once and hands the same tick value to every
    /// renderer; components still loading simply contribute nothing.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let elapsed = self.clock.get_elapsed_time() as f32;

        self.controls.update(&mut self.camera);

        self.head.poll();
        self.frame.poll();

        self.head.advance(elapsed);
        self.frame.advance(elapsed);
        self.dust.advance(elapsed);

        let view = *self.camera.view_matrix();
        let proj = *self.camera.projection_matrix();
        let eye = self.camera.position;
        let device = &self.context.device;
        let queue = &self.context.queue;
        let format = self.context.surface_format;
        let depth_format = self.context.depth_format;

        self.head
            .prepare(device, queue, format, depth_format, &view, &proj);
        self.dust
            .prepare(device, queue, format, depth_format, &view, &proj);
        self.frame.prepare(
            device,
            queue,
            format,
            depth_format,
            &view,
            &proj,
            &eye,
            &self.lighting,
            &self.fog,
        );

        let surface_texture = self.context.surface.get_current_texture()?;
        let output_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Disk Scene Encoder"),
            });

        {
            // Geometry renders into the offscreen target the post chain
            // reads from; the clear color doubles as the fog color.
            let scene_view = if self.composer.has_enabled_passes() {
                &self.scene_target.view
            } else {
                &output_view
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Disk Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.fog.color.r as f64,
                            g: self.fog.color.g as f64,
                            b: self.fog.color.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.frame.draw(&mut pass);
            self.head.draw(&mut pass);
            self.dust.draw(&mut pass);
        }

        if self.composer.has_enabled_passes() {
            self.composer.render(
                &mut encoder,
                &self.scene_target.view,
                &output_view,
                &self.context.device,
                &self.context.queue,
            );
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// The head cloud renderer.
    pub fn head(&self) -> &HeadCloud {
        &self.head
    }

    /// The disk frame renderer.
    pub fn frame(&self) -> &DiskFrame {
        &self.frame
    }

    /// The dust field renderer.
    pub fn dust(&self) -> &DustField {
        &self.dust
    }

    /// The orbit controls.
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }
}
