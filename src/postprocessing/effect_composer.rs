//! Effect composer managing the post-processing pipeline.

use super::pass::Pass;
use wgpu::util::DeviceExt;

/// A render target texture with view.
pub struct RenderTarget {
    /// The texture.
    pub texture: wgpu::Texture,
    /// Texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a new render target.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Post-Process Render Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Manages a chain of post-processing passes with ping-pong targets.
pub struct EffectComposer {
    /// Render passes in order.
    passes: Vec<Box<dyn Pass>>,
    /// Ping-pong render targets.
    render_targets: [RenderTarget; 2],
    /// Width of render targets.
    width: u32,
    /// Height of render targets.
    height: u32,
    /// Surface format.
    format: wgpu::TextureFormat,
    /// Fullscreen quad vertex buffer, shared by the passes.
    quad_buffer: wgpu::Buffer,
}

impl EffectComposer {
    /// Create a new effect composer.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fullscreen Quad Buffer"),
            contents: bytemuck::cast_slice(&super::pass::FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            passes: Vec::new(),
            render_targets: [
                RenderTarget::new(device, width, height, format),
                RenderTarget::new(device, width, height, format),
            ],
            width,
            height,
            format,
            quad_buffer,
        }
    }

    /// Add a pass to the end of the chain, initializing its resources.
    pub fn add_pass(&mut self, device: &wgpu::Device, mut pass: Box<dyn Pass>) {
        pass.init(device, self.format, self.width, self.height);
        self.passes.push(pass);
    }

    /// Get a mutable pass by name.
    pub fn get_pass_mut(&mut self, name: &str) -> Option<&mut Box<dyn Pass>> {
        self.passes.iter_mut().find(|p| p.name() == name)
    }

    /// Handle resize.
    pub fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.render_targets = [
            RenderTarget::new(device, width, height, self.format),
            RenderTarget::new(device, width, height, self.format),
        ];
        for pass in &mut self.passes {
            pass.resize(width, height, device);
        }
    }

    /// Run the enabled passes, reading the rendered scene and writing
    /// the final output view.
    ///
    /// With no enabled passes the scene is expected to have been
    /// rendered straight to the output; callers arrange that by checking
    /// [`has_enabled_passes`](Self::has_enabled_passes) first.
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene_texture: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let enabled: Vec<usize> = self
            .passes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.enabled())
            .map(|(i, _)| i)
            .collect();

        let mut input = scene_texture;
        let mut current_target = 0;

        for (position, &pass_index) in enabled.iter().enumerate() {
            let is_last = position == enabled.len() - 1;
            let output_view = if is_last {
                output
            } else {
                &self.render_targets[current_target].view
            };

            self.passes[pass_index].render(encoder, input, output_view, device, queue);

            if !is_last {
                input = &self.render_targets[current_target].view;
                current_target = 1 - current_target;
            }
        }
    }

    /// Whether any pass in the chain is enabled.
    pub fn has_enabled_passes(&self) -> bool {
        self.passes.iter().any(|p| p.enabled())
    }

    /// Get the fullscreen quad vertex buffer.
    pub fn quad_buffer(&self) -> &wgpu::Buffer {
        &self.quad_buffer
    }

    /// Get render target dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
