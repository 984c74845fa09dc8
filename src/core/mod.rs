//! # Core Module
//!
//! wgpu context management, frame timing, and object identity.

mod clock;
mod context;
mod id;

pub use clock::Clock;
pub use context::{Context, ContextError};
pub use id::Id;

/// Fixed per-frame rotation tick.
///
/// Group rotation accumulates `rotation_speed * FRAME_TICK` once per frame
/// callback, not per wall-clock second, so rotation speed tracks the host's
/// refresh rate.
pub const FRAME_TICK: f32 = 0.01;

/// Render configuration options.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Power preference for GPU selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (vsync).
    pub present_mode: wgpu::PresentMode,
    /// Device pixel ratio, clamped to [1, 2] as the render-quality ceiling.
    pub pixel_ratio: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            pixel_ratio: 1.0,
        }
    }
}

impl RenderConfig {
    /// Set the device pixel ratio. Values outside [1, 2] are clamped.
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio.clamp(1.0, 2.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ratio_clamp() {
        assert_eq!(RenderConfig::default().with_pixel_ratio(3.5).pixel_ratio, 2.0);
        assert_eq!(RenderConfig::default().with_pixel_ratio(0.5).pixel_ratio, 1.0);
        assert_eq!(RenderConfig::default().with_pixel_ratio(1.5).pixel_ratio, 1.5);
    }
}
