//! # Post-processing Module
//!
//! The two-stage post chain applied after the scene rasterizes: a bloom
//! pass that spreads bright pixels, then a vignette darkening the frame
//! edges.

mod bloom_pass;
mod effect_composer;
mod pass;
mod vignette_pass;

pub use bloom_pass::{BloomPass, BloomSettings};
pub use effect_composer::{EffectComposer, RenderTarget};
pub use pass::{Pass, FullscreenVertex, FULLSCREEN_QUAD_VERTICES};
pub use vignette_pass::{VignettePass, VignetteSettings};
