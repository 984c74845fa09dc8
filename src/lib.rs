//! # Gyre - Identity Disk Particle Scene
//!
//! Gyre renders a "Tron identity disk": a particle cloud sampled from a
//! 3D mesh, a glowing ring frame, an ambient dust field, and a bloom +
//! vignette post chain, all on top of wgpu.
//!
//! The host hands over a surface target and pumps a per-frame tick; the
//! scene handles everything else, including substituting synthetic
//! fallback content whenever an asset fails to load.
//!
//! ## Example
//!
//! ```ignore
//! use gyre::prelude::*;
//!
//! let config = DiskSceneConfig {
//!     model_path: Some("assets/disk.glb".into()),
//!     ..Default::default()
//! };
//! let mut scene = DiskScene::new(window, 1280, 720, RenderConfig::default(), config).await?;
//!
//! // Once per display refresh:
//! scene.render()?;
//! ```

#![warn(missing_docs)]

#[cfg(feature = "web")]
use wasm_bindgen::prelude::*;

pub mod camera;
pub mod composer;
pub mod config;
pub mod controls;
pub mod core;
pub mod disk;
pub mod geometry;
pub mod loaders;
pub mod math;
pub mod particles;
pub mod postprocessing;
pub mod sampler;
pub mod scene;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::camera::PerspectiveCamera;
    pub use crate::composer::DiskScene;
    pub use crate::config::DiskSceneConfig;
    pub use crate::controls::OrbitControls;
    pub use crate::core::{Clock, Context, ContextError, RenderConfig};
    pub use crate::disk::{classify, DiskFrame, FrameMaterial, FrameRole};
    pub use crate::loaders::{LoadError, LoadedScene, ModelCache};
    pub use crate::math::{Box3, Color, Matrix4, Vector3};
    pub use crate::particles::{CloudState, DustField, HeadCloud};
    pub use crate::postprocessing::{BloomPass, BloomSettings, VignettePass, VignetteSettings};
    pub use crate::sampler::PointSet;
    pub use crate::scene::{Fog, Group, Lighting};
}

/// Initialize for WASM environments.
/// Sets up panic hooks for better error messages in the browser console.
#[cfg(feature = "web")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "Gyre";
