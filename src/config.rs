//! Scene configuration surface.

use serde::Deserialize;
use std::path::PathBuf;

use crate::math::Color;

fn default_particle_count() -> usize {
    15000
}

fn default_dust_count() -> usize {
    300
}

fn default_drift_scale() -> f32 {
    0.06
}

fn default_color() -> String {
    "#00f6ff".into()
}

fn default_rotation_speed() -> f32 {
    0.25
}

fn default_outer_radius() -> f32 {
    2.0
}

fn default_drift_volume() -> f32 {
    12.0
}

/// Configuration for the identity-disk scene.
///
/// Every field is optional with a sensible default, so a host can pass
/// `DiskSceneConfig::default()` or deserialize a partial JSON object.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiskSceneConfig {
    /// Path to a mesh to sample head particles from. Absent means the
    /// synthetic fallback sphere is used and no load is dispatched.
    pub model_path: Option<PathBuf>,
    /// Path to the glow-ring model. Absent means the procedural frame.
    pub frame_model_path: Option<PathBuf>,
    /// Number of head particles.
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    /// Number of dust particles.
    #[serde(default = "default_dust_count")]
    pub dust_count: usize,
    /// Per-particle drift displacement scale.
    #[serde(default = "default_drift_scale")]
    pub drift_scale: f32,
    /// Base color as a CSS hex string ("#RRGGBB").
    #[serde(default = "default_color")]
    pub color: String,
    /// Rotation speed multiplier for the disk and particle head groups.
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
    /// Outer radius of the disk frame; also the normalization radius for
    /// sampled particle clouds.
    #[serde(default = "default_outer_radius")]
    pub outer_radius: f32,
    /// Side length of the box the dust field drifts inside.
    #[serde(default = "default_drift_volume")]
    pub drift_volume: f32,
}

impl Default for DiskSceneConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            frame_model_path: None,
            particle_count: default_particle_count(),
            dust_count: default_dust_count(),
            drift_scale: default_drift_scale(),
            color: default_color(),
            rotation_speed: default_rotation_speed(),
            outer_radius: default_outer_radius(),
            drift_volume: default_drift_volume(),
        }
    }
}

impl DiskSceneConfig {
    /// Parse the configured color string, falling back to the default
    /// cyan when the string is not a valid hex color.
    pub fn base_color(&self) -> Color {
        Color::from_hex_str(&self.color).unwrap_or_else(|| {
            log::warn!("unparseable color string {:?}, using default", self.color);
            Color::from_hex(0x00F6FF)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiskSceneConfig::default();
        assert_eq!(config.particle_count, 15000);
        assert_eq!(config.dust_count, 300);
        assert!(config.model_path.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config: DiskSceneConfig =
            serde_json::from_str(r##"{"particle_count": 5000, "color": "#ff8800"}"##).unwrap();
        assert_eq!(config.particle_count, 5000);
        assert_eq!(config.dust_count, 300);
        assert!(config
            .base_color()
            .approx_eq(&Color::from_hex(0xFF8800), 1e-6));
    }

    #[test]
    fn test_bad_color_falls_back() {
        let config = DiskSceneConfig {
            color: "chartreuse".into(),
            ..Default::default()
        };
        assert!(config.base_color().approx_eq(&Color::from_hex(0x00F6FF), 1e-6));
    }
}
