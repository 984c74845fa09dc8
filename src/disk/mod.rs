//! # Disk Module
//!
//! The ring frame around the particle head: either five procedural
//! primitives or an external model whose sub-meshes are reclassified
//! into glow edges and body surfaces and retextured accordingly.

mod frame;

pub use frame::{build_from_model, build_procedural, DiskFrame, FrameState, FrameSubmesh};

use crate::loaders::LoadedMaterial;
use crate::math::Color;

/// Luminance above which a material counts as a glow edge.
const GLOW_LUMINANCE_THRESHOLD: f32 = 0.5;
/// Emissive channel sum above which emissive energy overrides luminance.
const GLOW_EMISSIVE_THRESHOLD: f32 = 0.1;

/// The two roles a frame sub-mesh can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRole {
    /// Bright or emissive surface, replaced by the unlit glow material.
    Glow,
    /// Everything else, replaced by the dark metallic body material.
    Body,
}

/// Classify a loaded material by brightness heuristic.
///
/// Bright base colors read as light-emitting edges on the source models;
/// meaningful emissive energy counts as glow even when the base color is
/// dark.
pub fn classify(material: &LoadedMaterial) -> FrameRole {
    let base = Color::new(
        material.base_color[0],
        material.base_color[1],
        material.base_color[2],
    );
    let emissive_sum: f32 = material.emissive.iter().sum();
    if base.luminance() > GLOW_LUMINANCE_THRESHOLD || emissive_sum > GLOW_EMISSIVE_THRESHOLD {
        FrameRole::Glow
    } else {
        FrameRole::Body
    }
}

/// A concrete material recipe for one frame sub-mesh.
#[derive(Debug, Clone, Copy)]
pub struct FrameMaterial {
    /// Base color with opacity in the alpha channel.
    pub color: [f32; 4],
    /// Emissive color.
    pub emissive: [f32; 3],
    /// Skip lighting entirely (glow edges).
    pub unlit: bool,
    /// Metallic factor.
    pub metallic: f32,
    /// Roughness factor.
    pub roughness: f32,
    /// Render both faces (no culling).
    pub double_sided: bool,
    /// Alpha-blend instead of opaque.
    pub transparent: bool,
}

impl FrameMaterial {
    /// The glow-edge recipe: unlit, fully saturated in the accent color,
    /// with the original material's transparency and culling preserved.
    pub fn glow(accent: Color, original: &LoadedMaterial) -> Self {
        Self {
            color: [accent.r, accent.g, accent.b, original.base_color[3]],
            emissive: [0.0; 3],
            unlit: true,
            metallic: 0.0,
            roughness: 1.0,
            double_sided: original.double_sided,
            transparent: original.transparent,
        }
    }

    /// The body recipe: dark metallic with a faint emissive tint in the
    /// accent color, opacity capped at 0.95, culling preserved (loaded
    /// materials default to front faces only).
    pub fn body(accent: Color, original: &LoadedMaterial) -> Self {
        Self {
            color: [0.08, 0.09, 0.11, original.base_color[3].min(0.95)],
            emissive: accent.multiply_scalar(0.08).to_array(),
            unlit: false,
            metallic: 0.9,
            roughness: 0.35,
            double_sided: original.double_sided,
            transparent: true,
        }
    }

    /// Recipe for the classified role.
    pub fn for_role(role: FrameRole, accent: Color, original: &LoadedMaterial) -> Self {
        match role {
            FrameRole::Glow => Self::glow(accent, original),
            FrameRole::Body => Self::body(accent, original),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(base: [f32; 4], emissive: [f32; 3]) -> LoadedMaterial {
        LoadedMaterial {
            base_color: base,
            emissive,
            ..LoadedMaterial::new("test")
        }
    }

    #[test]
    fn test_white_is_glow() {
        let m = material([1.0, 1.0, 1.0, 1.0], [0.0; 3]);
        assert_eq!(classify(&m), FrameRole::Glow);
    }

    #[test]
    fn test_black_without_emissive_is_body() {
        let m = material([0.0, 0.0, 0.0, 1.0], [0.0; 3]);
        assert_eq!(classify(&m), FrameRole::Body);
    }

    #[test]
    fn test_emissive_overrides_low_luminance() {
        let m = material([0.05, 0.05, 0.05, 1.0], [0.05, 0.05, 0.05]);
        assert_eq!(classify(&m), FrameRole::Glow);
    }

    #[test]
    fn test_dim_emissive_does_not_override() {
        let m = material([0.05, 0.05, 0.05, 1.0], [0.02, 0.02, 0.02]);
        assert_eq!(classify(&m), FrameRole::Body);
    }

    #[test]
    fn test_glow_recipe_preserves_surface_settings() {
        let mut m = material([1.0, 1.0, 1.0, 0.7], [0.0; 3]);
        m.transparent = true;
        m.double_sided = true;
        let accent = Color::from_hex(0x00F6FF);
        let recipe = FrameMaterial::glow(accent, &m);
        assert!(recipe.unlit);
        assert_eq!(recipe.color[3], 0.7);
        assert!(recipe.transparent);
        assert!(recipe.double_sided);
        assert_eq!(recipe.color[0], accent.r);
    }

    #[test]
    fn test_body_recipe_caps_opacity() {
        let m = material([0.0, 0.0, 0.0, 1.0], [0.0; 3]);
        let recipe = FrameMaterial::body(Color::from_hex(0x00F6FF), &m);
        assert!(!recipe.unlit);
        assert!(recipe.color[3] <= 0.95);
        assert!(!recipe.double_sided, "body defaults to front faces only");
        assert!(recipe.emissive.iter().sum::<f32>() > 0.0);
    }
}
