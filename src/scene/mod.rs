//! # Scene Module
//!
//! The rotating group node the renderers hang from, plus scene-level
//! fog and lighting state.

use crate::core::{Id, FRAME_TICK};
use crate::math::{Color, Matrix4, Vector3};

/// A positioned, rotatable container node.
///
/// Ownership is strictly hierarchical: a group owns its children by
/// value, and no node can be shared by two parents. Each renderer wraps
/// its drawable content in one of these and spins it by accumulating a
/// fixed per-frame increment.
#[derive(Debug)]
pub struct Group {
    /// Unique identifier.
    id: Id,
    /// Node name.
    name: String,
    /// Position offset.
    pub position: Vector3,
    /// Accumulated rotation around the Y axis, in radians.
    pub rotation_y: f32,
    /// Uniform scale.
    pub scale: f32,
    /// Whether this node (and its subtree) renders.
    pub visible: bool,
    /// Exclusively owned children.
    children: Vec<Group>,
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Group {
    /// Create a new group at the origin.
    pub fn new() -> Self {
        Self {
            id: Id::new(),
            name: String::new(),
            position: Vector3::ZERO,
            rotation_y: 0.0,
            scale: 1.0,
            visible: true,
            children: Vec::new(),
        }
    }

    /// Create a named group.
    pub fn named(name: impl Into<String>) -> Self {
        let mut group = Self::new();
        group.name = name.into();
        group
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the node name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a child, taking ownership.
    pub fn add(&mut self, child: Group) {
        self.children.push(child);
    }

    /// Get the children.
    #[inline]
    pub fn children(&self) -> &[Group] {
        &self.children
    }

    /// Advance the rotation by one frame tick.
    ///
    /// The increment is per call, not per wall-clock second: visual
    /// speed follows the host's refresh rate.
    pub fn spin(&mut self, rotation_speed: f32) {
        self.rotation_y += rotation_speed * FRAME_TICK;
    }

    /// Local transform matrix (translate, rotate-Y, uniform scale).
    pub fn local_matrix(&self) -> Matrix4 {
        Matrix4::compose_trs(&self.position, self.rotation_y, self.scale)
    }
}

/// Exponential-falloff fog toward the background color.
///
/// The fragment shaders fade each shaded pixel toward `color` with
/// factor `1 - exp(-density * depth)`.
#[derive(Debug, Clone, Copy)]
pub struct Fog {
    /// Fog (and background) color.
    pub color: Color,
    /// Falloff density; zero disables the fade.
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x05060a),
            density: 0.06,
        }
    }
}

/// A point fill light.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    /// Light position.
    pub position: Vector3,
    /// Light color.
    pub color: Color,
    /// Intensity multiplier.
    pub intensity: f32,
}

/// The scene's light rig: two point fill lights plus a dim ambient.
#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    /// Ambient light color, premultiplied by its intensity.
    pub ambient: Color,
    /// The two fill lights.
    pub lights: [PointLight; 2],
}

impl Lighting {
    /// The default rig for a disk in the given accent color.
    pub fn for_accent(accent: Color) -> Self {
        Self {
            ambient: Color::splat(0.12),
            lights: [
                PointLight {
                    position: Vector3::new(4.0, 5.0, 6.0),
                    color: Color::WHITE,
                    intensity: 0.8,
                },
                PointLight {
                    position: Vector3::new(-5.0, -2.0, -4.0),
                    color: accent,
                    intensity: 0.5,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_accumulates_per_call() {
        let mut group = Group::new();
        for _ in 0..10 {
            group.spin(2.0);
        }
        assert!((group.rotation_y - 2.0 * FRAME_TICK * 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_local_matrix_applies_position() {
        let mut group = Group::new();
        group.position = Vector3::new(0.0, 1.5, 0.0);
        let out = group.local_matrix().transform_point(&Vector3::ZERO);
        assert!(out.approx_eq(&Vector3::new(0.0, 1.5, 0.0), 1e-6));
    }

    #[test]
    fn test_children_are_owned() {
        let mut parent = Group::named("parent");
        parent.add(Group::named("a"));
        parent.add(Group::named("b"));
        assert_eq!(parent.children().len(), 2);
        assert_eq!(parent.children()[0].name(), "a");
    }
}
