//! # Math Module
//!
//! Fixed-size 3D math types for the gyre scene: vectors, matrices,
//! colors, and axis-aligned boxes, with a Three.js-like API surface.

mod box3;
mod color;
mod matrix4;
mod vector3;

pub use box3::Box3;
pub use color::Color;
pub use matrix4::Matrix4;
pub use vector3::Vector3;
