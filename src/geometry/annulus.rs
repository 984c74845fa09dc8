//! Flat annulus (ring disc) geometry.

use super::{MeshData, Vertex};
use std::f32::consts::PI;

/// A flat ring in the XZ plane, between an inner and outer radius.
///
/// The disk frame uses a facing pair of these as its opaque body.
pub struct AnnulusGeometry {
    /// Inner radius.
    pub inner_radius: f32,
    /// Outer radius.
    pub outer_radius: f32,
    /// Segments around the ring.
    pub segments: u32,
    /// Which way the face normal points along Y (+1 or -1).
    pub facing: f32,
}

impl AnnulusGeometry {
    /// Create a new annulus.
    pub fn new(inner_radius: f32, outer_radius: f32, segments: u32, facing: f32) -> Self {
        Self {
            inner_radius,
            outer_radius,
            segments: segments.max(3),
            facing: if facing < 0.0 { -1.0 } else { 1.0 },
        }
    }

    /// Build the mesh data.
    pub fn build(&self) -> MeshData {
        let mut mesh = MeshData::default();
        let normal = [0.0, self.facing, 0.0];

        for i in 0..=self.segments {
            let theta = i as f32 / self.segments as f32 * PI * 2.0;
            let (s, c) = theta.sin_cos();
            let u = i as f32 / self.segments as f32;
            mesh.vertices.push(Vertex::new(
                [self.inner_radius * c, 0.0, self.inner_radius * s],
                normal,
                [u, 0.0],
            ));
            mesh.vertices.push(Vertex::new(
                [self.outer_radius * c, 0.0, self.outer_radius * s],
                normal,
                [u, 1.0],
            ));
        }

        for i in 0..self.segments {
            let a = i * 2;
            let b = i * 2 + 1;
            let c = i * 2 + 2;
            let d = i * 2 + 3;
            if self.facing >= 0.0 {
                mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
            } else {
                mesh.indices.extend_from_slice(&[a, b, c, b, d, c]);
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mesh = AnnulusGeometry::new(1.0, 2.0, 32, 1.0).build();
        assert_eq!(mesh.vertices.len(), ((32 + 1) * 2) as usize);
        assert_eq!(mesh.indices.len(), (32 * 6) as usize);
    }

    #[test]
    fn test_radii_band() {
        let mesh = AnnulusGeometry::new(1.5, 2.0, 16, -1.0).build();
        for v in mesh.vertices {
            let [x, y, z] = v.position;
            assert_eq!(y, 0.0);
            let r = (x * x + z * z).sqrt();
            assert!(r >= 1.5 - 1e-4 && r <= 2.0 + 1e-4);
        }
    }
}
