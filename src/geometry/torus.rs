//! Torus geometry.

use super::{MeshData, Vertex};
use std::f32::consts::PI;

/// A torus (donut) geometry lying in the XZ plane.
pub struct TorusGeometry {
    /// Major radius (distance from center to tube center).
    pub radius: f32,
    /// Tube radius.
    pub tube: f32,
    /// Radial segments (around the tube).
    pub radial_segments: u32,
    /// Tubular segments (around the ring).
    pub tubular_segments: u32,
}

impl Default for TorusGeometry {
    fn default() -> Self {
        Self::new(1.0, 0.4, 16, 48)
    }
}

impl TorusGeometry {
    /// Create a new torus geometry.
    pub fn new(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Self {
            radius,
            tube,
            radial_segments: radial_segments.max(3),
            tubular_segments: tubular_segments.max(3),
        }
    }

    /// Build the mesh data.
    pub fn build(&self) -> MeshData {
        let mut mesh = MeshData::default();

        for j in 0..=self.radial_segments {
            for i in 0..=self.tubular_segments {
                let u = i as f32 / self.tubular_segments as f32 * PI * 2.0;
                let v = j as f32 / self.radial_segments as f32 * PI * 2.0;

                let x = (self.radius + self.tube * v.cos()) * u.cos();
                let y = self.tube * v.sin();
                let z = (self.radius + self.tube * v.cos()) * u.sin();

                // Normal points away from the tube center circle.
                let cx = self.radius * u.cos();
                let cz = self.radius * u.sin();
                let n = [x - cx, y, z - cz];
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                let normal = [n[0] / len, n[1] / len, n[2] / len];

                let uv = [
                    i as f32 / self.tubular_segments as f32,
                    j as f32 / self.radial_segments as f32,
                ];
                mesh.vertices.push(Vertex::new([x, y, z], normal, uv));
            }
        }

        for j in 1..=self.radial_segments {
            for i in 1..=self.tubular_segments {
                let a = (self.tubular_segments + 1) * j + i - 1;
                let b = (self.tubular_segments + 1) * (j - 1) + i - 1;
                let c = (self.tubular_segments + 1) * (j - 1) + i;
                let d = (self.tubular_segments + 1) * j + i;
                mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
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
        let mesh = TorusGeometry::new(1.0, 0.2, 8, 24).build();
        assert_eq!(mesh.vertices.len(), (8 + 1) * (24 + 1));
        assert_eq!(mesh.indices.len(), (8 * 24 * 6) as usize);
    }

    #[test]
    fn test_vertices_on_tube_surface() {
        let geometry = TorusGeometry::new(2.0, 0.3, 8, 16);
        for v in geometry.build().vertices {
            let [x, y, z] = v.position;
            let ring = (x * x + z * z).sqrt();
            let d = ((ring - 2.0).powi(2) + y * y).sqrt();
            assert!((d - 0.3).abs() < 1e-4);
        }
    }
}
