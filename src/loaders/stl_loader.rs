//! STL file loader (binary and ASCII).

use super::{LoadError, LoadedGeometry, LoadedMesh, LoadedScene};
use std::path::Path;

/// STL file loader.
///
/// Handles both binary and ASCII variants; the triangle soup becomes a
/// single unindexed mesh.
pub struct StlLoader;

impl Default for StlLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl StlLoader {
    /// Create a new STL loader.
    pub fn new() -> Self {
        Self
    }

    /// Load an STL file from raw bytes.
    pub fn load_from_bytes(&self, data: &[u8], path: &Path) -> Result<LoadedScene, LoadError> {
        let geometry = if is_ascii_stl(data) {
            self.parse_ascii(data, path)?
        } else {
            self.parse_binary(data, path)?
        };

        let mut scene = LoadedScene::new("STL Scene");
        scene.meshes.push(LoadedMesh {
            name: "stl".into(),
            geometry,
            material_index: None,
        });
        Ok(scene)
    }

    fn parse_binary(&self, data: &[u8], path: &Path) -> Result<LoadedGeometry, LoadError> {
        // 80-byte header, u32 triangle count, then 50 bytes per triangle:
        // normal (12) + three vertices (36) + attribute byte count (2).
        if data.len() < 84 {
            return Err(parse_error(path, "binary STL shorter than its header"));
        }
        let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
        let expected = 84 + count * 50;
        if data.len() < expected {
            return Err(parse_error(
                path,
                format!("binary STL truncated: {} triangles declared", count),
            ));
        }

        let mut geometry = LoadedGeometry::default();
        geometry.positions.reserve(count * 3);
        geometry.normals.reserve(count * 3);

        for t in 0..count {
            let base = 84 + t * 50;
            let normal = read_vec3(data, base);
            for corner in 0..3 {
                geometry.positions.push(read_vec3(data, base + 12 + corner * 12));
                geometry.normals.push(normal);
            }
        }
        Ok(geometry)
    }

    fn parse_ascii(&self, data: &[u8], path: &Path) -> Result<LoadedGeometry, LoadError> {
        let content = std::str::from_utf8(data).map_err(|e| parse_error(path, e.to_string()))?;

        let mut geometry = LoadedGeometry::default();
        let mut normal = [0.0f32; 3];

        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["facet", "normal", x, y, z] => {
                    normal = [
                        x.parse().unwrap_or(0.0),
                        y.parse().unwrap_or(0.0),
                        z.parse().unwrap_or(0.0),
                    ];
                }
                ["vertex", x, y, z] => {
                    geometry.positions.push([
                        x.parse().unwrap_or(0.0),
                        y.parse().unwrap_or(0.0),
                        z.parse().unwrap_or(0.0),
                    ]);
                    geometry.normals.push(normal);
                }
                _ => {}
            }
        }

        if geometry.positions.len() % 3 != 0 {
            return Err(parse_error(path, "ASCII STL vertex count not a multiple of 3"));
        }
        Ok(geometry)
    }
}

/// ASCII files start with "solid", but so can binary headers; require a
/// "facet" keyword somewhere in the early content to be sure.
fn is_ascii_stl(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return false;
    }
    let probe = &data[..data.len().min(1024)];
    std::str::from_utf8(probe)
        .map(|s| s.contains("facet"))
        .unwrap_or(false)
}

fn read_vec3(data: &[u8], offset: usize) -> [f32; 3] {
    let f = |o: usize| f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]);
    [f(offset), f(offset + 4), f(offset + 8)]
}

fn parse_error(path: &Path, message: impl Into<String>) -> LoadError {
    LoadError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            data.extend_from_slice(&[0u8; 12]); // normal
            for v in tri {
                for c in v {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]); // attribute byte count
        }
        data
    }

    #[test]
    fn test_binary_triangle() {
        let data = binary_stl(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        let scene = StlLoader::new()
            .load_from_bytes(&data, Path::new("tri.stl"))
            .unwrap();
        assert_eq!(scene.total_vertices(), 3);
        assert_eq!(scene.meshes[0].geometry.positions[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_binary_truncated() {
        let mut data = binary_stl(&[[[0.0; 3]; 3]]);
        data.truncate(100);
        assert!(StlLoader::new()
            .load_from_bytes(&data, Path::new("bad.stl"))
            .is_err());
    }

    #[test]
    fn test_ascii_triangle() {
        let content = "solid tri\n facet normal 0 0 1\n  outer loop\n   vertex 0 0 0\n   vertex 1 0 0\n   vertex 0 1 0\n  endloop\n endfacet\nendsolid tri\n";
        let scene = StlLoader::new()
            .load_from_bytes(content.as_bytes(), Path::new("tri.stl"))
            .unwrap();
        assert_eq!(scene.total_vertices(), 3);
        assert_eq!(scene.meshes[0].geometry.normals[0], [0.0, 0.0, 1.0]);
    }
}
