//! Wavefront OBJ file loader.

use super::{LoadError, LoadedGeometry, LoadedMesh, LoadedScene};
use std::path::Path;

/// Wavefront OBJ file loader.
///
/// Parses positions, normals, and faces; one mesh per `o`/`g` group.
/// Materials are ignored — obj input is only ever sampled for positions.
pub struct ObjLoader;

impl Default for ObjLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjLoader {
    /// Create a new OBJ loader.
    pub fn new() -> Self {
        Self
    }

    /// Load an OBJ file from raw bytes.
    pub fn load_from_bytes(&self, data: &[u8], path: &Path) -> Result<LoadedScene, LoadError> {
        let content = std::str::from_utf8(data).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: format!("not valid UTF-8: {e}"),
        })?;
        self.load_from_str(content, path)
    }

    /// Load an OBJ file from string content.
    pub fn load_from_str(&self, content: &str, path: &Path) -> Result<LoadedScene, LoadError> {
        let mut scene = LoadedScene::new("OBJ Scene");

        // Global vertex pools; face indices reference into these.
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();

        let mut current = LoadedGeometry::default();
        let mut current_name = String::from("default");

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" if parts.len() >= 4 => {
                    positions.push(parse_vec3(&parts[1..4]));
                }
                "vn" if parts.len() >= 4 => {
                    normals.push(parse_vec3(&parts[1..4]));
                }
                "f" if parts.len() >= 4 => {
                    // Resolve each corner to a flat vertex; fan-triangulate
                    // polygons with more than three corners.
                    let mut corners = Vec::with_capacity(parts.len() - 1);
                    for part in &parts[1..] {
                        let mut refs = part.split('/');
                        let v = parse_index(refs.next(), positions.len());
                        let _vt = refs.next();
                        let vn = parse_index(refs.next(), normals.len());
                        let Some(v) = v else { continue };
                        let index = current.positions.len() as u32;
                        current.positions.push(positions[v]);
                        if let Some(vn) = vn {
                            current.normals.push(normals[vn]);
                        }
                        corners.push(index);
                    }
                    for i in 1..corners.len().saturating_sub(1) {
                        current.indices.push(corners[0]);
                        current.indices.push(corners[i]);
                        current.indices.push(corners[i + 1]);
                    }
                }
                "o" | "g" if parts.len() >= 2 => {
                    if !current.positions.is_empty() {
                        push_mesh(&mut scene, &current_name, std::mem::take(&mut current));
                    }
                    current_name = parts[1].to_string();
                }
                _ => {}
            }
        }

        if !current.positions.is_empty() {
            push_mesh(&mut scene, &current_name, current);
        }

        // A file with vertices but no faces is still usable: the sampler
        // only needs positions.
        if scene.meshes.is_empty() && !positions.is_empty() {
            push_mesh(
                &mut scene,
                "points",
                LoadedGeometry {
                    positions,
                    ..Default::default()
                },
            );
        }

        Ok(scene)
    }
}

fn push_mesh(scene: &mut LoadedScene, name: &str, geometry: LoadedGeometry) {
    scene.meshes.push(LoadedMesh {
        name: name.to_string(),
        geometry,
        material_index: None,
    });
}

fn parse_vec3(parts: &[&str]) -> [f32; 3] {
    [
        parts[0].parse().unwrap_or(0.0),
        parts[1].parse().unwrap_or(0.0),
        parts[2].parse().unwrap_or(0.0),
    ]
}

/// Parse a 1-based (possibly negative, relative) OBJ index.
fn parse_index(part: Option<&str>, len: usize) -> Option<usize> {
    let raw: i64 = part?.parse().ok()?;
    let resolved = if raw < 0 {
        len as i64 + raw
    } else {
        raw - 1
    };
    if (0..len as i64).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle() {
        let content = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let scene = ObjLoader::new()
            .load_from_str(content, Path::new("tri.obj"))
            .unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].geometry.positions.len(), 3);
        assert_eq!(scene.meshes[0].geometry.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let content = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let scene = ObjLoader::new()
            .load_from_str(content, Path::new("quad.obj"))
            .unwrap();
        assert_eq!(scene.meshes[0].geometry.indices.len(), 6);
    }

    #[test]
    fn test_negative_indices() {
        let content = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let scene = ObjLoader::new()
            .load_from_str(content, Path::new("neg.obj"))
            .unwrap();
        assert_eq!(scene.meshes[0].geometry.positions.len(), 3);
    }

    #[test]
    fn test_vertices_without_faces_still_load() {
        let content = "v 0 0 0\nv 1 2 3\n";
        let scene = ObjLoader::new()
            .load_from_str(content, Path::new("pts.obj"))
            .unwrap();
        assert_eq!(scene.total_vertices(), 2);
    }

    #[test]
    fn test_empty_file_yields_empty_scene() {
        let scene = ObjLoader::new()
            .load_from_str("# nothing here\n", Path::new("empty.obj"))
            .unwrap();
        assert_eq!(scene.total_vertices(), 0);
    }
}
