//! GLTF/GLB model loader.

use super::{LoadError, LoadedGeometry, LoadedMaterial, LoadedMesh, LoadedNode, LoadedScene};
use crate::math::Matrix4;
use std::path::Path;

/// GLTF/GLB file loader.
///
/// This is the one bundled-scene format: it carries the node hierarchy
/// and materials the disk frame's glow classification runs over.
pub struct GltfLoader;

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GltfLoader {
    /// Create a new GLTF loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a GLTF/GLB file from bytes.
    pub fn load_from_bytes(&self, data: &[u8], path: &Path) -> Result<LoadedScene, LoadError> {
        let (document, buffers, _images) =
            gltf::import_slice(data).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut scene = LoadedScene::new("GLTF Scene");

        for material in document.materials() {
            scene.materials.push(load_material(&material));
        }

        // Flatten primitives into meshes, remembering which flattened
        // indices each glTF mesh maps to.
        let mut mesh_index_map: Vec<Vec<usize>> = Vec::new();
        for mesh in document.meshes() {
            let mut flat_indices = Vec::new();
            for primitive in mesh.primitives() {
                let geometry = load_primitive(&primitive, &buffers);
                flat_indices.push(scene.meshes.len());
                scene.meshes.push(LoadedMesh {
                    name: mesh.name().unwrap_or("Unnamed").to_string(),
                    geometry,
                    material_index: primitive.material().index(),
                });
            }
            mesh_index_map.push(flat_indices);
        }

        for node in document.nodes() {
            let mut loaded = LoadedNode::new(node.name().unwrap_or("Node"));
            loaded.transform = Matrix4 {
                elements: flatten_cols(node.transform().matrix()),
            };
            if let Some(mesh) = node.mesh() {
                loaded.mesh_indices = mesh_index_map[mesh.index()].clone();
            }
            loaded.children = node.children().map(|c| c.index()).collect();
            scene.nodes.push(loaded);
        }

        if let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) {
            scene.root_nodes = gltf_scene.nodes().map(|n| n.index()).collect();
        }

        Ok(scene)
    }
}

fn load_material(material: &gltf::Material) -> LoadedMaterial {
    let pbr = material.pbr_metallic_roughness();
    LoadedMaterial {
        name: material.name().unwrap_or("Material").to_string(),
        base_color: pbr.base_color_factor(),
        emissive: material.emissive_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        transparent: matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend),
        double_sided: material.double_sided(),
    }
}

fn load_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> LoadedGeometry {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

    let mut geometry = LoadedGeometry::default();
    if let Some(positions) = reader.read_positions() {
        geometry.positions = positions.collect();
    }
    if let Some(normals) = reader.read_normals() {
        geometry.normals = normals.collect();
    }
    if let Some(indices) = reader.read_indices() {
        geometry.indices = indices.into_u32().collect();
    }
    geometry
}

fn flatten_cols(m: [[f32; 4]; 4]) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for (col, values) in m.iter().enumerate() {
        out[col * 4..col * 4 + 4].copy_from_slice(values);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let err = GltfLoader::new()
            .load_from_bytes(b"not a gltf file", Path::new("bad.glb"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_flatten_cols_is_column_major() {
        let m = [
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ];
        let flat = flatten_cols(m);
        assert_eq!(flat[0], 1.0);
        assert_eq!(flat[4], 5.0);
        assert_eq!(flat[12], 13.0);
    }
}
