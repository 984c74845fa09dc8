//! # Loaders Module
//!
//! Mesh loading keyed by file extension (obj, gltf/glb, stl), the
//! loaded-scene data model the sampler consumes, and the by-path model
//! cache for the disk frame.

mod gltf_loader;
mod obj_loader;
mod stl_loader;

pub use gltf_loader::GltfLoader;
pub use obj_loader::ObjLoader;
pub use stl_loader::StlLoader;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::math::Matrix4;

/// Errors from asset loading.
///
/// All three variants follow the same recovery path at the call sites:
/// log a warning and substitute synthetic fallback content.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File extension not recognized as a supported mesh format.
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    /// Supported format but the file could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// Supported format but the content could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Parser error text.
        message: String,
    },
}

/// Geometry data loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct LoadedGeometry {
    /// Vertex positions (vec3).
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (vec3), possibly empty.
    pub normals: Vec<[f32; 3]>,
    /// Vertex indices, possibly empty for unindexed geometry.
    pub indices: Vec<u32>,
}

impl LoadedGeometry {
    /// Get vertex count.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Material data loaded from a file.
#[derive(Debug, Clone)]
pub struct LoadedMaterial {
    /// Material name.
    pub name: String,
    /// Base color (RGBA).
    pub base_color: [f32; 4],
    /// Emissive color (RGB).
    pub emissive: [f32; 3],
    /// Metallic factor (0-1).
    pub metallic: f32,
    /// Roughness factor (0-1).
    pub roughness: f32,
    /// Whether the material uses alpha blending.
    pub transparent: bool,
    /// Double-sided rendering (no face culling).
    pub double_sided: bool,
}

impl LoadedMaterial {
    /// Create a default white material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            metallic: 0.0,
            roughness: 0.5,
            transparent: false,
            double_sided: false,
        }
    }
}

impl Default for LoadedMaterial {
    fn default() -> Self {
        Self::new("Default")
    }
}

/// A mesh loaded from a file (geometry + material reference).
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    /// Mesh name.
    pub name: String,
    /// Geometry data.
    pub geometry: LoadedGeometry,
    /// Material index (references `LoadedScene::materials`).
    pub material_index: Option<usize>,
}

/// A node in the loaded scene hierarchy.
#[derive(Debug, Clone)]
pub struct LoadedNode {
    /// Node name.
    pub name: String,
    /// Local transform.
    pub transform: Matrix4,
    /// Mesh indices (references `LoadedScene::meshes`).
    pub mesh_indices: Vec<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
}

impl LoadedNode {
    /// Create a new node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::IDENTITY,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A complete scene loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct LoadedScene {
    /// Scene name.
    pub name: String,
    /// All meshes in the scene.
    pub meshes: Vec<LoadedMesh>,
    /// All materials in the scene.
    pub materials: Vec<LoadedMaterial>,
    /// All nodes in the scene.
    pub nodes: Vec<LoadedNode>,
    /// Root node indices.
    pub root_nodes: Vec<usize>,
}

impl LoadedScene {
    /// Create a new empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get total vertex count across all meshes.
    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.vertex_count()).sum()
    }

    /// Visit `(mesh, accumulated world transform)` pairs in hierarchy
    /// traversal order. Meshes not referenced by any node are visited
    /// last with an identity transform (flat formats like obj and stl
    /// produce such scenes).
    pub fn visit_meshes<F>(&self, mut visitor: F)
    where
        F: FnMut(&LoadedMesh, &Matrix4),
    {
        let mut referenced = vec![false; self.meshes.len()];
        for &root in &self.root_nodes {
            self.visit_node(root, &Matrix4::IDENTITY, &mut referenced, &mut visitor);
        }
        for (index, mesh) in self.meshes.iter().enumerate() {
            if !referenced[index] {
                visitor(mesh, &Matrix4::IDENTITY);
            }
        }
    }

    fn visit_node<F>(
        &self,
        index: usize,
        parent_world: &Matrix4,
        referenced: &mut [bool],
        visitor: &mut F,
    ) where
        F: FnMut(&LoadedMesh, &Matrix4),
    {
        let Some(node) = self.nodes.get(index) else { return };
        let world = parent_world.multiply(&node.transform);
        for &mesh_index in &node.mesh_indices {
            if let Some(mesh) = self.meshes.get(mesh_index) {
                referenced[mesh_index] = true;
                visitor(mesh, &world);
            }
        }
        for &child in &node.children {
            self.visit_node(child, &world, referenced, visitor);
        }
    }
}

/// Load a mesh scene from a path, dispatching on the file extension.
///
/// Supported extensions: `obj`, `gltf`, `glb`, `stl`. Anything else is
/// [`LoadError::UnsupportedFormat`] — distinct from a successfully loaded
/// scene that happens to contain no position data.
pub fn load_scene(path: &Path) -> Result<LoadedScene, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let read = |path: &Path| {
        std::fs::read(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    };

    match extension.as_str() {
        "obj" => {
            let data = read(path)?;
            ObjLoader::new().load_from_bytes(&data, path)
        }
        "gltf" | "glb" => {
            let data = read(path)?;
            GltfLoader::new().load_from_bytes(&data, path)
        }
        "stl" => {
            let data = read(path)?;
            StlLoader::new().load_from_bytes(&data, path)
        }
        _ => Err(LoadError::UnsupportedFormat(extension)),
    }
}

/// A by-path cache of loaded scenes.
///
/// Cached scenes are shared, so consumers that retexture or rescale a
/// model must clone it first; the cached original is never mutated.
#[derive(Default, Clone)]
pub struct ModelCache {
    entries: Arc<Mutex<HashMap<PathBuf, Arc<LoadedScene>>>>,
}

impl ModelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene, reusing a previously loaded copy for the same path.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<LoadedScene>, LoadError> {
        {
            let entries = self.entries.lock().expect("model cache poisoned");
            if let Some(scene) = entries.get(path) {
                return Ok(Arc::clone(scene));
            }
        }
        let scene = Arc::new(load_scene(path)?);
        let mut entries = self.entries.lock().expect("model cache poisoned");
        Ok(Arc::clone(entries.entry(path.to_path_buf()).or_insert(scene)))
    }

    /// Number of cached scenes.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("model cache poisoned").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = load_scene(Path::new("disk.xyz")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xyz"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_scene(Path::new("/nonexistent/disk.obj")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_visit_meshes_accumulates_transforms() {
        use crate::math::Vector3;

        let mut scene = LoadedScene::new("test");
        scene.meshes.push(LoadedMesh {
            name: "m".into(),
            geometry: LoadedGeometry {
                positions: vec![[1.0, 0.0, 0.0]],
                ..Default::default()
            },
            material_index: None,
        });
        let mut parent = LoadedNode::new("parent");
        parent.transform = Matrix4::from_translation(&Vector3::new(0.0, 2.0, 0.0));
        parent.children.push(1);
        let mut child = LoadedNode::new("child");
        child.transform = Matrix4::from_translation(&Vector3::new(0.0, 0.0, 3.0));
        child.mesh_indices.push(0);
        scene.nodes.push(parent);
        scene.nodes.push(child);
        scene.root_nodes.push(0);

        let mut visited = Vec::new();
        scene.visit_meshes(|mesh, world| {
            visited.push(world.transform_point(&Vector3::from_array(mesh.geometry.positions[0])));
        });
        assert_eq!(visited.len(), 1);
        assert!(visited[0].approx_eq(&Vector3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn test_model_cache_reuses_entries() {
        use std::io::Write;

        let path = std::env::temp_dir().join("gyre_cache_test.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();

        let cache = ModelCache::new();
        let a = cache.get_or_load(&path).unwrap();
        let b = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        std::fs::remove_file(&path).ok();
    }
}
