//! Model assets decoded from binary glTF
//!
//! A plant model is flattened into world-space triangle meshes at load time:
//! node hierarchies are baked in, missing normals are generated and the
//! result can be rescaled to a canonical size standing on y = 0.

use std::collections::HashSet;

use glam::{Mat3, Mat4, Vec3};
use gltf::buffer::Source;
use gltf::mesh::Mode;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to decode glTF: {0}")]
    Decode(#[from] gltf::Error),
    #[error("Model contains no scene")]
    NoScene,
    #[error("Model contains no triangle geometry")]
    EmptyModel,
    #[error("Model references external buffer {0}; only self-contained GLB is supported")]
    ExternalBuffer(String),
    #[error("Model declares an embedded buffer but has no binary chunk")]
    MissingBinary,
    #[error("Node {0} is reached twice; the node hierarchy is not a tree")]
    CyclicHierarchy(usize),
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.min(*p),
            max: acc.max.max(*p),
        }))
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// One triangle list with a flat base color
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A decoded model ready to attach to the scene
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub meshes: Vec<MeshData>,
    pub bounds: Aabb,
}

impl ModelAsset {
    /// Decode a self-contained binary glTF
    pub fn from_glb(bytes: &[u8]) -> Result<Self, SceneError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let blob = gltf.blob.as_deref();

        for buffer in gltf.buffers() {
            match buffer.source() {
                Source::Uri(uri) => return Err(SceneError::ExternalBuffer(uri.to_string())),
                Source::Bin if blob.is_none() => return Err(SceneError::MissingBinary),
                Source::Bin => {}
            }
        }

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or(SceneError::NoScene)?;

        let mut meshes = Vec::new();
        let mut stack: Vec<(gltf::Node, Mat4)> =
            scene.nodes().map(|node| (node, Mat4::IDENTITY)).collect();
        // Each node may have at most one parent, so every node is visited once
        let mut visited = HashSet::new();

        while let Some((node, parent)) = stack.pop() {
            if !visited.insert(node.index()) {
                return Err(SceneError::CyclicHierarchy(node.index()));
            }
            let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

            if let Some(mesh) = node.mesh() {
                for primitive in mesh.primitives() {
                    if primitive.mode() != Mode::Triangles {
                        warn!(mode = ?primitive.mode(), "Skipping non-triangle primitive");
                        continue;
                    }
                    let reader = primitive.reader(|buffer| match buffer.source() {
                        Source::Bin => blob,
                        Source::Uri(_) => None,
                    });

                    let Some(positions) = reader.read_positions() else {
                        continue;
                    };
                    let positions: Vec<Vec3> = positions
                        .map(|p| world.transform_point3(Vec3::from(p)))
                        .collect();
                    if positions.is_empty() {
                        continue;
                    }

                    let indices: Vec<u32> = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        None => (0..positions.len() as u32).collect(),
                    };
                    if indices.iter().any(|&i| i as usize >= positions.len()) {
                        warn!(mesh = ?mesh.name(), "Skipping primitive with out-of-range indices");
                        continue;
                    }

                    let to_world = normal_matrix(world);
                    let normals: Vec<Vec3> = reader
                        .read_normals()
                        .map(|normals| {
                            normals
                                .map(|n| (to_world * Vec3::from(n)).normalize_or_zero())
                                .collect()
                        })
                        .unwrap_or_default();
                    let normals = if normals.len() == positions.len() {
                        normals
                    } else {
                        if !normals.is_empty() {
                            warn!(
                                mesh = ?mesh.name(),
                                normals = normals.len(),
                                positions = positions.len(),
                                "Normal count mismatch, generating normals"
                            );
                        }
                        compute_normals(&positions, &indices)
                    };

                    let base_color = primitive
                        .material()
                        .pbr_metallic_roughness()
                        .base_color_factor();

                    meshes.push(MeshData {
                        positions,
                        normals,
                        indices,
                        base_color,
                    });
                }
            }

            stack.extend(node.children().map(|child| (child, world)));
        }

        let bounds = Aabb::from_points(meshes.iter().flat_map(|m| m.positions.iter()))
            .ok_or(SceneError::EmptyModel)?;

        debug!(
            meshes = meshes.len(),
            triangles = meshes.iter().map(MeshData::triangle_count).sum::<usize>(),
            "Decoded model"
        );

        Ok(Self { meshes, bounds })
    }

    /// Uniformly scale so the largest extent equals `canonical_size`, then
    /// center on x/z and stand the model on y = 0
    ///
    /// Returns the scale factor applied. Degenerate (flat or point) models are
    /// only moved, never scaled.
    pub fn normalize(&mut self, canonical_size: f32) -> f32 {
        let largest = self.bounds.extent().max_element();
        let scale = if largest > f32::EPSILON && canonical_size > 0.0 {
            canonical_size / largest
        } else {
            1.0
        };

        let center = self.bounds.center();
        let origin = Vec3::new(center.x, self.bounds.min.y, center.z);

        for mesh in &mut self.meshes {
            for p in &mut mesh.positions {
                *p = (*p - origin) * scale;
            }
        }
        self.bounds = Aabb {
            min: (self.bounds.min - origin) * scale,
            max: (self.bounds.max - origin) * scale,
        };
        scale
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }
}

fn normal_matrix(world: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(world);
    if linear.determinant().abs() <= f32::EPSILON {
        return Mat3::IDENTITY;
    }
    linear.inverse().transpose()
}

/// Area-weighted vertex normals
fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Assemble a GLB container from a JSON document and a binary chunk
    fn glb(document: &serde_json::Value, bin: Option<&[u8]>) -> Vec<u8> {
        let mut json = serde_json::to_vec(document).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.map(|b| b.to_vec());
        if let Some(bin) = bin.as_mut() {
            while bin.len() % 4 != 0 {
                bin.push(0);
            }
        }

        let total = 12 + 8 + json.len() + bin.as_ref().map_or(0, |b| 8 + b.len());
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&0x4654_6C67u32.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());

        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
        out.extend_from_slice(&json);

        if let Some(bin) = bin {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
            out.extend_from_slice(&bin);
        }
        out
    }

    /// A single triangle spanning 2 x 1 in the XY plane, under one node
    fn triangle_glb(node: serde_json::Value) -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bin = Vec::new();
        for p in positions {
            for v in p {
                bin.extend_from_slice(&v.to_le_bytes());
            }
        }
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }

        let mut node = node;
        node["mesh"] = json!(0);

        let document = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [node],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
            "buffers": [{ "byteLength": 42 }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
            ],
            "accessors": [
                {
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, 0.0, 0.0], "max": [2.0, 1.0, 0.0]
                },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        });
        glb(&document, Some(&bin))
    }

    #[test]
    fn test_decode_triangle() {
        let model = ModelAsset::from_glb(&triangle_glb(json!({}))).unwrap();
        assert_eq!(model.meshes.len(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.base_color, [1.0, 1.0, 1.0, 1.0]);
        // Generated normals face +Z for a counter-clockwise XY triangle
        for n in &mesh.normals {
            assert!(n.abs_diff_eq(Vec3::Z, 1e-6));
        }
        assert_eq!(model.bounds.min, Vec3::ZERO);
        assert_eq!(model.bounds.max, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_node_transform_is_baked() {
        let model =
            ModelAsset::from_glb(&triangle_glb(json!({ "translation": [0.0, 5.0, 0.0] }))).unwrap();
        assert_eq!(model.bounds.min, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(model.bounds.max, Vec3::new(2.0, 6.0, 0.0));
    }

    #[test]
    fn test_normalize_scales_and_grounds() {
        let mut model =
            ModelAsset::from_glb(&triangle_glb(json!({ "translation": [3.0, 5.0, 0.0] }))).unwrap();
        let scale = model.normalize(1.0);

        assert!((scale - 0.5).abs() < 1e-6);
        assert!(model.bounds.extent().abs_diff_eq(Vec3::new(1.0, 0.5, 0.0), 1e-6));
        assert!((model.bounds.min.y).abs() < 1e-6);
        assert!(model.bounds.center().x.abs() < 1e-6);
        assert!(model.bounds.center().z.abs() < 1e-6);

        let lowest = model.meshes[0]
            .positions
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min);
        assert!(lowest.abs() < 1e-6);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            ModelAsset::from_glb(b"<html>404</html>"),
            Err(SceneError::Decode(_))
        ));
    }

    #[test]
    fn test_external_buffer_rejected() {
        let document = json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "byteLength": 4, "uri": "plant.bin" }]
        });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::ExternalBuffer(uri)) if uri == "plant.bin"
        ));
    }

    #[test]
    fn test_model_without_geometry_is_empty() {
        let document = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "root" }]
        });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::EmptyModel)
        ));
    }

    #[test]
    fn test_model_without_scene() {
        let document = json!({ "asset": { "version": "2.0" } });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::NoScene)
        ));
    }

    #[test]
    fn test_self_referencing_node_rejected() {
        let document = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "loop", "children": [0] }]
        });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::CyclicHierarchy(0))
        ));
    }

    #[test]
    fn test_ancestor_cycle_rejected() {
        let document = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "name": "stem", "children": [1] },
                { "name": "leaf", "children": [0] }
            ]
        });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::CyclicHierarchy(0))
        ));
    }

    #[test]
    fn test_shared_child_rejected() {
        let document = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0, 1] }],
            "nodes": [
                { "name": "left", "children": [2] },
                { "name": "right", "children": [2] },
                { "name": "leaf" }
            ]
        });
        assert!(matches!(
            ModelAsset::from_glb(&glb(&document, None)),
            Err(SceneError::CyclicHierarchy(2))
        ));
    }

    #[test]
    fn test_short_normal_accessor_falls_back_to_generated() {
        // Triangle data plus a NORMAL accessor holding a single -Z normal
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut bin = Vec::new();
        for v in positions.iter().flatten() {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.0f32, 0.0, -1.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }

        let document = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }] }],
            "buffers": [{ "byteLength": 48 }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34962 }
            ],
            "accessors": [
                {
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, 0.0, 0.0], "max": [2.0, 1.0, 0.0]
                },
                { "bufferView": 1, "componentType": 5126, "count": 1, "type": "VEC3" }
            ]
        });

        let model = ModelAsset::from_glb(&glb(&document, Some(&bin))).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for n in &mesh.normals {
            assert!(n.abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_degenerate_model_is_not_scaled() {
        let mut model = ModelAsset {
            meshes: vec![],
            bounds: Aabb {
                min: Vec3::new(1.0, 2.0, 3.0),
                max: Vec3::new(1.0, 2.0, 3.0),
            },
        };
        assert_eq!(model.normalize(1.0), 1.0);
        assert_eq!(model.bounds.min, Vec3::ZERO);
    }
}
