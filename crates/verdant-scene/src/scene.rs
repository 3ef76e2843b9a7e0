//! The scene graph placed models live in

use glam::Mat4;
use tracing::debug;
use verdant_core::{SceneGraph, SurfacePose};

use crate::camera::CameraSettings;
use crate::lighting::Lighting;
use crate::model::ModelAsset;

/// Identifies a node for the lifetime of the scene; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A model at a fixed world transform
///
/// The transform is set once at attach time and never updated.
#[derive(Debug)]
pub struct SceneNode {
    pub id: NodeId,
    pub model: ModelAsset,
    pub world: Mat4,
}

/// Root scene: camera, lights and attached models
#[derive(Debug, Default)]
pub struct Scene {
    pub camera: CameraSettings,
    pub lighting: Lighting,
    nodes: Vec<SceneNode>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneGraph for Scene {
    type Model = ModelAsset;
    type Handle = NodeId;

    fn attach(&mut self, model: ModelAsset, transform: SurfacePose) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        debug!(node = id.0, position = ?transform.position(), "Attaching node");
        self.nodes.push(SceneNode {
            id,
            model,
            world: transform.matrix(),
        });
        id
    }

    fn detach(&mut self, handle: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != handle);
        self.nodes.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Aabb;
    use glam::Vec3;

    fn empty_model() -> ModelAsset {
        ModelAsset {
            meshes: Vec::new(),
            bounds: Aabb {
                min: Vec3::ZERO,
                max: Vec3::ONE,
            },
        }
    }

    #[test]
    fn test_attach_keeps_transform() {
        let mut scene = Scene::new();
        let pose = SurfacePose::from_translation(Vec3::new(0.5, 0.0, -2.0));
        let id = scene.attach(empty_model(), pose);

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get(id).unwrap().world, pose.matrix());
    }

    #[test]
    fn test_detach() {
        let mut scene = Scene::new();
        let first = scene.attach(empty_model(), SurfacePose::from_matrix(Mat4::IDENTITY));
        let second = scene.attach(empty_model(), SurfacePose::from_matrix(Mat4::IDENTITY));
        assert_ne!(first, second);

        assert!(scene.detach(first));
        assert!(!scene.detach(first));
        assert_eq!(scene.len(), 1);
        assert!(scene.get(second).is_some());
    }

    #[test]
    fn test_placement_keeps_single_node() {
        use verdant_core::PlacementCoordinator;

        let mut scene = Scene::new();
        let mut placement = PlacementCoordinator::new();
        let surface = SurfacePose::from_translation(Vec3::new(0.0, 0.0, -1.5));

        for key in ["tulsi", "clove", "Turmeric"] {
            let ticket = placement.begin(Some(key), Some(surface)).unwrap();
            placement.complete(&mut scene, ticket, Ok(empty_model()));
        }

        assert_eq!(scene.len(), 1);
        let placed = placement.placed().unwrap();
        assert_eq!(placed.key, "Turmeric");
        assert_eq!(scene.get(placed.handle).unwrap().world, surface.matrix());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut scene = Scene::new();
        let first = scene.attach(empty_model(), SurfacePose::from_matrix(Mat4::IDENTITY));
        scene.detach(first);
        let second = scene.attach(empty_model(), SurfacePose::from_matrix(Mat4::IDENTITY));
        assert!(second > first);
    }
}
