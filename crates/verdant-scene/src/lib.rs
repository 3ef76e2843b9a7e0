//! Verdant Scene - Renderer-independent scene data
//!
//! Holds what the WebGL renderer draws: the camera and light setup, models
//! decoded from binary glTF and the scene graph that placement attaches them
//! to. Nothing here touches the browser, so it is tested natively.

pub mod camera;
pub mod lighting;
pub mod model;
pub mod scene;

pub use camera::CameraSettings;
pub use lighting::{AmbientLight, DirectionalLight, Lighting};
pub use model::{Aabb, MeshData, ModelAsset, SceneError};
pub use scene::{NodeId, Scene, SceneNode};
