//! Verdant Core - Plant catalog, surface tracking and placement state
//!
//! This crate holds everything about the AR plant viewer that does not touch
//! the browser:
//! - The plant catalog and the selection/info-panel contract
//! - The edge-triggered surface tracker fed by per-frame hit tests
//! - The session lifecycle and its failure taxonomy
//! - The placement coordinator that anchors one model at a captured pose
//! - `ViewerContext`, which owns all of the above for one page

pub mod catalog;
pub mod config;
pub mod notice;
pub mod placement;
pub mod pose;
pub mod selection;
pub mod session;
pub mod surface;
pub mod viewer;

pub use catalog::{CatalogError, PlantCatalog, PlantEntry};
pub use config::{AssetConfig, ConfigError, ModelConfig, ViewerConfig};
pub use notice::{Notice, StatusIndicator};
pub use placement::{
    LoadError, ModelLoader, PlacedModel, PlacementCoordinator, PlacementOutcome,
    PlacementRejected, PlacementTicket, SceneGraph,
};
pub use pose::SurfacePose;
pub use selection::{InfoPanel, SelectionState};
pub use session::{NegotiationStep, SessionError, SessionLifecycle, SessionState};
pub use surface::{HitObservation, SurfaceState, SurfaceTracker, SurfaceTransition};
pub use viewer::{place, ViewerContext, ViewerUi};

// Re-export glam so downstream crates agree on the matrix type
pub use glam;
