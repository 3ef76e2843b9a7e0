//! Model placement: from a select gesture to an anchored scene node
//!
//! Placement is split around the asynchronous model load:
//! 1. [`PlacementCoordinator::begin`] checks preconditions and captures the
//!    selected key and the current surface pose into a [`PlacementTicket`].
//! 2. The caller loads the model for `ticket.key()`.
//! 3. [`PlacementCoordinator::complete`] attaches the loaded model at the
//!    pose captured in step 1, never at whatever surface is current by then.
//!
//! Only one ticket is outstanding at a time, so two loads can never race to
//! attach. Tickets belong to the session they were issued in; once that
//! session ends ([`PlacementCoordinator::invalidate`]) they are discarded on
//! completion.

use std::fmt::Debug;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pose::SurfacePose;

/// Why a model could not be loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Model asset not found: {0}")]
    NotFound(String),
    #[error("Failed to fetch {path}: {reason}")]
    Transport { path: String, reason: String },
    #[error("Failed to decode {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Why a select gesture did not start a placement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementRejected {
    #[error("No plant selected")]
    NoSelection,
    #[error("No surface detected")]
    NoSurface,
    #[error("Placement of {0} is still loading")]
    Busy(String),
}

/// The scene graph that owns placed models
pub trait SceneGraph {
    /// A loaded, renderable model ready to attach
    type Model;
    /// Identifies an attached node
    type Handle: Copy + Eq + Debug;

    /// Attach a model with a fixed world transform (no automatic updates)
    fn attach(&mut self, model: Self::Model, transform: SurfacePose) -> Self::Handle;

    /// Detach and discard a node; returns false if it was not attached
    fn detach(&mut self, handle: Self::Handle) -> bool;
}

/// Fetches and decodes the model for a plant key
///
/// Each call performs a fresh load; implementations do not cache or retry.
pub trait ModelLoader {
    type Model;

    fn load(&self, key: &str) -> impl Future<Output = Result<Self::Model, LoadError>>;
}

/// A started placement: the key and pose captured at gesture time
#[derive(Debug, PartialEq)]
pub struct PlacementTicket {
    id: u64,
    generation: u64,
    key: String,
    pose: SurfacePose,
}

impl PlacementTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pose(&self) -> SurfacePose {
        self.pose
    }
}

/// The single model currently in the scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedModel<H> {
    pub key: String,
    pub handle: H,
}

/// Result of completing a placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed { key: String },
    Failed { key: String, error: LoadError },
    /// The session that issued the ticket has ended; the scene is untouched
    Discarded { key: String },
}

/// Serializes placements and enforces at most one placed model
#[derive(Debug)]
pub struct PlacementCoordinator<H> {
    pending: Option<(u64, String)>,
    next_id: u64,
    generation: u64,
    placed: Option<PlacedModel<H>>,
}

impl<H> Default for PlacementCoordinator<H> {
    fn default() -> Self {
        Self {
            pending: None,
            next_id: 0,
            generation: 0,
            placed: None,
        }
    }
}

impl<H: Copy + Eq + Debug> PlacementCoordinator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a select gesture
    ///
    /// Checks run in order: a load already in flight, a selected plant, a
    /// tracked surface. Rejection changes no state.
    pub fn begin(
        &mut self,
        selected: Option<&str>,
        surface: Option<SurfacePose>,
    ) -> Result<PlacementTicket, PlacementRejected> {
        if let Some((_, key)) = &self.pending {
            return Err(PlacementRejected::Busy(key.clone()));
        }
        let key = selected.ok_or(PlacementRejected::NoSelection)?;
        let pose = surface.ok_or(PlacementRejected::NoSurface)?;

        let id = self.next_id;
        self.next_id += 1;
        self.pending = Some((id, key.to_string()));
        debug!(ticket = id, plant = %key, position = ?pose.position(), "Placement started");

        Ok(PlacementTicket {
            id,
            generation: self.generation,
            key: key.to_string(),
            pose,
        })
    }

    /// Finish a placement once its load resolved
    ///
    /// On success the previous model (if any) is detached first, then the new
    /// one attached at the ticket's pose. On failure the scene is untouched.
    pub fn complete<S>(
        &mut self,
        scene: &mut S,
        ticket: PlacementTicket,
        loaded: Result<S::Model, LoadError>,
    ) -> PlacementOutcome
    where
        S: SceneGraph<Handle = H>,
    {
        if ticket.generation != self.generation {
            debug!(ticket = ticket.id, plant = %ticket.key, "Discarding placement from an ended session");
            return PlacementOutcome::Discarded { key: ticket.key };
        }

        match &self.pending {
            Some((id, _)) if *id == ticket.id => self.pending = None,
            _ => warn!(ticket = ticket.id, "Completing a placement that was not pending"),
        }

        let model = match loaded {
            Ok(model) => model,
            Err(error) => {
                warn!(plant = %ticket.key, error = %error, "Model load failed");
                return PlacementOutcome::Failed {
                    key: ticket.key,
                    error,
                };
            }
        };

        if let Some(previous) = self.placed.take() {
            if !scene.detach(previous.handle) {
                warn!(plant = %previous.key, "Previous model was already detached");
            }
        }

        let handle = scene.attach(model, ticket.pose);
        info!(plant = %ticket.key, ?handle, "Model placed");
        self.placed = Some(PlacedModel {
            key: ticket.key.clone(),
            handle,
        });

        PlacementOutcome::Placed { key: ticket.key }
    }

    /// The session ended: outstanding tickets become stale
    ///
    /// The placed model stays; its pose was captured in the session's own
    /// reference space, so it is detached only by the next placement.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if let Some((id, key)) = self.pending.take() {
            debug!(ticket = id, plant = %key, "Placement abandoned with its session");
        }
    }

    /// Whether a load is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn placed(&self) -> Option<&PlacedModel<H>> {
        self.placed.as_ref()
    }
}
