//! Per-frame surface tracking
//!
//! Hit-test results arrive once per rendered frame. The tracker keeps the most
//! recent surface pose and reduces the per-frame stream to edge-triggered
//! transitions between two states, so "surface detected" / "surface lost"
//! fire once per change rather than once per frame.

use crate::pose::SurfacePose;

/// What one frame's hit-test query produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitObservation {
    /// The hit-test source returned no intersections
    NoResults,
    /// At least one intersection, but the foremost one has no pose in the tracking space
    Unresolved,
    /// The foremost intersection resolved to a pose
    Resolved(SurfacePose),
}

impl HitObservation {
    /// Reduce a ranked result list to an observation
    ///
    /// Only the foremost result (index 0) is considered. If its pose does not
    /// resolve the frame is `Unresolved`; later results are not tried.
    pub fn from_ranked<T>(results: &[T], resolve: impl FnOnce(&T) -> Option<SurfacePose>) -> Self {
        match results.first() {
            None => HitObservation::NoResults,
            Some(first) => match resolve(first) {
                Some(pose) => HitObservation::Resolved(pose),
                None => HitObservation::Unresolved,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    #[default]
    NoSurface,
    SurfaceFound,
}

/// Emitted only when the surface state actually changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTransition {
    Detected,
    Lost,
}

/// Two-state surface machine plus the latest pose
#[derive(Debug, Clone, Default)]
pub struct SurfaceTracker {
    state: SurfaceState,
    pose: Option<SurfacePose>,
}

impl SurfaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's observation
    pub fn observe(&mut self, observation: HitObservation) -> Option<SurfaceTransition> {
        match observation {
            HitObservation::Resolved(pose) => {
                self.pose = Some(pose);
                if self.state == SurfaceState::NoSurface {
                    self.state = SurfaceState::SurfaceFound;
                    return Some(SurfaceTransition::Detected);
                }
                None
            }
            // A hit without a pose changes nothing
            HitObservation::Unresolved => None,
            HitObservation::NoResults => {
                // Never keep a stale pose to place against
                self.pose = None;
                if self.state == SurfaceState::SurfaceFound {
                    self.state = SurfaceState::NoSurface;
                    return Some(SurfaceTransition::Lost);
                }
                None
            }
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// The pose from the most recent frame, if a surface is tracked
    pub fn current_pose(&self) -> Option<SurfacePose> {
        self.pose
    }

    /// Forget everything, e.g. when the session ends
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
