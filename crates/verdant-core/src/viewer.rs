//! The owning viewer context
//!
//! One `ViewerContext` exists per page. It owns the selection, surface
//! tracker, session lifecycle, placement coordinator and scene, and reports
//! everything user-visible through a [`ViewerUi`]. Browser callbacks (select
//! change, frame, select gesture, load resolution) each map to one method.

use std::cell::RefCell;
use tracing::{debug, info, warn};

use crate::catalog::PlantCatalog;
use crate::config::ViewerConfig;
use crate::notice::{Notice, StatusIndicator};
use crate::placement::{
    LoadError, ModelLoader, PlacedModel, PlacementCoordinator, PlacementOutcome,
    PlacementRejected, PlacementTicket, SceneGraph,
};
use crate::pose::SurfacePose;
use crate::selection::{InfoPanel, SelectionState};
use crate::session::{SessionError, SessionLifecycle, SessionState};
use crate::surface::{HitObservation, SurfaceTracker, SurfaceTransition};

/// The presentation surface: debug line, status icon and info card
pub trait ViewerUi {
    fn show_notice(&mut self, notice: &Notice);
    fn set_indicator(&mut self, indicator: StatusIndicator);
    fn show_info(&mut self, panel: &InfoPanel);
}

pub struct ViewerContext<S: SceneGraph, U: ViewerUi> {
    catalog: PlantCatalog,
    config: ViewerConfig,
    selection: SelectionState,
    surface: SurfaceTracker,
    session: SessionLifecycle,
    placement: PlacementCoordinator<S::Handle>,
    scene: S,
    ui: U,
}

impl<S: SceneGraph, U: ViewerUi> ViewerContext<S, U> {
    /// Create the context and put the UI in its initial state
    pub fn new(catalog: PlantCatalog, config: ViewerConfig, scene: S, mut ui: U) -> Self {
        ui.set_indicator(StatusIndicator::Unknown);
        ui.show_info(&InfoPanel::Hidden);

        let mut ctx = Self {
            catalog,
            config,
            selection: SelectionState::default(),
            surface: SurfaceTracker::new(),
            session: SessionLifecycle::new(),
            placement: PlacementCoordinator::new(),
            scene,
            ui,
        };
        ctx.notify(Notice::Welcome);
        ctx
    }

    fn notify(&mut self, notice: Notice) {
        if notice.is_failure() {
            warn!(notice = %notice, "Viewer notice");
        } else {
            info!(notice = %notice, "Viewer notice");
        }
        self.ui.show_notice(&notice);
    }

    /// The selection control changed
    pub fn select_plant(&mut self, key: &str) -> InfoPanel {
        let panel = self.selection.select(&self.catalog, key);
        self.ui.show_info(&panel);

        let notice = match self.selection.selected() {
            Some(key) => Notice::Selected(key.to_string()),
            None => Notice::NoSelection,
        };
        self.notify(notice);
        panel
    }

    /// The user tapped the canvas; returns true if the caller should negotiate a session
    pub fn request_session(&mut self) -> bool {
        match self.session.begin_request() {
            Ok(()) => true,
            Err(error) => {
                debug!(error = %error, "Ignoring session request");
                false
            }
        }
    }

    /// Negotiation succeeded and the frame loop is about to start
    pub fn session_started(&mut self) {
        if self.session.activate() {
            self.surface.reset();
            self.notify(Notice::SessionStarted);
        }
    }

    /// Negotiation failed at some step
    pub fn session_failed(&mut self, error: SessionError) {
        warn!(error = %error, "AR session could not start");
        if self.session.fail(&error) {
            let notice = match error {
                SessionError::Unsupported => Notice::Unsupported,
                _ => Notice::SessionFailed,
            };
            self.notify(notice);
        }
    }

    /// The host ended the session; frames stop arriving after this
    pub fn session_ended(&mut self) {
        if self.session.state() != SessionState::Active {
            return;
        }
        self.session.end();
        self.surface.reset();
        self.placement.invalidate();
        self.ui.set_indicator(StatusIndicator::Unknown);
        self.notify(Notice::SessionEnded);
    }

    /// One rendered frame's hit-test outcome
    pub fn on_frame(&mut self, observation: HitObservation) -> Option<SurfaceTransition> {
        if !self.session.is_active() {
            return None;
        }
        let transition = self.surface.observe(observation)?;
        match transition {
            SurfaceTransition::Detected => {
                self.notify(Notice::SurfaceDetected);
                self.ui.set_indicator(StatusIndicator::Affirmative);
            }
            SurfaceTransition::Lost => {
                self.notify(Notice::SurfaceLost);
                self.ui.set_indicator(StatusIndicator::Negative);
            }
        }
        Some(transition)
    }

    /// The session's select gesture; returns a ticket when a load should start
    pub fn begin_placement(&mut self) -> Option<PlacementTicket> {
        let result = self
            .placement
            .begin(self.selection.selected(), self.surface.current_pose());
        match result {
            Ok(ticket) => Some(ticket),
            Err(rejected) => {
                let notice = match rejected {
                    PlacementRejected::NoSelection => Notice::SelectPlantFirst,
                    PlacementRejected::NoSurface => Notice::NoSurfaceDetected,
                    PlacementRejected::Busy(key) => Notice::PlacementBusy(key),
                };
                self.notify(notice);
                None
            }
        }
    }

    /// A load started by `begin_placement` resolved
    pub fn finish_placement(
        &mut self,
        ticket: PlacementTicket,
        loaded: Result<S::Model, LoadError>,
    ) -> Result<(), LoadError> {
        match self.placement.complete(&mut self.scene, ticket, loaded) {
            PlacementOutcome::Placed { key } => {
                self.notify(Notice::Placed(key));
                Ok(())
            }
            PlacementOutcome::Failed { key, error } => {
                self.notify(Notice::LoadFailed(key));
                Err(error)
            }
            PlacementOutcome::Discarded { key } => {
                debug!(plant = %key, "Load finished after its session ended");
                Ok(())
            }
        }
    }

    pub fn catalog(&self) -> &PlantCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn selected_plant(&self) -> Option<&str> {
        self.selection.selected()
    }

    pub fn surface_pose(&self) -> Option<SurfacePose> {
        self.surface.current_pose()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_placing(&self) -> bool {
        self.placement.is_pending()
    }

    pub fn placed(&self) -> Option<&PlacedModel<S::Handle>> {
        self.placement.placed()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }
}

/// Run one placement end to end: capture, load, attach
///
/// The context is borrowed only around the two synchronous steps, so frames
/// and gestures keep flowing while the load is in flight. Returns `None` when
/// the gesture was rejected.
pub async fn place<S, U, L>(
    ctx: &RefCell<ViewerContext<S, U>>,
    loader: &L,
) -> Option<Result<(), LoadError>>
where
    S: SceneGraph,
    U: ViewerUi,
    L: ModelLoader<Model = S::Model>,
{
    let ticket = ctx.borrow_mut().begin_placement()?;
    let loaded = loader.load(ticket.key()).await;
    Some(ctx.borrow_mut().finish_placement(ticket, loaded))
}
