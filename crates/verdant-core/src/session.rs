//! Immersive session lifecycle
//!
//! The browser owns the actual session; this tracks where negotiation stands so
//! gestures arriving mid-negotiation are ignored and failures stay retryable.

use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Requesting,
    Active,
    Failed,
}

/// The asynchronous steps of session negotiation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    CapabilityProbe,
    SessionRequest,
    GraphicsLayer,
    FloorSpace,
    ViewerSpace,
    HitTestSource,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::CapabilityProbe => "capability probe",
            NegotiationStep::SessionRequest => "session request",
            NegotiationStep::GraphicsLayer => "graphics layer setup",
            NegotiationStep::FloorSpace => "local-floor reference space",
            NegotiationStep::ViewerSpace => "viewer reference space",
            NegotiationStep::HitTestSource => "hit-test source",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Immersive AR is not supported by this browser")]
    Unsupported,
    #[error("AR session negotiation failed at {step}: {reason}")]
    Negotiation {
        step: NegotiationStep,
        reason: String,
    },
    #[error("An AR session request is already in progress")]
    AlreadyRequesting,
    #[error("An AR session is already active")]
    AlreadyActive,
}

impl SessionError {
    pub fn negotiation(step: NegotiationStep, reason: impl Into<String>) -> Self {
        SessionError::Negotiation {
            step,
            reason: reason.into(),
        }
    }
}

/// Idle -> Requesting -> {Active | Failed}; Failed may be retried, Active
/// returns to Idle when the host ends the session.
#[derive(Debug, Clone, Default)]
pub struct SessionLifecycle {
    state: SessionState,
    /// Set once the capability probe reports no AR support
    unsupported: bool,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether AR was found unsupported; the feature stays disabled afterwards
    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    /// Start a request in response to a user gesture
    pub fn begin_request(&mut self) -> Result<(), SessionError> {
        if self.unsupported {
            return Err(SessionError::Unsupported);
        }
        match self.state {
            SessionState::Idle | SessionState::Failed => {
                debug!(from = ?self.state, "Requesting AR session");
                self.state = SessionState::Requesting;
                Ok(())
            }
            SessionState::Requesting => Err(SessionError::AlreadyRequesting),
            SessionState::Active => Err(SessionError::AlreadyActive),
        }
    }

    /// Negotiation finished; returns false if no request was outstanding
    pub fn activate(&mut self) -> bool {
        if self.state != SessionState::Requesting {
            warn!(state = ?self.state, "Session activation without a pending request");
            return false;
        }
        info!("AR session active");
        self.state = SessionState::Active;
        true
    }

    /// Record a negotiation failure
    ///
    /// Returns true when the failure should be reported to the user; a missing
    /// capability is reported only the first time.
    pub fn fail(&mut self, error: &SessionError) -> bool {
        self.state = SessionState::Failed;
        match error {
            SessionError::Unsupported => {
                let first = !self.unsupported;
                self.unsupported = true;
                first
            }
            _ => true,
        }
    }

    /// The host ended the session
    pub fn end(&mut self) {
        if self.state == SessionState::Active {
            info!("AR session ended");
        }
        self.state = SessionState::Idle;
    }
}
