//! User-facing status text and the surface status indicator

use std::fmt;

/// The three-state surface indicator next to the debug line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusIndicator {
    /// A flat surface is being tracked
    Affirmative,
    /// Tracking lost the surface
    Negative,
    /// No session yet, or the session ended
    #[default]
    Unknown,
}

impl StatusIndicator {
    pub fn glyph(&self) -> &'static str {
        match self {
            StatusIndicator::Affirmative => "\u{2714}",
            StatusIndicator::Negative => "\u{2716}",
            StatusIndicator::Unknown => "?",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            StatusIndicator::Affirmative => "status-yes",
            StatusIndicator::Negative => "status-no",
            StatusIndicator::Unknown => "status-unknown",
        }
    }

    /// Every class the indicator may carry, for clearing before applying one
    pub const ALL_CLASSES: [&'static str; 3] = ["status-yes", "status-no", "status-unknown"];
}

/// A short message for the debug line
///
/// Guidance and failures alike end up here; none of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Welcome,
    Selected(String),
    NoSelection,
    Unsupported,
    SessionStarted,
    SessionFailed,
    SessionEnded,
    SelectPlantFirst,
    NoSurfaceDetected,
    SurfaceDetected,
    SurfaceLost,
    PlacementBusy(String),
    Placed(String),
    LoadFailed(String),
}

impl Notice {
    /// Failures (as opposed to guidance or progress)
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::Unsupported | Notice::SessionFailed | Notice::LoadFailed(_)
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Welcome => write!(f, "Tap the screen to start AR."),
            Notice::Selected(key) => write!(f, "Selected: {}", key),
            Notice::NoSelection => write!(f, "No plant selected"),
            Notice::Unsupported => write!(f, "WebXR not supported on this device/browser."),
            Notice::SessionStarted => write!(f, "AR session started. Tap to place plant."),
            Notice::SessionFailed => write!(f, "Failed to start AR session."),
            Notice::SessionEnded => write!(f, "AR session ended. Tap the screen to restart."),
            Notice::SelectPlantFirst => write!(f, "Select a plant first."),
            Notice::NoSurfaceDetected => write!(f, "No surface detected."),
            Notice::SurfaceDetected => {
                write!(f, "Flat surface detected! Tap to place your plant.")
            }
            Notice::SurfaceLost => {
                write!(f, "No flat surface detected. Move your device to find one.")
            }
            Notice::PlacementBusy(key) => write!(f, "Still placing {}...", key),
            Notice::Placed(key) => write!(f, "Placed {} on surface.", key),
            Notice::LoadFailed(key) => write!(f, "ERROR: Failed to load model for '{}'.", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_classes() {
        assert_eq!(StatusIndicator::default(), StatusIndicator::Unknown);
        for indicator in [
            StatusIndicator::Affirmative,
            StatusIndicator::Negative,
            StatusIndicator::Unknown,
        ] {
            assert!(StatusIndicator::ALL_CLASSES.contains(&indicator.css_class()));
        }
        assert_eq!(StatusIndicator::Affirmative.glyph(), "✔");
        assert_eq!(StatusIndicator::Negative.glyph(), "✖");
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(Notice::Selected("tulsi".into()).to_string(), "Selected: tulsi");
        assert_eq!(
            Notice::LoadFailed("clove".into()).to_string(),
            "ERROR: Failed to load model for 'clove'."
        );
        assert!(Notice::SessionFailed.is_failure());
        assert!(!Notice::SelectPlantFirst.is_failure());
    }
}
