//! Camera parameters for the AR view

use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Fixed projection parameters
///
/// In an immersive session the browser supplies per-view projection
/// matrices; these values set the session's depth range and drive the
/// fallback projection before a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_y_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_fov() -> f32 {
    70.0
}

fn default_near() -> f32 {
    0.01
}

fn default_far() -> f32 {
    20.0
}

impl CameraSettings {
    /// Right-handed, OpenGL clip-space projection for the given aspect ratio
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh_gl(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}
