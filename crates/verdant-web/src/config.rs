//! Frontend configuration read from `viewer.toml` next to the page

use serde::{Deserialize, Serialize};
use verdant_core::{ConfigError, ViewerConfig};
use verdant_scene::CameraSettings;

/// `ViewerConfig` tables plus the camera
///
/// ```toml
/// [assets]
/// directory = "models"
/// extension = "glb"
///
/// [model]
/// canonical_size = 0.6
///
/// [camera]
/// near = 0.05
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(flatten)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub camera: CameraSettings,
}

impl FrontendConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FrontendConfig = toml::from_str(content)?;
        config.viewer.validate()?;
        if !(config.camera.near > 0.0 && config.camera.far > config.camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera depth range must satisfy 0 < near < far, got {}..{}",
                config.camera.near, config.camera.far
            )));
        }
        Ok(config)
    }
}
