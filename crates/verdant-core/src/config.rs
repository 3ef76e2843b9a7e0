//! Viewer configuration: asset naming convention and model sizing

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse viewer configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid viewer configuration: {0}")]
    Invalid(String),
}

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl ViewerConfig {
    /// Parse from TOML, filling unspecified fields with defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.extension.trim().is_empty() {
            return Err(ConfigError::Invalid("asset extension is empty".to_string()));
        }
        if !(self.model.canonical_size.is_finite() && self.model.canonical_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canonical model size must be positive, got {}",
                self.model.canonical_size
            )));
        }
        Ok(())
    }
}

/// Where model assets live: `<directory>/<key>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_asset_directory")]
    pub directory: String,
    #[serde(default = "default_asset_extension")]
    pub extension: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            directory: default_asset_directory(),
            extension: default_asset_extension(),
        }
    }
}

impl AssetConfig {
    /// Resource path for a plant key
    pub fn model_path(&self, key: &str) -> String {
        let directory = self.directory.trim_end_matches('/');
        let extension = self.extension.trim_start_matches('.');
        if directory.is_empty() {
            format!("{}.{}", key, extension)
        } else {
            format!("{}/{}.{}", directory, key, extension)
        }
    }
}

fn default_asset_directory() -> String {
    "models".to_string()
}

fn default_asset_extension() -> String {
    "glb".to_string()
}

/// Loaded model normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Largest bounding-box extent after normalization, in meters
    #[serde(default = "default_canonical_size")]
    pub canonical_size: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            canonical_size: default_canonical_size(),
        }
    }
}

fn default_canonical_size() -> f32 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_path() {
        let assets = AssetConfig::default();
        assert_eq!(assets.model_path("tulsi"), "models/tulsi.glb");
        assert_eq!(assets.model_path("Ahwagandha"), "models/Ahwagandha.glb");
    }

    #[test]
    fn test_model_path_normalizes_separators() {
        let assets = AssetConfig {
            directory: "static/models/".to_string(),
            extension: ".gltf".to_string(),
        };
        assert_eq!(assets.model_path("clove"), "static/models/clove.gltf");

        let flat = AssetConfig {
            directory: String::new(),
            extension: "glb".to_string(),
        };
        assert_eq!(flat.model_path("clove"), "clove.glb");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ViewerConfig::from_toml("[model]\ncanonical_size = 0.4\n").unwrap();
        assert_eq!(config.assets, AssetConfig::default());
        assert_eq!(config.model.canonical_size, 0.4);
    }

    #[test]
    fn test_invalid_size_rejected() {
        assert!(matches!(
            ViewerConfig::from_toml("[model]\ncanonical_size = 0.0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
