//! Configuration loading and validation

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use verdant_core::AssetConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TLS configuration (optional - enables HTTPS when present)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Directory holding index.html and the wasm-bindgen output
    #[serde(default = "default_web_root")]
    pub root: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            root: default_web_root(),
        }
    }
}

fn default_web_root() -> String {
    "./web".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory with one `<key>.<extension>` file per plant, served at /models
    #[serde(default = "default_models_path")]
    pub path: String,
    #[serde(default = "default_models_extension")]
    pub extension: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            path: default_models_path(),
            extension: default_models_extension(),
        }
    }
}

impl ModelsConfig {
    /// Asset naming rooted at the models directory on disk
    pub fn assets(&self) -> AssetConfig {
        AssetConfig {
            directory: self.path.clone(),
            extension: self.extension.clone(),
        }
    }
}

fn default_models_path() -> String {
    "./models".to_string()
}

fn default_models_extension() -> String {
    "glb".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Plant table override; the built-in table is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Reject settings that would only fail once a phone connects
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.daemon.bind.trim().is_empty(), "daemon.bind is empty");
        ensure!(!self.web.root.trim().is_empty(), "web.root is empty");
        ensure!(
            !self.models.extension.is_empty() && !self.models.extension.starts_with('.'),
            "models.extension must be a bare extension such as \"glb\", got {:?}",
            self.models.extension
        );
        if let Some(tls) = &self.daemon.tls {
            ensure!(
                !tls.cert.is_empty() && !tls.key.is_empty(),
                "daemon.tls needs both cert and key"
            );
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("verdant.toml")).unwrap();
        assert_eq!(config.daemon.bind, "0.0.0.0:8080");
        assert!(config.daemon.tls.is_none());
        assert_eq!(config.models.assets().model_path("tulsi"), "./models/tulsi.glb");
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_saved_defaults_load_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("verdant.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.web.root, "./web");
        assert_eq!(config.models.extension, "glb");
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("verdant.toml");
        std::fs::write(
            &path,
            r#"
[daemon]
bind = "0.0.0.0:8443"

[daemon.tls]
cert = "cert.pem"
key = "key.pem"

[catalog]
path = "plants.toml"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.daemon.bind, "0.0.0.0:8443");
        assert_eq!(config.daemon.tls.unwrap().cert, "cert.pem");
        assert_eq!(config.catalog.path.as_deref(), Some("plants.toml"));
        assert_eq!(config.models.path, "./models");
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("verdant.toml");
        std::fs::write(&path, "[models]\nextension = \".glb\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("models.extension"));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.daemon.tls = Some(TlsConfig {
            cert: "cert.pem".into(),
            key: String::new(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("verdant.toml");
        std::fs::write(&path, "[daemon\nbind = ").unwrap();
        assert!(load_config(&path).is_err());
    }
}
