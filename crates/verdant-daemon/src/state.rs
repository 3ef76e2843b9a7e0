//! Application state management

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use verdant_core::{AssetConfig, PlantCatalog};

use crate::config::Config;

/// Which catalog entries have a model file on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelAudit {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl ModelAudit {
    pub fn run(catalog: &PlantCatalog, assets: &AssetConfig) -> Self {
        let mut audit = Self::default();
        for key in catalog.keys() {
            let path = assets.model_path(key);
            if Path::new(&path).is_file() {
                audit.present.push(key.to_string());
            } else {
                warn!(plant = %key, path = %path, "Model asset missing");
                audit.missing.push(key.to_string());
            }
        }
        audit
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.present.iter().any(|k| k == key)
    }
}

/// Shared application state
pub struct AppState {
    /// Plant table served at /api/plants
    pub catalog: PlantCatalog,
    /// Startup check of the models directory
    pub audit: ModelAudit,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let catalog = match &config.catalog.path {
            Some(path) => PlantCatalog::from_file(Path::new(path))
                .with_context(|| format!("Failed to load plant catalog {}", path))?,
            None => PlantCatalog::builtin().context("Built-in plant catalog is invalid")?,
        };
        info!(plants = catalog.len(), "Plant catalog loaded");

        let audit = ModelAudit::run(&catalog, &config.models.assets());
        info!(
            present = audit.present.len(),
            missing = audit.missing.len(),
            path = %config.models.path,
            "Model audit complete"
        );

        Ok(Arc::new(Self {
            catalog,
            audit,
            config,
        }))
    }
}
