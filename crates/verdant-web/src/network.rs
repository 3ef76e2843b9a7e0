//! Same-origin HTTP requests to the daemon and static host

use gloo_net::http::Request;
use thiserror::Error;
use tracing::{debug, info, warn};
use verdant_core::{PlantCatalog, PlantEntry};

use crate::config::FrontendConfig;

pub const CONFIG_PATH: &str = "viewer.toml";
pub const PLANTS_PATH: &str = "api/plants";

/// Why a GET did not produce a body
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
}

/// GET a path relative to the page and return the body
pub async fn fetch_bytes(path: &str) -> Result<Vec<u8>, FetchError> {
    let response = Request::get(path)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }
    response
        .binary()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))
}

async fn fetch_text(path: &str) -> Result<String, FetchError> {
    let bytes = fetch_bytes(path).await?;
    String::from_utf8(bytes).map_err(|e| FetchError::Transport(e.to_string()))
}

/// Plant table served by the daemon, or the compiled-in one
pub async fn fetch_catalog() -> PlantCatalog {
    let remote = match fetch_text(PLANTS_PATH).await {
        Ok(text) => serde_json::from_str::<Vec<PlantEntry>>(&text)
            .map_err(|e| e.to_string())
            .and_then(|entries| PlantCatalog::from_entries(entries).map_err(|e| e.to_string())),
        Err(e) => Err(e.to_string()),
    };

    match remote {
        Ok(catalog) => {
            info!(plants = catalog.len(), "Loaded plant catalog from {}", PLANTS_PATH);
            catalog
        }
        Err(reason) => {
            debug!(%reason, "Using built-in plant catalog");
            PlantCatalog::builtin().unwrap_or_else(|e| {
                warn!(error = %e, "Built-in plant catalog is invalid");
                PlantCatalog::default()
            })
        }
    }
}

/// `viewer.toml` if the page ships one, defaults otherwise
pub async fn fetch_config() -> FrontendConfig {
    match fetch_text(CONFIG_PATH).await {
        Ok(text) => FrontendConfig::from_toml(&text).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring {}", CONFIG_PATH);
            FrontendConfig::default()
        }),
        Err(FetchError::Status(404)) => FrontendConfig::default(),
        Err(e) => {
            warn!(error = %e, "Could not fetch {}", CONFIG_PATH);
            FrontendConfig::default()
        }
    }
}
