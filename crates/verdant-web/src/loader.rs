//! Fetches and decodes plant models

use tracing::{debug, info};
use verdant_core::{AssetConfig, LoadError, ModelLoader};
use verdant_scene::ModelAsset;

use crate::network::{fetch_bytes, FetchError};

/// Loads `<directory>/<key>.<extension>` over HTTP
///
/// Every call is a fresh request; nothing is cached between placements.
pub struct HttpModelLoader {
    assets: AssetConfig,
    canonical_size: f32,
}

impl HttpModelLoader {
    pub fn new(assets: AssetConfig, canonical_size: f32) -> Self {
        Self {
            assets,
            canonical_size,
        }
    }
}

/// Map a failed fetch onto the loader's failure kinds
fn classify(path: &str, error: FetchError) -> LoadError {
    match error {
        FetchError::Status(404) => LoadError::NotFound(path.to_string()),
        other => LoadError::Transport {
            path: path.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Decode a fetched body and scale it to the canonical size
fn decode(path: &str, bytes: &[u8], canonical_size: f32) -> Result<(ModelAsset, f32), LoadError> {
    let mut model = ModelAsset::from_glb(bytes).map_err(|e| LoadError::Parse {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let scale = model.normalize(canonical_size);
    Ok((model, scale))
}

impl ModelLoader for HttpModelLoader {
    type Model = ModelAsset;

    async fn load(&self, key: &str) -> Result<ModelAsset, LoadError> {
        let path = self.assets.model_path(key);
        debug!(%path, "Fetching model");

        let bytes = fetch_bytes(&path).await.map_err(|e| classify(&path, e))?;
        let (model, scale) = decode(&path, &bytes, self.canonical_size)?;

        info!(
            %path,
            bytes = bytes.len(),
            vertices = model.vertex_count(),
            scale,
            "Model loaded"
        );
        Ok(model)
    }
}
