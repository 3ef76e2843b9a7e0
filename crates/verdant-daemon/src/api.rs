//! REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use verdant_core::PlantEntry;

use crate::state::AppState;

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// One plant plus where its model is served
#[derive(Serialize)]
pub struct PlantDetail<'a> {
    #[serde(flatten)]
    pub entry: &'a PlantEntry,
    /// URL path of the model, relative to the site root
    pub model: String,
    /// Whether the model file existed at startup
    pub model_available: bool,
}

/// List all plants in catalog order
pub async fn list_plants(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.entries().to_vec())
}

/// Get a specific plant by key
pub async fn get_plant(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.catalog.get(&key) {
        Some(entry) => {
            debug!(plant = %key, "Plant lookup");
            Json(PlantDetail {
                entry,
                model: format!("models/{}.{}", entry.key, state.config.models.extension),
                model_available: state.audit.is_present(&entry.key),
            })
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(format!("Unknown plant: {}", key))),
        )
            .into_response(),
    }
}

/// Liveness probe used by verdant-qr
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "plants": state.catalog.len(),
        "models_missing": state.audit.missing,
    }))
}
