//! Router and listeners for the viewer host

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;

/// Build the router: API, model directory and the frontend as fallback
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // API routes
        .route("/api/plants", get(api::list_plants))
        .route("/api/plants/{key}", get(api::get_plant))
        .route("/api/health", get(api::health))
        // Serve models
        .nest_service("/models", ServeDir::new(&state.config.models.path))
        // index.html, wasm-bindgen output and viewer.toml
        .fallback_service(ServeDir::new(&state.config.web.root))
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until the process is stopped; HTTPS whenever TLS is configured
pub async fn run(state: Arc<AppState>, bind: &str, tls: Option<&TlsConfig>) -> Result<()> {
    let app = router(state);

    if let Some(tls) = tls {
        run_https(app, bind, tls).await
    } else {
        if !is_loopback(bind) {
            warn!(
                address = %bind,
                "Serving plain HTTP; browsers only expose WebXR to HTTPS or localhost origins"
            );
        }
        run_http(app, bind).await
    }
}

fn is_loopback(bind: &str) -> bool {
    bind.parse::<SocketAddr>()
        .map(|addr| addr.ip().is_loopback())
        .unwrap_or_else(|_| bind.starts_with("localhost"))
}

async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!(address = %listener.local_addr()?, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Serve over TLS so phones on the LAN get a secure origin
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    for (what, file) in [("certificate", &tls.cert), ("key", &tls.key)] {
        if !Path::new(file).is_file() {
            anyhow::bail!("TLS {} file not found: {}", what, file);
        }
    }
    let rustls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .with_context(|| format!("loading TLS material from {} and {}", tls.cert, tls.key))?;

    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("HTTPS needs a numeric bind address, got {}", bind))?;
    info!(address = %addr, protocol = "HTTPS", cert = %tls.cert, "Starting web server");

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Fixture {
        _dir: TempDir,
        app: Router,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let models = dir.path().join("models");
        let web = dir.path().join("web");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::create_dir_all(&web).unwrap();
        std::fs::write(models.join("tulsi.glb"), b"glTF-model").unwrap();
        std::fs::write(web.join("index.html"), b"<html>viewer</html>").unwrap();

        let mut config = Config::default();
        config.models.path = models.display().to_string();
        config.web.root = web.display().to_string();

        let state = AppState::new(config).unwrap();
        Fixture {
            _dir: dir,
            app: router(state),
        }
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_list_plants() {
        let fixture = fixture();
        let (status, body) = get(&fixture.app, "/api/plants").await;
        assert_eq!(status, StatusCode::OK);

        let plants: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(plants.len(), 6);
        assert_eq!(plants[0]["key"], "Ahwagandha");
        assert_eq!(plants[0]["name"], "Ashwagandha");
    }

    #[tokio::test]
    async fn test_get_plant() {
        let fixture = fixture();
        let (status, body) = get(&fixture.app, "/api/plants/tulsi").await;
        assert_eq!(status, StatusCode::OK);

        let plant: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(plant["name"], "Tulsi (Holy Basil)");
        assert_eq!(plant["model"], "models/tulsi.glb");
        assert_eq!(plant["model_available"], true);

        let (_, body) = get(&fixture.app, "/api/plants/clove").await;
        let plant: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(plant["model_available"], false);
    }

    #[tokio::test]
    async fn test_unknown_plant_is_404() {
        let fixture = fixture();
        let (status, body) = get(&fixture.app, "/api/plants/Tulsi").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "Unknown plant: Tulsi");
    }

    #[tokio::test]
    async fn test_health() {
        let fixture = fixture();
        let (status, body) = get(&fixture.app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["plants"], 6);
        assert_eq!(health["models_missing"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_serves_models_and_frontend() {
        let fixture = fixture();
        let (status, body) = get(&fixture.app, "/models/tulsi.glb").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"glTF-model");

        let (status, _) = get(&fixture.app, "/models/clove.glb").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get(&fixture.app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>viewer</html>");
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("127.0.0.1:8080"));
        assert!(is_loopback("localhost:8080"));
        assert!(!is_loopback("0.0.0.0:8080"));
    }
}
