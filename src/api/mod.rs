//! HTTP API over the template catalog
//!
//! ```text
//! GET  /health                                   health check
//! GET  /version                                  service version
//! GET  /api/v1/claim-templates                   list templates
//! GET  /api/v1/claim-templates/:name             template details
//! POST /api/v1/claim-templates/:name/order       render template
//! ```

pub mod template_routes;

use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::render::ClaimRenderer;

pub use template_routes::template_router;

pub const SERVICE_NAME: &str = "claim-machinery-api";

/// Shared state for request handlers. The catalog is a read-only snapshot.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub renderer: Arc<dyn ClaimRenderer>,
}

impl AppState {
    pub fn new(catalog: Catalog, renderer: impl ClaimRenderer + 'static) -> Self {
        Self {
            catalog: Arc::new(catalog),
            renderer: Arc::new(renderer),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn root_info() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/version",
            "/api/v1/claim-templates",
            "/api/v1/claim-templates/{name}",
            "/api/v1/claim-templates/{name}/order",
        ],
    }))
}

/// Build the full router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_info))
        .route("/health", get(health))
        .route("/version", get(version))
        .merge(template_router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
