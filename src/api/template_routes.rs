//! Claim template API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AppState;
use crate::claim_template::{ClaimTemplate, API_VERSION};
use crate::params::{resolve_parameters, validate_parameters, ParamMap};
use crate::render::render_template;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTemplateListResponse {
    pub api_version: String,
    pub kind: String,
    pub items: Vec<ClaimTemplate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub parameters: Option<ParamMap>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub api_version: String,
    pub kind: String,
    pub metadata: OrderMetadata,
    pub rendered: String,
}

#[derive(Debug, Serialize)]
pub struct OrderMetadata {
    pub name: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "template not found")
}

/// GET /api/v1/claim-templates
async fn list_templates(State(state): State<AppState>) -> Json<ClaimTemplateListResponse> {
    Json(ClaimTemplateListResponse {
        api_version: API_VERSION.to_string(),
        kind: "ClaimTemplateList".to_string(),
        items: state.catalog.list().into_iter().cloned().collect(),
    })
}

/// GET /api/v1/claim-templates/:name
async fn get_template(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.catalog.get(&name) {
        Some(t) => Json(t.clone()).into_response(),
        None => not_found(),
    }
}

/// POST /api/v1/claim-templates/:name/order
async fn order_claim(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> Response {
    let Some(template) = state.catalog.get(&name) else {
        return not_found();
    };

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected order body for {}: {}", name, rejection);
            return error_response(StatusCode::BAD_REQUEST, "invalid request body");
        }
    };

    let params = resolve_parameters(template, request.parameters.as_ref());
    for violation in validate_parameters(template, &params) {
        warn!(
            "Order for {}: parameter '{}' {}",
            name, violation.parameter, violation.message
        );
    }

    let rendered = match render_template(state.renderer.as_ref(), template, &params).await {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Render failed for {}: {}", name, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let now = Utc::now();
    Json(OrderResponse {
        api_version: API_VERSION.to_string(),
        kind: "OrderResponse".to_string(),
        metadata: OrderMetadata {
            name: format!("{}-order-{}", name, now.format("%Y%m%d%H%M%S")),
            timestamp: now.to_rfc3339(),
        },
        rendered,
    })
    .into_response()
}

/// Routes for listing, inspecting and ordering claim templates
pub fn template_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/claim-templates", get(list_templates))
        .route("/api/v1/claim-templates/:name", get(get_template))
        .route("/api/v1/claim-templates/:name/order", post(order_claim))
}
