use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ApiError;
use crate::model::ModelInfo;
use crate::service::AnalysisService;
use crate::types::{AnalyzeRequest, AnalyzeResponse, HealthResponse};

#[derive(Clone)]
struct AppState {
    service: Arc<AnalysisService>,
}

pub fn build_router(config: &Config, service: Arc<AnalysisService>) -> Router {
    // Base64 inflates the payload by ~4/3 on top of the JSON envelope, so the
    // raw body limit sits above the decoded-image cap enforced per request.
    let body_limit = config.max_image_bytes * 2;

    Router::new()
        .route("/health", get(health_handler))
        .route("/model-info", get(model_info_handler))
        .route("/analyze", post(analyze_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { service })
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    if config.allow_any_origin() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origin_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

async fn health_handler(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Melanoma Detection API is running",
        model_loaded: true,
    })
}

async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.service.classifier().info())
}

async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::InvalidImage(format!("Invalid request body: {e}")))?;
    let image = request
        .image
        .ok_or_else(|| ApiError::InvalidImage("No image provided".to_string()))?;

    // Inference and contour analysis are CPU-bound; keep them off the
    // async runtime threads.
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.analyze(&image))
        .await
        .map_err(|e| ApiError::Analysis(anyhow::anyhow!(e)))??;
    Ok(Json(response))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}
