use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request-level error taxonomy. Client input problems map to 400, everything
/// unexpected maps to a generic 500 so no internal detail leaks onto the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidImage(String),

    #[error("Image too large (max {max_bytes} bytes)")]
    PayloadTooLarge { max_bytes: usize },

    #[error("Endpoint not found")]
    NotFound,

    #[error("Analysis failed")]
    Analysis(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidImage(_) | ApiError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire message. Internal failures are collapsed to a generic string; the
    /// full chain goes to the log instead.
    fn message(&self) -> String {
        match self {
            ApiError::Analysis(_) => "Analysis failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Analysis(ref inner) = self {
            tracing::error!(error = %format!("{inner:#}"), "analysis failed");
        }
        let body = json!({
            "success": false,
            "error": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
