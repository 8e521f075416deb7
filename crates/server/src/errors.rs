use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use datalayer::DataLayerError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    DataLayer(#[from] DataLayerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::DataLayer(e @ DataLayerError::InvalidArgument(_)) => (StatusCode::BAD_REQUEST, e.code()),
            ApiError::DataLayer(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
        };
        let msg = self.to_string();
        if status.is_server_error() {
            error!(error = %msg, code, "data layer request failed");
        }
        (status, Json(serde_json::json!({"error": msg, "code": code}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
