use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Request carried no usable body
    #[error("No data provided")]
    NoData,
    /// Body present but not an acceptable entry payload
    #[error("{0}")]
    InvalidPayload(String),
    /// Requested resource does not exist
    #[error("{0}")]
    NotFound(String),
    /// Session backend failure
    #[error("Session store error: {0}")]
    SessionStore(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoData | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, kind = error_type_name(&self), "Request failed");
        } else {
            tracing::debug!(error = %self, kind = error_type_name(&self), "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub(crate) fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::NoData => "no_data",
        AppError::InvalidPayload(_) => "invalid_payload",
        AppError::NotFound(_) => "not_found",
        AppError::SessionStore(_) => "session_store",
    }
}
