use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tts_core::{CatalogError, ResolveError, SynthesisError};

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not loaded yet. Please wait.")]
    NotReady,

    #[error("Voice '{name}' not found for gender '{category}'")]
    NotFound { name: String, category: String },

    #[error("Failed to stage uploaded audio: {0}")]
    Staging(#[source] std::io::Error),

    #[error("{0}")]
    Synthesis(#[from] SynthesisError),

    #[error("WAV encoding error: {0}")]
    Encoding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound(CatalogError::NotFound { name, category }) => {
                ApiError::NotFound { name, category }
            }
            ResolveError::Staging(io) => ApiError::Staging(io),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotReady
            | ApiError::Staging(_)
            | ApiError::Synthesis(_)
            | ApiError::Encoding(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable classification echoed in the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotReady => "not_ready",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Staging(_) => "staging_error",
            ApiError::Synthesis(_) => "synthesis_error",
            ApiError::Encoding(_) => "encoding_error",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    kind: &'static str,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!("Generation error ({}): {}", self.kind(), detail);
        } else {
            tracing::warn!("Request rejected ({}): {}", self.kind(), detail);
        }

        let body = Json(ErrorResponse {
            detail,
            kind: self.kind(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
