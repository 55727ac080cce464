//! Error types for the classification service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::ingest::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload is not a CSV-like file (400)
    #[error("Invalid file type: {0}")]
    InvalidUploadType(String),

    /// Unreadable or empty CSV (400)
    #[error("{0}")]
    Parse(String),

    /// Identifier column missing (400)
    #[error("{0}")]
    Schema(String),

    /// No rows left to classify (400)
    #[error("{0}")]
    EmptyResult(String),

    /// Upload exceeds the configured body limit (413)
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    /// Startup never produced a model (503)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Unexpected failure while scaling or scoring (500)
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUploadType(_)
            | ApiError::Parse(_)
            | ApiError::Schema(_)
            | ApiError::EmptyResult(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Analysis(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidUploadType(_) => "INVALID_UPLOAD_TYPE",
            ApiError::Parse(_) => "PARSE_ERROR",
            ApiError::Schema(_) => "SCHEMA_ERROR",
            ApiError::EmptyResult(_) => "EMPTY_RESULT",
            ApiError::UploadTooLarge(_) => "UPLOAD_TOO_LARGE",
            ApiError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            ApiError::Analysis(_) => "ANALYSIS_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Ingest(IngestError::Parse(msg)) => ApiError::Parse(msg),
            AnalysisError::Ingest(IngestError::Schema(msg)) => ApiError::Schema(msg),
            AnalysisError::Ingest(IngestError::Io(e)) => ApiError::Internal(e.to_string()),
            AnalysisError::Scoring(e) => ApiError::Analysis(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
