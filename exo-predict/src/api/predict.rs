//! Candidate classification endpoint
//!
//! POST /predict takes a multipart upload with one CSV file and returns the
//! per-candidate verdicts plus an annotated copy of the CSV.

use axum::extract::multipart::{Field, Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, warn};

use crate::analysis::analyze;
use crate::error::{ApiError, ApiResult};
use crate::ingest::{decode_text, CsvSource};
use crate::verdict::{build_response, ModelInfo, PredictResponse};
use crate::AppState;

/// Preferred multipart field name
pub const FILE_FIELD: &str = "file";

/// MIME types browsers and clients send for CSV files
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["text/csv", "application/vnd.ms-excel", "text/plain"];

/// A received upload
#[derive(Debug)]
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Accept `.csv` by extension or a CSV-like declared MIME type
pub fn is_csv_like(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_extension = filename
        .map(|name| name.trim().to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);

    let by_mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            ALLOWED_CONTENT_TYPES.contains(&mime.as_str())
        })
        .unwrap_or(false);

    by_extension || by_mime
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let artifact = match state.model.ready() {
        Some(artifact) => artifact.clone(),
        None => {
            return Err(ApiError::ModelUnavailable(
                state
                    .model
                    .unavailable_reason()
                    .unwrap_or("model not loaded")
                    .to_string(),
            ))
        }
    };

    let multipart = multipart.map_err(|rejection| {
        ApiError::Parse(format!("Expected a multipart upload: {}", rejection.body_text()))
    })?;
    let upload = read_upload(multipart).await?;
    if !is_csv_like(upload.filename.as_deref(), upload.content_type.as_deref()) {
        return Err(ApiError::InvalidUploadType(format!(
            "expected a .csv file (got {} / {})",
            upload.filename.as_deref().unwrap_or("unnamed"),
            upload.content_type.as_deref().unwrap_or("no content type"),
        )));
    }
    info!(
        filename = upload.filename.as_deref().unwrap_or("unnamed"),
        bytes = upload.bytes.len(),
        "Received upload"
    );

    let schema = state.schema;
    let worker_artifact = artifact.clone();
    let bytes = upload.bytes;
    let analysis = tokio::task::spawn_blocking(move || {
        let source = CsvSource::InMemoryText(decode_text(&bytes));
        analyze(source, &worker_artifact, &schema)
    })
    .await
    .map_err(|e| ApiError::Analysis(format!("analysis task failed: {}", e)))??;

    if analysis.records.is_empty() {
        return Err(ApiError::EmptyResult(
            "No candidates left to classify after cleaning".to_string(),
        ));
    }
    if analysis.load.skipped_rows > 0 {
        warn!(skipped = analysis.load.skipped_rows, "Malformed rows skipped");
    }

    let model = ModelInfo {
        version: artifact.metrics.model_version.clone(),
        accuracy: artifact.metrics.accuracy,
    };
    let response = build_response(
        &analysis.records,
        &model,
        upload.filename.as_deref(),
        exo_common::time::now(),
    )
    .map_err(|e| ApiError::Internal(format!("failed to render CSV: {}", e)))?;

    Ok(Json(response))
}

/// Take the `file` field, or the first field carrying a filename
async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Malformed multipart body"))?
    {
        if field.name() == Some(FILE_FIELD) || field.file_name().is_some() {
            return collect_field(field).await;
        }
    }

    Err(ApiError::InvalidUploadType(
        "no file field in upload".to_string(),
    ))
}

async fn collect_field(field: Field<'_>) -> ApiResult<Upload> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, "Failed to read upload"))?;

    Ok(Upload {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn multipart_error(err: MultipartError, context: &str) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge(err.body_text())
    } else {
        ApiError::Parse(format!("{}: {}", context, err.body_text()))
    }
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_extension_accepted() {
        assert!(is_csv_like(Some("koi.csv"), None));
        assert!(is_csv_like(Some("KOI.CSV"), Some("application/octet-stream")));
    }

    #[test]
    fn test_csv_mime_accepted() {
        assert!(is_csv_like(Some("data"), Some("text/csv")));
        assert!(is_csv_like(None, Some("text/plain; charset=utf-8")));
        assert!(is_csv_like(Some("export.xls"), Some("application/vnd.ms-excel")));
    }

    #[test]
    fn test_other_uploads_rejected() {
        assert!(!is_csv_like(Some("image.png"), Some("image/png")));
        assert!(!is_csv_like(None, None));
        assert!(!is_csv_like(Some("koi.csv.gz"), Some("application/gzip")));
    }
}
