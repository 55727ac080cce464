//! CSV ingestion and normalization
//!
//! Uploaded bytes flow through: decode → strip comments → detect delimiter →
//! load table → reconcile against the feature schema. Each stage is a plain
//! function so the HTTP handler, the offline analyzer and the trainer share
//! the same path.

pub mod comments;
pub mod dialect;
pub mod loader;
pub mod reconcile;

pub use comments::strip_comments;
pub use dialect::{delimiter_or_default, detect_delimiter, DetectError};
pub use loader::{load_table, CandidateTable, LoadReport};
pub use reconcile::{reconcile, FeatureMatrix, ReconcileReport};

use std::path::PathBuf;
use thiserror::Error;

/// Ingestion errors surfaced to callers
#[derive(Debug, Error)]
pub enum IngestError {
    /// Unreadable or empty table
    #[error("Parse error: {0}")]
    Parse(String),

    /// Required identifier column absent
    #[error("Schema error: {0}")]
    Schema(String),

    /// Source file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where CSV text comes from
///
/// Resolved by the caller; the loader never guesses from content.
#[derive(Debug, Clone)]
pub enum CsvSource {
    /// A file on local disk
    FilePath(PathBuf),
    /// Text already held in memory (e.g. a decoded upload)
    InMemoryText(String),
}

impl CsvSource {
    /// Resolve the source to decoded text
    pub fn into_text(self) -> Result<String, IngestError> {
        match self {
            CsvSource::FilePath(path) => {
                let bytes = std::fs::read(&path)?;
                Ok(decode_text(&bytes))
            }
            CsvSource::InMemoryText(text) => Ok(text),
        }
    }
}

/// Decode raw bytes as text
///
/// Tries UTF-8 first (dropping a leading BOM) and falls back to ISO-8859-1,
/// where every byte maps to the code point of the same value.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("Upload is not valid UTF-8, decoding as ISO-8859-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse text into a table using the sniffed dialect
///
/// Comments are stripped first so archive metadata headers never reach the
/// dialect detector.
pub fn parse_candidates(
    text: &str,
    schema: &exo_common::FeatureSchema,
) -> Result<(CandidateTable, LoadReport), IngestError> {
    let cleaned = strip_comments(text);
    let delimiter = delimiter_or_default(dialect::sample(&cleaned));
    tracing::debug!(delimiter = %(delimiter as char).escape_default(), "Detected delimiter");
    load_table(&cleaned, delimiter, schema)
}
