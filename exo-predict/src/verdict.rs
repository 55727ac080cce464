//! Verdict assembly and response rendering
//!
//! Turns identifiers + confidence scores into per-candidate records, the JSON
//! prediction list and the annotated CSV returned to the client.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores strictly above this are confirmed planets
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Header of the annotated CSV
pub const CSV_HEADER: [&str; 3] = ["kepoi_name", "Confianca_Calculada", "Veredito_do_Modelo"];

const FILENAME_PREFIX: &str = "predicoes_";
const FALLBACK_FILENAME: &str = "upload.csv";

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    FalsePositive,
}

impl Verdict {
    /// Strict threshold: exactly 0.5 is a false positive
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > CONFIDENCE_THRESHOLD {
            Verdict::Confirmed
        } else {
            Verdict::FalsePositive
        }
    }

    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "confirmed",
            Verdict::FalsePositive => "false_positive",
        }
    }

    /// Display label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "Planeta Confirmado",
            Verdict::FalsePositive => "Falso Positivo",
        }
    }
}

/// One classified candidate
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub identifier: String,
    pub confidence: f64,
    pub verdict: Verdict,
}

impl PredictionRecord {
    pub fn new(identifier: impl Into<String>, confidence: f64) -> Self {
        Self {
            identifier: identifier.into(),
            confidence,
            verdict: Verdict::from_confidence(confidence),
        }
    }

    pub fn percent(&self) -> Option<f64> {
        confidence_percent(self.confidence)
    }
}

/// Pair identifiers with scores, preserving input order
pub fn assemble(ids: &[String], scores: &[f64]) -> Vec<PredictionRecord> {
    ids.iter()
        .zip(scores)
        .map(|(id, &score)| PredictionRecord::new(id.clone(), score))
        .collect()
}

/// Confidence as a percentage rounded to 2 decimal places
///
/// Non-finite scores give `None` instead of failing the batch.
pub fn confidence_percent(confidence: f64) -> Option<f64> {
    let percent = (confidence * 100.0 * 100.0).round() / 100.0;
    percent.is_finite().then_some(percent)
}

/// Entry of the `predictions` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// 1-based position in the upload
    pub id: usize,
    pub name: String,
    pub percent: Option<f64>,
    pub status: String,
}

/// Batch metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub total_samples: usize,
    pub processed_at: String,
    pub model_version: String,
    /// Held-out accuracy, in percent
    pub accuracy: f64,
}

/// Successful `/predict` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<PredictionEntry>,
    pub metadata: ResponseMetadata,
    pub csv_base64: String,
    pub filename: String,
}

/// Model facts echoed in the metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub version: String,
    /// Held-out accuracy in [0, 1]
    pub accuracy: f64,
}

pub fn prediction_entries(records: &[PredictionRecord]) -> Vec<PredictionEntry> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| PredictionEntry {
            id: i + 1,
            name: record.identifier.clone(),
            percent: record.percent(),
            status: record.verdict.label().to_string(),
        })
        .collect()
}

/// Annotated CSV: identifier, raw confidence in [0, 1], verdict label
pub fn render_csv(records: &[PredictionRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        let confidence = if record.confidence.is_finite() {
            record.confidence.to_string()
        } else {
            String::new()
        };
        writer.write_record([
            record.identifier.as_str(),
            confidence.as_str(),
            record.verdict.label(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Suggested download name for the annotated CSV
pub fn output_filename(original: Option<&str>) -> String {
    let name = original
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILENAME);
    format!("{}{}", FILENAME_PREFIX, name)
}

/// Assemble the full response body
pub fn build_response(
    records: &[PredictionRecord],
    model: &ModelInfo,
    original_filename: Option<&str>,
    processed_at: DateTime<Utc>,
) -> Result<PredictResponse, csv::Error> {
    let csv = render_csv(records)?;
    Ok(PredictResponse {
        predictions: prediction_entries(records),
        metadata: ResponseMetadata {
            total_samples: records.len(),
            processed_at: exo_common::time::iso8601_utc(processed_at),
            model_version: model.version.clone(),
            accuracy: confidence_percent(model.accuracy).unwrap_or(0.0),
        },
        csv_base64: STANDARD.encode(csv),
        filename: output_filename(original_filename),
    })
}
