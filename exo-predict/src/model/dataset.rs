//! Labeled training dataset
//!
//! The KOI cumulative table from the NASA Exoplanet Archive: one row per
//! Kepler Object of Interest, with a disposition label and the schema features.

use super::ModelError;
use crate::ingest::{parse_candidates, CandidateTable, CsvSource};
use exo_common::schema::{parse_feature_cell, LABEL_COLUMN, NEGATIVE_LABEL, POSITIVE_LABEL};
use exo_common::FeatureSchema;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!("exo-predict/", env!("CARGO_PKG_VERSION"));

/// Whole-download timeout for the archive export
const FETCH_TIMEOUT_SECS: u64 = 300;

/// Feature rows with 0/1 targets (1 = confirmed planet)
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl TrainingSet {
    /// Keep rows labeled confirmed / false positive with every feature present
    pub fn from_labeled_table(
        table: &CandidateTable,
        schema: &FeatureSchema,
    ) -> Result<Self, ModelError> {
        let label_idx = table.column_index(LABEL_COLUMN).ok_or_else(|| {
            ModelError::Training(format!("dataset has no '{}' column", LABEL_COLUMN))
        })?;

        let feature_idx = schema
            .features()
            .iter()
            .map(|f| {
                table
                    .column_index(f)
                    .ok_or_else(|| ModelError::Training(format!("dataset has no '{}' column", f)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut unlabeled = 0usize;
        let mut incomplete = 0usize;

        for record in table.rows() {
            let label = match record[label_idx].as_str() {
                POSITIVE_LABEL => 1.0,
                NEGATIVE_LABEL => 0.0,
                _ => {
                    unlabeled += 1;
                    continue;
                }
            };

            let values: Option<Vec<f64>> = feature_idx
                .iter()
                .map(|&idx| parse_feature_cell(&record[idx]).ok().flatten())
                .collect();

            match values {
                Some(values) => {
                    rows.push(values);
                    labels.push(label);
                }
                None => incomplete += 1,
            }
        }

        info!(
            samples = rows.len(),
            features = schema.len(),
            unlabeled,
            incomplete,
            "Training data prepared"
        );

        if rows.is_empty() {
            return Err(ModelError::Training(
                "no labeled rows with complete features".to_string(),
            ));
        }

        Ok(Self { rows, labels })
    }

    /// Read, clean and filter a dataset file
    pub fn load(path: &Path, schema: &FeatureSchema) -> Result<Self, ModelError> {
        let text = CsvSource::FilePath(path.to_path_buf()).into_text()?;
        let (table, _) = parse_candidates(&text, schema)?;
        Self::from_labeled_table(&table, schema)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Subset by row index
    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        (rows, labels)
    }
}

/// Download the dataset to `dest`
///
/// Not retried; any transport or HTTP status failure is returned as-is.
pub async fn fetch_dataset(url: &str, dest: &Path) -> Result<(), ModelError> {
    info!(url, dest = %dest.display(), "Fetching training dataset");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| ModelError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ModelError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ModelError::Fetch(format!("HTTP {} from {}", status, url)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ModelError::Fetch(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = dest.with_extension("download");
    tokio::fs::write(&partial, &body).await?;
    tokio::fs::rename(&partial, dest).await?;

    info!(bytes = body.len(), "Training dataset saved");
    Ok(())
}
