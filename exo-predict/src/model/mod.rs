//! Scaling + classification capability
//!
//! The analysis path only talks to [`ProbabilityModel`] and
//! [`StandardScaler`]; the boosted-tree implementation behind it can be
//! swapped without touching ingestion or verdict assembly.

pub mod artifact;
pub mod dataset;
pub mod gbdt;
pub mod orchestrator;
pub mod scaler;
pub mod split;

pub use artifact::{ArtifactPaths, ModelArtifact, TrainingMetrics, TrainingParams};
pub use dataset::TrainingSet;
pub use gbdt::{BoostingParams, GradientBoostedClassifier};
pub use orchestrator::{ModelSettings, ModelState};
pub use scaler::StandardScaler;

use crate::ingest::{FeatureMatrix, IngestError};
use thiserror::Error;

/// Model lifecycle errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Feature mismatch: expected {expected} features, found {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Persisted feature list does not match the deployed schema")]
    SchemaMismatch,

    #[error("Corrupt model file: {0}")]
    CorruptModel(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Dataset fetch failed: {0}")]
    Fetch(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] IngestError),
}

/// Anything that turns one scaled feature row into P(confirmed)
pub trait ProbabilityModel: Send + Sync {
    /// Probability of the positive class, in [0, 1]
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Short family name used in the reported model version
    fn family(&self) -> &'static str;
}

/// Scale every row with the training-time scaler and score it
pub fn score_matrix(
    model: &dyn ProbabilityModel,
    scaler: &StandardScaler,
    matrix: &FeatureMatrix,
) -> Result<Vec<f64>, ModelError> {
    if matrix.columns().len() != scaler.width() {
        return Err(ModelError::FeatureMismatch {
            expected: scaler.width(),
            found: matrix.columns().len(),
        });
    }

    Ok(matrix
        .rows()
        .iter()
        .map(|row| model.predict_proba(&scaler.transform_row(row)))
        .collect())
}

/// Share of rows where the thresholded prediction equals the label
pub fn accuracy(model: &dyn ProbabilityModel, rows: &[Vec<f64>], labels: &[f64]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows
        .iter()
        .zip(labels)
        .filter(|(row, &label)| {
            let predicted = if model.predict_proba(row) > 0.5 { 1.0 } else { 0.0 };
            predicted == label
        })
        .count();
    correct as f64 / rows.len() as f64
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{BoostingParams, TrainingParams, TrainingSet};

    /// Confirmed candidates have a short period, a shallow transit and no
    /// stellar-eclipse flag; false positives the opposite
    pub(crate) fn synthetic_set(n: usize) -> TrainingSet {
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let confirmed = i % 2 == 0;
            let jitter = (i % 7) as f64;
            let mut row = vec![0.0; 15];
            row[0] = if confirmed { 5.0 + jitter } else { 120.0 + jitter * 10.0 };
            row[2] = if confirmed { 500.0 + jitter } else { 15000.0 };
            row[9] = if confirmed { 0.0 } else { 1.0 };
            row[12] = 5500.0 + jitter * 20.0;
            rows.push(row);
            labels.push(if confirmed { 1.0 } else { 0.0 });
        }
        TrainingSet { rows, labels }
    }

    pub(crate) fn quick_params() -> TrainingParams {
        TrainingParams {
            boosting: BoostingParams {
                n_estimators: 10,
                max_depth: 3,
                ..BoostingParams::default()
            },
            ..TrainingParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{load_table, reconcile};
    use exo_common::FeatureSchema;

    /// Scores the first scaled feature through a sigmoid
    struct FirstFeature;

    impl ProbabilityModel for FirstFeature {
        fn predict_proba(&self, features: &[f64]) -> f64 {
            1.0 / (1.0 + (-features[0]).exp())
        }

        fn family(&self) -> &'static str {
            "first-feature"
        }
    }

    #[test]
    fn test_score_matrix_applies_scaler() {
        let schema = FeatureSchema::kepler();
        let table = load_table("kepoi_name,koi_period\nK1,1\nK2,3\n", b',', &schema)
            .unwrap()
            .0;
        let (matrix, _) = reconcile(&table, &schema).unwrap();
        let scaler = StandardScaler::fit(matrix.rows()).unwrap();

        let scores = score_matrix(&FirstFeature, &scaler, &matrix).unwrap();
        // Scaled period is -1 and +1
        assert!((scores[0] - 1.0 / (1.0 + 1f64.exp())).abs() < 1e-12);
        assert!(scores[1] > 0.5);
    }

    #[test]
    fn test_score_matrix_rejects_width_mismatch() {
        let schema = FeatureSchema::kepler();
        let table = load_table("kepoi_name,koi_period\nK1,1\n", b',', &schema)
            .unwrap()
            .0;
        let (matrix, _) = reconcile(&table, &schema).unwrap();
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();

        let result = score_matrix(&FirstFeature, &scaler, &matrix);
        assert!(matches!(
            result,
            Err(ModelError::FeatureMismatch { expected: 2, found: 15 })
        ));
    }

    #[test]
    fn test_accuracy() {
        let rows = vec![vec![2.0], vec![-2.0], vec![3.0], vec![0.0]];
        let labels = vec![1.0, 0.0, 0.0, 0.0];
        // Third row is wrong; 0.0 maps to exactly 0.5, a negative
        assert_eq!(accuracy(&FirstFeature, &rows, &labels), 0.75);
        assert_eq!(accuracy(&FirstFeature, &[], &[]), 0.0);
    }
}
