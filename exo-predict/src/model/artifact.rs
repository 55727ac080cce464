//! Model artifact: classifier + scaler + feature list as one unit
//!
//! Persisted as three JSON files in the artifact directory. Files are written
//! once after training (temp file + rename) and only read afterwards.

use super::dataset::TrainingSet;
use super::gbdt::{BoostingParams, GradientBoostedClassifier};
use super::split::{stratified_split, SPLIT_SEED, TEST_FRACTION};
use super::{accuracy, score_matrix, ModelError, ProbabilityModel, StandardScaler};
use crate::ingest::FeatureMatrix;
use chrono::{DateTime, Utc};
use exo_common::FeatureSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_FILE: &str = "exoplanet_model.json";
pub const SCALER_FILE: &str = "exoplanet_scaler.json";
pub const FEATURES_FILE: &str = "exoplanet_features.json";

/// Training run settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub boosting: BoostingParams,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            boosting: BoostingParams::default(),
            test_fraction: TEST_FRACTION,
            seed: SPLIT_SEED,
        }
    }
}

/// Held-out evaluation and provenance of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Accuracy on the held-out partition, in [0, 1]
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub trained_at: DateTime<Utc>,
    pub model_version: String,
}

/// Contents of the model file
#[derive(Debug, Serialize, Deserialize)]
struct PersistedModel {
    classifier: GradientBoostedClassifier,
    metrics: TrainingMetrics,
}

/// Locations of the three artifact files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
            features: dir.join(FEATURES_FILE),
        }
    }

    /// True only when all three files are present
    pub fn all_exist(&self) -> bool {
        self.model.exists() && self.scaler.exists() && self.features.exists()
    }

    pub fn any_exist(&self) -> bool {
        self.model.exists() || self.scaler.exists() || self.features.exists()
    }
}

/// Immutable trained model shared read-only by every request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub classifier: GradientBoostedClassifier,
    pub scaler: StandardScaler,
    pub features: Vec<String>,
    pub metrics: TrainingMetrics,
}

impl ModelArtifact {
    /// Split, fit the scaler on the train partition, fit the classifier on the
    /// scaled train partition and measure held-out accuracy
    pub fn train(
        set: &TrainingSet,
        schema: &FeatureSchema,
        params: &TrainingParams,
    ) -> Result<Self, ModelError> {
        let width = match set.rows.first() {
            Some(row) => row.len(),
            None => return Err(ModelError::Training("empty training set".to_string())),
        };
        if width != schema.len() {
            return Err(ModelError::FeatureMismatch {
                expected: schema.len(),
                found: width,
            });
        }

        let partition = stratified_split(&set.labels, params.test_fraction, params.seed);
        let (train_rows, train_labels) = set.select(&partition.train);
        let (test_rows, test_labels) = set.select(&partition.test);
        info!(
            train = train_rows.len(),
            test = test_rows.len(),
            "Training gradient-boosted classifier"
        );

        let scaler = StandardScaler::fit(&train_rows)?;
        let classifier = GradientBoostedClassifier::fit(
            &scaler.transform(&train_rows),
            &train_labels,
            &params.boosting,
        )?;

        let accuracy = accuracy(&classifier, &scaler.transform(&test_rows), &test_labels);
        info!("Held-out accuracy: {:.2}%", accuracy * 100.0);

        let model_version = format!("{}-{}", classifier.family(), env!("CARGO_PKG_VERSION"));
        Ok(Self {
            classifier,
            scaler,
            features: schema.feature_list(),
            metrics: TrainingMetrics {
                accuracy,
                train_samples: train_rows.len(),
                test_samples: test_rows.len(),
                trained_at: exo_common::time::now(),
                model_version,
            },
        })
    }

    /// Load all three files and check the feature list against the schema
    pub fn load(paths: &ArtifactPaths, schema: &FeatureSchema) -> Result<Self, ModelError> {
        let persisted: PersistedModel = read_json(&paths.model)?;
        let scaler: StandardScaler = read_json(&paths.scaler)?;
        let features: Vec<String> = read_json(&paths.features)?;

        if !schema.matches(&features) {
            return Err(ModelError::SchemaMismatch);
        }
        if scaler.width() != features.len() || persisted.classifier.n_features() != features.len()
        {
            return Err(ModelError::FeatureMismatch {
                expected: features.len(),
                found: scaler.width(),
            });
        }
        persisted.classifier.check_structure()?;

        Ok(Self {
            classifier: persisted.classifier,
            scaler,
            features,
            metrics: persisted.metrics,
        })
    }

    /// Write all three files
    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), ModelError> {
        let persisted = PersistedModel {
            classifier: self.classifier.clone(),
            metrics: self.metrics.clone(),
        };
        write_json(&paths.model, &persisted)?;
        write_json(&paths.scaler, &self.scaler)?;
        write_json(&paths.features, &self.features)?;
        info!(dir = %paths.model.parent().unwrap_or(Path::new(".")).display(), "Model artifacts saved");
        Ok(())
    }

    /// Confidence per reconciled row
    pub fn score(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        score_matrix(&self.classifier, &self.scaler, matrix)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
