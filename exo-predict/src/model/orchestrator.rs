//! Startup model initialization
//!
//! Runs once before the server accepts requests:
//! 1. All three persisted artifacts present → load them
//! 2. Otherwise fetch the labeled dataset if there is no local copy
//! 3. Filter, split, fit scaler + classifier
//! 4. Persist the artifacts
//!
//! Any failure leaves the service `Unloaded` until restart; there is no retry.

use super::{ArtifactPaths, ModelArtifact, ModelError, TrainingParams, TrainingSet};
use crate::model::dataset::fetch_dataset;
use exo_common::FeatureSchema;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the orchestrator looks for and puts things
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub artifact_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub dataset_url: String,
    pub training: TrainingParams,
}

/// Process-wide model availability, fixed after startup
#[derive(Debug, Clone)]
pub enum ModelState {
    Unloaded { reason: String },
    Ready(Arc<ModelArtifact>),
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }

    /// The artifact, if training or loading succeeded
    pub fn ready(&self) -> Option<&Arc<ModelArtifact>> {
        match self {
            ModelState::Ready(artifact) => Some(artifact),
            ModelState::Unloaded { .. } => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            ModelState::Ready(_) => None,
            ModelState::Unloaded { reason } => Some(reason),
        }
    }
}

impl From<ModelArtifact> for ModelState {
    fn from(artifact: ModelArtifact) -> Self {
        ModelState::Ready(Arc::new(artifact))
    }
}

/// Load or train the model; never fails outward
pub async fn initialize(settings: &ModelSettings, schema: FeatureSchema) -> ModelState {
    match load_or_train(settings, schema).await {
        Ok(artifact) => {
            info!(
                version = %artifact.metrics.model_version,
                accuracy = artifact.metrics.accuracy,
                "Model ready"
            );
            ModelState::from(artifact)
        }
        Err(e) => {
            error!("Model initialization failed, predictions disabled: {}", e);
            ModelState::Unloaded {
                reason: e.to_string(),
            }
        }
    }
}

async fn load_or_train(
    settings: &ModelSettings,
    schema: FeatureSchema,
) -> Result<ModelArtifact, ModelError> {
    let paths = ArtifactPaths::in_dir(&settings.artifact_dir);

    if paths.all_exist() {
        info!(dir = %settings.artifact_dir.display(), "Model and scaler found, loading from disk");
        return run_blocking(move || ModelArtifact::load(&paths, &schema)).await;
    }
    if paths.any_exist() {
        warn!("Incomplete model artifacts on disk, retraining");
    }

    if !settings.dataset_path.exists() {
        fetch_dataset(&settings.dataset_url, &settings.dataset_path).await?;
    }

    let dataset_path = settings.dataset_path.clone();
    let params = settings.training.clone();
    run_blocking(move || {
        let set = TrainingSet::load(&dataset_path, &schema)?;
        let artifact = ModelArtifact::train(&set, &schema, &params)?;
        artifact.save(&paths)?;
        Ok(artifact)
    })
    .await
}

/// Run CPU/disk-bound work off the async runtime
async fn run_blocking<T, F>(work: F) -> Result<T, ModelError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ModelError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ModelError::Training(format!("model task aborted: {}", e)))?
}
