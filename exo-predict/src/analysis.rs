//! Upload analysis: ingest → reconcile → score → verdicts
//!
//! Synchronous and CPU-bound; the HTTP handler runs it on the blocking pool.

use crate::ingest::{parse_candidates, reconcile, CsvSource, IngestError, LoadReport, ReconcileReport};
use crate::model::{ModelArtifact, ModelError};
use crate::verdict::{assemble, PredictionRecord, Verdict};
use exo_common::FeatureSchema;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ModelError),
}

/// Result of one analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<PredictionRecord>,
    pub load: LoadReport,
    pub reconcile: ReconcileReport,
}

/// Classify every candidate in `source`
pub fn analyze(
    source: CsvSource,
    artifact: &ModelArtifact,
    schema: &FeatureSchema,
) -> Result<Analysis, AnalysisError> {
    let text = source.into_text()?;
    let (table, load) = parse_candidates(&text, schema)?;
    debug!(
        rows = table.row_count(),
        skipped = load.skipped_rows,
        "Upload parsed"
    );

    let (matrix, reconcile) = reconcile(&table, schema)?;
    let scores = artifact.score(&matrix)?;
    let records = assemble(matrix.ids(), &scores);

    info!(
        candidates = records.len(),
        confirmed = records
            .iter()
            .filter(|r| r.verdict == Verdict::Confirmed)
            .count(),
        "Analysis complete"
    );

    Ok(Analysis {
        records,
        load,
        reconcile,
    })
}
