//! Trained models and CSV fixtures

use exo_common::FeatureSchema;
use exo_predict::model::{BoostingParams, ModelArtifact, ModelState, TrainingParams, TrainingSet};
use exo_predict::AppState;
use std::path::Path;

/// Upload header with the identifier and all 15 features
pub const FULL_HEADER: &str = "kepoi_name,koi_period,koi_duration,koi_depth,koi_prad,koi_teq,koi_insol,koi_model_snr,koi_impact,koi_fpflag_nt,koi_fpflag_ss,koi_fpflag_co,koi_fpflag_ec,koi_steff,koi_slogg,koi_srad";

/// Short-period, shallow-transit candidate
pub const K99999_01: &str = "K99999.01,10.5,3.0,800.0,2.5,750,80.0,40.0,0.5,0,0,0,0,5800,4.4,1.0";

/// Long-period, deep-transit candidate with the stellar-eclipse flag set
pub const K99999_02: &str = "K99999.02,150.2,10.0,20000.0,45.0,1000,20.0,15.0,0.9,0,1,0,0,5800,4.4,1.0";

pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

/// Separable labeled rows: confirmed planets have short periods and shallow
/// transits, false positives long periods, deep transits and the SS flag
pub fn labeled_rows(n: usize) -> TrainingSet {
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let confirmed = i % 2 == 0;
        let jitter = (i % 5) as f64;
        let row = if confirmed {
            vec![
                8.0 + jitter, 3.0, 700.0 + jitter * 20.0, 2.0, 700.0, 90.0, 35.0, 0.4,
                0.0, 0.0, 0.0, 0.0, 5700.0 + jitter * 10.0, 4.4, 1.0,
            ]
        } else {
            vec![
                140.0 + jitter * 5.0, 9.0, 18000.0 + jitter * 500.0, 40.0, 1100.0, 25.0, 12.0,
                0.95, 0.0, 1.0, 0.0, 0.0, 5700.0 + jitter * 10.0, 4.4, 1.0,
            ]
        };
        rows.push(row);
        labels.push(if confirmed { 1.0 } else { 0.0 });
    }
    TrainingSet { rows, labels }
}

pub fn quick_params() -> TrainingParams {
    TrainingParams {
        boosting: BoostingParams {
            n_estimators: 15,
            max_depth: 3,
            ..BoostingParams::default()
        },
        ..TrainingParams::default()
    }
}

/// Small model trained in-process
pub fn trained_artifact() -> ModelArtifact {
    ModelArtifact::train(&labeled_rows(60), &FeatureSchema::kepler(), &quick_params())
        .expect("training on fixture rows")
}

pub fn loaded_state() -> AppState {
    AppState::new(
        ModelState::from(trained_artifact()),
        FeatureSchema::kepler(),
        TEST_UPLOAD_LIMIT,
    )
}

pub fn unloaded_state() -> AppState {
    AppState::new(
        ModelState::Unloaded {
            reason: "Dataset fetch failed: connection refused".to_string(),
        },
        FeatureSchema::kepler(),
        TEST_UPLOAD_LIMIT,
    )
}

/// Labeled dataset in the archive export layout (comment preamble included)
pub fn write_training_csv(path: &Path, n: usize) {
    let set = labeled_rows(n);
    let features = FeatureSchema::kepler().features().join(",");
    let mut text = String::from("# This file was produced by the NASA Exoplanet Archive\n");
    text.push_str(&format!("kepoi_name,koi_disposition,{}\n", features));
    for (i, (row, label)) in set.rows.iter().zip(&set.labels).enumerate() {
        let disposition = if *label == 1.0 { "CONFIRMED" } else { "FALSE POSITIVE" };
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        text.push_str(&format!("K{:05}.01,{},{}\n", i + 1, disposition, values.join(",")));
    }
    // Unlabeled candidates are filtered out of training
    text.push_str("K99998.01,CANDIDATE,1,1,1,1,1,1,1,1,0,0,0,0,1,1,1\n");
    std::fs::write(path, text).expect("write training csv");
}
