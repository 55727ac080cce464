//! Train → persist → reload → classify, through the public API

mod helpers;

use axum::http::StatusCode;
use exo_common::FeatureSchema;
use exo_predict::analysis::analyze;
use exo_predict::ingest::CsvSource;
use exo_predict::model::orchestrator::initialize;
use exo_predict::model::{ArtifactPaths, ModelSettings, TrainingParams};
use exo_predict::verdict::Verdict;
use exo_predict::{build_router, AppState};
use helpers::{body_json, multipart_request, write_training_csv, FULL_HEADER, K99999_01, K99999_02};
use tower::ServiceExt;

fn settings(root: &std::path::Path) -> ModelSettings {
    ModelSettings {
        artifact_dir: root.join("artifacts"),
        dataset_path: root.join("cumulative_koi.csv"),
        dataset_url: "http://127.0.0.1:9/unreachable.csv".to_string(),
        training: helpers::fixtures::quick_params(),
    }
}

#[tokio::test]
async fn test_startup_trains_then_restart_loads() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    write_training_csv(&settings.dataset_path, 80);

    let first = initialize(&settings, FeatureSchema::kepler()).await;
    let trained = first.ready().expect("trained on local dataset").clone();
    assert!(ArtifactPaths::in_dir(&settings.artifact_dir).all_exist());
    assert_eq!(
        trained.metrics.train_samples + trained.metrics.test_samples,
        80
    );

    // Second start must not need the dataset
    std::fs::remove_file(&settings.dataset_path).unwrap();
    let second = initialize(&settings, FeatureSchema::kepler()).await;
    let loaded = second.ready().expect("loaded from artifacts");
    assert_eq!(loaded.metrics, trained.metrics);
    assert_eq!(loaded.features, FeatureSchema::kepler().feature_list());
}

#[tokio::test]
async fn test_unreachable_dataset_leaves_service_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let state = initialize(&settings, FeatureSchema::kepler()).await;
    assert!(!state.is_ready());

    let app = build_router(AppState::new(state, FeatureSchema::kepler(), 1024 * 1024));
    let csv = format!("{}\n{}\n", FULL_HEADER, K99999_01);
    let response = app
        .oneshot(multipart_request("file", "koi.csv", "text/csv", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_trained_model_serves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    write_training_csv(&settings.dataset_path, 80);
    let state = initialize(&settings, FeatureSchema::kepler()).await;

    let app = build_router(AppState::new(state, FeatureSchema::kepler(), 1024 * 1024));
    let csv = format!("{}\n{}\n{}\n", FULL_HEADER, K99999_01, K99999_02);
    let response = app
        .oneshot(multipart_request("file", "candidates.csv", "text/csv", csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["metadata"]["totalSamples"], 2);
    assert_eq!(body["filename"], "predicoes_candidates.csv");
}

#[tokio::test]
async fn test_offline_analysis_of_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("candidates.csv");
    std::fs::write(
        &input,
        format!("# two candidates\n{}\n{}\n{}\n", FULL_HEADER, K99999_01, K99999_02),
    )
    .unwrap();

    let artifact = helpers::trained_artifact();
    let analysis = analyze(
        CsvSource::FilePath(input),
        &artifact,
        &FeatureSchema::kepler(),
    )
    .unwrap();

    assert_eq!(analysis.records.len(), 2);
    assert_eq!(analysis.records[0].verdict, Verdict::Confirmed);
    assert_eq!(analysis.records[1].verdict, Verdict::FalsePositive);
    assert!(analysis.reconcile.is_clean());
    assert_eq!(analysis.load.skipped_rows, 0);
}

#[test]
fn test_default_training_params() {
    let params = TrainingParams::default();
    assert_eq!(params.test_fraction, 0.3);
    assert_eq!(params.seed, 42);
    assert_eq!(params.boosting.n_estimators, 100);
    assert_eq!(params.boosting.max_depth, 6);
}
