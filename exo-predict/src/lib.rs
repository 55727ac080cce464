//! exo-predict library - Exoplanet candidate classification service
//!
//! Accepts CSV uploads of Kepler Objects of Interest, reconciles them against
//! the fixed feature schema and classifies each candidate as a confirmed
//! planet or a false positive with a trained gradient-boosted model.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use exo_common::FeatureSchema;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod verdict;

pub use error::{ApiError, ApiResult};
use model::ModelState;

/// Application state shared across HTTP handlers
///
/// Built once at startup; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    /// Loaded model, or why there is none
    pub model: Arc<ModelState>,
    pub schema: FeatureSchema,
    /// Server startup timestamp (for uptime calculation)
    pub startup_time: DateTime<Utc>,
    /// Request body cap for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(model: ModelState, schema: FeatureSchema, max_upload_bytes: usize) -> Self {
        Self {
            model: Arc::new(model),
            schema,
            startup_time: exo_common::time::now(),
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::health_routes())
        .merge(api::predict_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
