//! Status and health endpoints
//!
//! Both always answer 200; model availability is reported in the body.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// GET / response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" with a model, "degraded" without
    pub status: String,
    pub module: String,
    pub version: String,
    pub model_loaded: bool,
    /// Seconds since service started
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Held-out accuracy in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Why startup did not produce a model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

/// GET /
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let model_loaded = state.model.is_ready();
    let message = if model_loaded {
        "Exoplanet classification API is running"
    } else {
        "Exoplanet classification API is running without a model"
    };

    Json(StatusResponse {
        status: "online".to_string(),
        message: message.to_string(),
        model_loaded,
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let artifact = state.model.ready();
    Json(HealthResponse {
        status: if artifact.is_some() { "ok" } else { "degraded" }.to_string(),
        module: "exo-predict".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: artifact.is_some(),
        uptime_seconds,
        model_version: artifact.map(|a| a.metrics.model_version.clone()),
        accuracy: artifact.map(|a| a.metrics.accuracy),
        unavailable_reason: state.model.unavailable_reason().map(str::to_string),
    })
}

/// Build status and health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
}
