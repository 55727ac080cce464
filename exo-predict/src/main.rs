//! exo-predict - Exoplanet candidate classification service
//!
//! Startup sequence:
//! 1. Parse CLI/ENV, load the TOML bootstrap file
//! 2. Initialize tracing
//! 3. Load or train the model (the server still starts if this fails)
//! 4. Serve HTTP until Ctrl+C / SIGTERM

use anyhow::{Context, Result};
use clap::Parser;
use exo_common::config::{CompiledDefaults, TomlConfig};
use exo_common::FeatureSchema;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exo_predict::config::{Args, ServiceConfig};
use exo_predict::model::orchestrator;
use exo_predict::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path =
        TomlConfig::locate(args.common.config.as_deref()).context("Failed to locate config file")?;
    let toml = match &config_path {
        Some(path) => TomlConfig::from_file(path).context("Failed to load config file")?,
        None => TomlConfig::default(),
    };
    let defaults = CompiledDefaults::for_current_platform();
    let config = ServiceConfig::resolve(&args, &toml, &defaults).context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting exo-predict (Exoplanet Classification) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config file found, using compiled defaults"),
    }
    info!("Artifact directory: {}", config.artifact_dir.display());
    info!("Training dataset: {}", config.dataset_path.display());

    let schema = FeatureSchema::kepler();
    let model = orchestrator::initialize(&config.model_settings(), schema).await;
    if let Some(reason) = model.unavailable_reason() {
        warn!("Serving without a model; /predict will answer 503 ({})", reason);
    }

    let state = AppState::new(model, schema, config.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;
    info!("Listening on http://{}", config.listen);
    info!("Health check: http://{}/health", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
