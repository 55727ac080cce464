//! Service configuration
//!
//! Command-line flags (with environment fallbacks) override the TOML
//! bootstrap file, which overrides compiled defaults.

use clap::Parser;
use exo_common::config::{resolve, CompiledDefaults, TomlConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::model::{ModelSettings, TrainingParams};

/// Flags shared by the server and the offline analyzer
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Bootstrap TOML config file
    #[arg(short, long, env = "EXO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted model artifacts
    #[arg(long, env = "EXO_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Local copy of the labeled training dataset
    #[arg(long = "dataset", env = "EXO_DATASET_PATH")]
    pub dataset_path: Option<PathBuf>,

    /// Where to fetch the training dataset when no local copy exists
    #[arg(long, env = "EXO_DATASET_URL")]
    pub dataset_url: Option<String>,
}

/// Command-line arguments for exo-predict
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "exo-predict")]
#[command(about = "Exoplanet candidate classification service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "EXO_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "EXO_BIND")]
    pub bind: Option<IpAddr>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    pub artifact_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub dataset_url: String,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge CLI/ENV, TOML and defaults
    pub fn resolve(
        args: &Args,
        toml: &TomlConfig,
        defaults: &CompiledDefaults,
    ) -> exo_common::Result<Self> {
        let bind = match (args.bind, toml.bind_address.as_deref()) {
            (Some(addr), _) => addr,
            (None, Some(text)) => text.parse().map_err(|e| {
                exo_common::Error::Config(format!("Invalid bind_address '{}': {}", text, e))
            })?,
            (None, None) => defaults.bind_address.parse().map_err(|e| {
                exo_common::Error::Internal(format!("Invalid default bind address: {}", e))
            })?,
        };
        let port = resolve(args.port, toml.port, defaults.port);

        Ok(Self {
            listen: SocketAddr::new(bind, port),
            artifact_dir: resolve(
                args.common.artifact_dir.clone(),
                toml.artifact_dir.clone(),
                defaults.artifact_dir.clone(),
            ),
            dataset_path: resolve(
                args.common.dataset_path.clone(),
                toml.dataset_path.clone(),
                defaults.dataset_path.clone(),
            ),
            dataset_url: resolve(
                args.common.dataset_url.clone(),
                toml.dataset_url.clone(),
                defaults.dataset_url.clone(),
            ),
            max_upload_bytes: resolve(None, toml.max_upload_bytes, defaults.max_upload_bytes),
            log_level: toml.logging.level.clone(),
        })
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            artifact_dir: self.artifact_dir.clone(),
            dataset_path: self.dataset_path.clone(),
            dataset_url: self.dataset_url.clone(),
            training: TrainingParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_toml() {
        let args = Args {
            port: Some(9000),
            common: CommonArgs {
                artifact_dir: Some(PathBuf::from("/cli/artifacts")),
                ..CommonArgs::default()
            },
            ..Args::default()
        };
        let toml = TomlConfig::from_toml_str(
            "port = 7000\nartifact_dir = \"/toml/artifacts\"\ndataset_path = \"/toml/koi.csv\"\n",
        )
        .unwrap();
        let defaults = CompiledDefaults::for_current_platform();

        let config = ServiceConfig::resolve(&args, &toml, &defaults).unwrap();
        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.artifact_dir, PathBuf::from("/cli/artifacts"));
        assert_eq!(config.dataset_path, PathBuf::from("/toml/koi.csv"));
        assert_eq!(config.dataset_url, defaults.dataset_url);
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServiceConfig::resolve(
            &Args::default(),
            &TomlConfig::default(),
            &CompiledDefaults::for_current_platform(),
        )
        .unwrap();
        assert_eq!(config.listen.to_string(), "0.0.0.0:8000");
        assert_eq!(config.max_upload_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_toml_bind_address() {
        let toml = TomlConfig::from_toml_str("bind_address = \"not-an-ip\"\n").unwrap();
        let result = ServiceConfig::resolve(
            &Args::default(),
            &toml,
            &CompiledDefaults::for_current_platform(),
        );
        assert!(matches!(result, Err(exo_common::Error::Config(_))));
    }
}
