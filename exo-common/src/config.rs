//! Bootstrap configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by the binaries' clap `env` attributes)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the binaries log a warning and start
//! on compiled defaults. A TOML file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Remote source of the labeled KOI training table
pub const DEFAULT_DATASET_URL: &str =
    "https://exoplanetarchive.ipac.caltech.edu/TAP/sync?query=select+*+from+cumulative&format=csv";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default upload size limit (32 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const APP_DIR: &str = "exoplanet";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; unset fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: Option<u16>,

    /// Address the HTTP server binds to
    pub bind_address: Option<String>,

    /// Directory holding the persisted model, scaler and feature list
    pub artifact_dir: Option<PathBuf>,

    /// Local copy of the labeled training dataset
    pub dataset_path: Option<PathBuf>,

    /// Where to fetch the training dataset when no local copy exists
    pub dataset_url: Option<String>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: Option<usize>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Find the bootstrap config file
    ///
    /// An explicit path must exist. Without one, the platform config
    /// locations are searched; `None` means compiled defaults apply.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        match explicit {
            Some(path) if !path.exists() => Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            Some(path) => Ok(Some(path.to_path_buf())),
            None => Ok(find_config_file()),
        }
    }

    /// Read and parse one config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Locate and parse in one step; no file yields defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub port: u16,
    pub bind_address: String,
    pub artifact_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub dataset_url: String,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_root = default_data_root();
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            artifact_dir: data_root.join("artifacts"),
            dataset_path: data_root.join("cumulative_koi.csv"),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: "info".to_string(),
        }
    }
}

/// Pick the first available value: CLI/ENV, then TOML, then default
pub fn resolve<T>(cli: Option<T>, toml: Option<T>, default: T) -> T {
    cli.or(toml).unwrap_or(default)
}

/// Locate the config file for the platform
///
/// Linux checks `~/.config/exoplanet/config.toml`, then
/// `/etc/exoplanet/config.toml`. Other platforms use the user config dir only.
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent data root
fn default_data_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./exoplanet_data"))
}
