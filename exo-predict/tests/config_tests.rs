//! Configuration priority tests: CLI > ENV > TOML > default
//!
//! Tests that touch process environment run serially.

use clap::Parser;
use exo_common::config::{CompiledDefaults, TomlConfig};
use exo_predict::config::{Args, ServiceConfig};
use serial_test::serial;
use std::path::PathBuf;

const ENV_VARS: [&str; 6] = [
    "EXO_PORT",
    "EXO_BIND",
    "EXO_CONFIG",
    "EXO_ARTIFACT_DIR",
    "EXO_DATASET_PATH",
    "EXO_DATASET_URL",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_env_fills_unset_flags() {
    clear_env();
    std::env::set_var("EXO_PORT", "9123");
    std::env::set_var("EXO_ARTIFACT_DIR", "/env/artifacts");

    let args = Args::try_parse_from(["exo-predict"]).unwrap();
    assert_eq!(args.port, Some(9123));
    assert_eq!(args.common.artifact_dir, Some(PathBuf::from("/env/artifacts")));

    clear_env();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env();
    std::env::set_var("EXO_PORT", "9123");

    let args = Args::try_parse_from(["exo-predict", "--port", "7001"]).unwrap();
    assert_eq!(args.port, Some(7001));

    clear_env();
}

#[test]
#[serial]
fn test_env_beats_toml() {
    clear_env();
    std::env::set_var("EXO_DATASET_URL", "http://env.example/koi.csv");

    let args = Args::try_parse_from(["exo-predict"]).unwrap();
    let toml = TomlConfig::from_toml_str(
        "dataset_url = \"http://toml.example/koi.csv\"\nport = 8100\n",
    )
    .unwrap();
    let config =
        ServiceConfig::resolve(&args, &toml, &CompiledDefaults::for_current_platform()).unwrap();

    assert_eq!(config.dataset_url, "http://env.example/koi.csv");
    assert_eq!(config.listen.port(), 8100);

    clear_env();
}

#[test]
#[serial]
fn test_all_flags_parse() {
    clear_env();

    let args = Args::try_parse_from([
        "exo-predict",
        "--port",
        "8080",
        "--bind",
        "127.0.0.1",
        "--config",
        "/etc/exoplanet/config.toml",
        "--artifact-dir",
        "/var/lib/exoplanet",
        "--dataset",
        "/data/koi.csv",
        "--dataset-url",
        "http://localhost/koi.csv",
    ])
    .unwrap();

    let config = ServiceConfig::resolve(
        &args,
        &TomlConfig::default(),
        &CompiledDefaults::for_current_platform(),
    )
    .unwrap();
    assert_eq!(config.listen.to_string(), "127.0.0.1:8080");
    assert_eq!(config.artifact_dir, PathBuf::from("/var/lib/exoplanet"));
    assert_eq!(config.dataset_path, PathBuf::from("/data/koi.csv"));
    assert_eq!(
        args.common.config,
        Some(PathBuf::from("/etc/exoplanet/config.toml"))
    );
}

#[test]
#[serial]
fn test_model_settings_use_default_training() {
    clear_env();

    let args = Args::try_parse_from(["exo-predict", "--artifact-dir", "/tmp/a"]).unwrap();
    let config = ServiceConfig::resolve(
        &args,
        &TomlConfig::default(),
        &CompiledDefaults::for_current_platform(),
    )
    .unwrap();

    let settings = config.model_settings();
    assert_eq!(settings.artifact_dir, PathBuf::from("/tmp/a"));
    assert_eq!(settings.training.seed, 42);
}
