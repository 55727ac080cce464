//! # exo-common
//!
//! Shared code for the exoplanet classification binaries:
//! - Common error type
//! - Bootstrap configuration loading (TOML + compiled defaults)
//! - The fixed feature schema used for training and inference
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod schema;
pub mod time;

pub use error::{Error, Result};
pub use schema::FeatureSchema;
