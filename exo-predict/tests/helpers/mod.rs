//! Test Helper Utilities
//!
//! Shared utilities for exo-predict integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod multipart;

pub use fixtures::{
    loaded_state, trained_artifact, unloaded_state, write_training_csv, FULL_HEADER,
    K99999_01, K99999_02,
};
pub use multipart::{body_json, multipart_request};
