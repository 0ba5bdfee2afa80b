//! Configuration module for pkgrisk
//!
//! This module handles:
//! - Project-level configuration (pkgrisk.toml): input files, cache, output
//! - User-level configuration: the analytics API key

mod project_config;
mod user_config;

pub use project_config::{
    load_project_config, CacheConfig, InputsConfig, OutputConfig, ProjectConfig, ScoringConfig,
    JSON_CONFIG_FILE, TOML_CONFIG_FILE,
};
pub use user_config::{UserConfig, API_KEY_ENV, LEGACY_KEY_FILE};
