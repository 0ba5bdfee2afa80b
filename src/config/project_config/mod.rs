//! Project-level configuration support
//!
//! Loads per-project configuration from `pkgrisk.toml` or `.pkgriskrc.json`
//! in the working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # pkgrisk.toml
//!
//! [inputs]
//! projects = "projects_to_examine.csv"
//! distribution = "apt_cache_dumpavail.txt"
//! popularity = "by_inst"
//!
//! [cache]
//! dir = "/var/cache/pkgrisk"   # default: user cache dir
//! offline = false
//! timeout_secs = 30
//!
//! [scoring]
//! cve_epoch_year = 2010
//!
//! [output]
//! format = "csv"
//! path = "results.csv"
//! ```

use crate::adapters::security_tracker::DEFAULT_EPOCH_YEAR;
use crate::cache::{default_cache_dir, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const TOML_CONFIG_FILE: &str = "pkgrisk.toml";
pub const JSON_CONFIG_FILE: &str = ".pkgriskrc.json";

/// Project configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub inputs: InputsConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

/// Locations of the three local input files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Operator roster CSV
    pub projects: PathBuf,
    /// `apt-cache dumpavail` output
    pub distribution: PathBuf,
    /// popularity-contest `by_inst` table
    pub popularity: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            projects: PathBuf::from("projects_to_examine.csv"),
            distribution: PathBuf::from("apt_cache_dumpavail.txt"),
            popularity: PathBuf::from("by_inst"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Defaults to `<user cache dir>/pkgrisk`
    pub dir: Option<PathBuf>,
    /// Never touch the network; serve cached documents only
    pub offline: bool,
    pub timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            offline: false,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_cache_dir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Only CVEs from this year on are counted
    pub cve_epoch_year: u16,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cve_epoch_year: DEFAULT_EPOCH_YEAR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// csv, json, text or markdown
    pub format: Option<String>,
    pub path: Option<PathBuf>,
}

/// Load project configuration from the given directory
///
/// Tries `pkgrisk.toml` first, then `.pkgriskrc.json`. A file that cannot be
/// read or parsed is reported and skipped.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let toml_path = dir.join(TOML_CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}
