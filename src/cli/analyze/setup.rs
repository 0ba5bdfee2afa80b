//! Analyze setup: settings resolution and input loading

use crate::adapters::{DistributionIndex, PopularityTable};
use crate::cli::AnalyzeArgs;
use crate::config::{ProjectConfig, UserConfig};
use crate::models::RosterEntry;
use crate::reporters::OutputFormat;
use crate::roster;
use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressStyle;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default output file for CSV, matching what spreadsheets pick up
pub(super) const DEFAULT_CSV_OUTPUT: &str = "results.csv";

/// Settings after applying CLI flags over project config
#[derive(Debug, Clone)]
pub(super) struct AnalysisConfig {
    pub projects: PathBuf,
    pub distribution: PathBuf,
    pub popularity: PathBuf,
    pub cache_dir: PathBuf,
    pub offline: bool,
    pub timeout: Duration,
    pub epoch_year: u16,
    pub format: OutputFormat,
    /// `None` writes to stdout
    pub output: Option<PathBuf>,
    pub top: Option<usize>,
    pub fail_on: Option<u32>,
    pub workers: usize,
    pub quiet: bool,
}

/// Loaded local inputs
pub(super) struct Inputs {
    pub roster: Vec<RosterEntry>,
    pub distribution: DistributionIndex,
    pub popularity: PopularityTable,
}

/// Apply CLI flags over project config, resolving relative paths against
/// the working directory.
pub(super) fn apply_config_defaults(
    workdir: &Path,
    args: &AnalyzeArgs,
    workers: usize,
    quiet: bool,
    project_config: &ProjectConfig,
) -> Result<AnalysisConfig> {
    let inputs = &project_config.inputs;
    let resolve = |p: &Path| workdir.join(p);

    let format = match args.format.as_deref().or(project_config.output.format.as_deref()) {
        Some(f) => OutputFormat::from_str(f)?,
        None => OutputFormat::default(),
    };
    let output = args
        .output
        .clone()
        .or_else(|| project_config.output.path.clone())
        .or_else(|| (format == OutputFormat::Csv).then(|| PathBuf::from(DEFAULT_CSV_OUTPUT)))
        .map(|p| resolve(&p));

    Ok(AnalysisConfig {
        projects: resolve(args.projects.as_deref().unwrap_or(inputs.projects.as_path())),
        distribution: resolve(args.distribution.as_deref().unwrap_or(inputs.distribution.as_path())),
        popularity: resolve(args.popularity.as_deref().unwrap_or(inputs.popularity.as_path())),
        cache_dir: args
            .cache_dir
            .as_deref()
            .map(resolve)
            .unwrap_or_else(|| resolve(&project_config.cache.resolved_dir())),
        offline: args.offline || project_config.cache.offline,
        timeout: project_config.cache.timeout(),
        epoch_year: args
            .cve_since
            .unwrap_or(project_config.scoring.cve_epoch_year),
        format,
        output,
        top: args.top,
        fail_on: args.fail_on,
        workers,
        quiet,
    })
}

/// Read the roster and the two local tables.
pub(super) fn load_inputs(config: &AnalysisConfig) -> Result<Inputs> {
    for (what, path) in [
        ("Roster", &config.projects),
        ("Distribution metadata", &config.distribution),
        ("Popularity table", &config.popularity),
    ] {
        if !path.exists() {
            anyhow::bail!(
                "{} not found: {} (see `pkgrisk doctor`)",
                what,
                path.display()
            );
        }
    }

    let roster = roster::load(&config.projects)?;
    let distribution = DistributionIndex::load(&config.distribution)
        .context("Failed to load distribution metadata")?;
    let popularity =
        PopularityTable::load(&config.popularity).context("Failed to load popularity table")?;

    Ok(Inputs {
        roster,
        distribution,
        popularity,
    })
}

/// Print analysis header
pub(super) fn print_header(config: &AnalysisConfig, user: &UserConfig, packages: usize) {
    if config.quiet {
        return;
    }
    eprintln!("\n{}\n", style("pkgrisk analysis").bold());
    eprintln!(
        "Roster:   {} ({} packages)",
        style(config.projects.display()).cyan(),
        packages
    );
    eprintln!("Cache:    {}", style(config.cache_dir.display()).cyan());
    let mode = if config.offline {
        style("offline").yellow()
    } else if user.has_api_key() {
        style("online").green()
    } else {
        style("online, analytics from cache only (no API key)").yellow()
    };
    eprintln!("Network:  {}\n", mode);
}

/// Create bar progress style
pub(super) fn create_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("valid template")
        .progress_chars("█▓▒░  ")
}
