//! CLI command definitions and handlers

pub(crate) mod analyze;
mod clean;
mod doctor;
mod thresholds;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

use crate::config::{
    load_project_config, ProjectConfig, UserConfig, API_KEY_ENV, LEGACY_KEY_FILE,
    TOML_CONFIG_FILE,
};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// pkgrisk - rank open-source packages by security review priority
#[derive(Parser, Debug)]
#[command(name = "pkgrisk")]
#[command(
    version,
    about = "Rank distribution packages by security review priority",
    long_about = "pkgrisk enriches a roster of distribution packages with package metadata, \
install counts, project analytics and vulnerability history, then reduces each package \
to a risk index (0-15) and ranks them.\n\n\
Run without a subcommand to analyze with the configured defaults:\n  \
pkgrisk",
    after_help = "\
Examples:
  pkgrisk                                    Analyze using pkgrisk.toml / defaults
  pkgrisk analyze -f text --top 20           Top 20 packages in the terminal
  pkgrisk analyze -f json -o risk.json       JSON output for scripting
  pkgrisk analyze --offline                  Use cached remote data only
  pkgrisk analyze --fail-on 12               Exit code 1 if any package scores 12+
  pkgrisk thresholds                         Show popularity percentile cut-offs"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score and rank every package on the roster
    #[command(after_help = "\
Examples:
  pkgrisk analyze                                  CSV to results.csv
  pkgrisk analyze -p roster.csv -o ranked.csv      Custom roster and output
  pkgrisk analyze -f markdown -o RISK.md           Markdown table
  pkgrisk analyze --cve-since 2018                 Count CVEs from 2018 on")]
    Analyze(AnalyzeArgs),

    /// Show the population size and popularity percentile cut-offs
    Thresholds {
        /// Popularity table (popcon by_inst)
        #[arg(long)]
        popularity: Option<PathBuf>,
    },

    /// Remove the document cache (fetched analytics and tracker pages)
    Clean {
        /// Preview what would be removed without deleting
        #[arg(long)]
        dry_run: bool,

        /// Cache directory (default: from config, else the user cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Check environment setup (input files, cache, API key)
    Doctor,

    /// Manage configuration (init or show)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct AnalyzeArgs {
    /// Roster CSV (default: projects_to_examine.csv)
    #[arg(long, short = 'p')]
    pub projects: Option<PathBuf>,

    /// `apt-cache dumpavail` output (default: apt_cache_dumpavail.txt)
    #[arg(long)]
    pub distribution: Option<PathBuf>,

    /// popularity-contest by_inst table (default: by_inst)
    #[arg(long)]
    pub popularity: Option<PathBuf>,

    /// Output format: csv, json, text, markdown (or md)
    #[arg(long, short = 'f', value_parser = ["csv", "json", "text", "markdown", "md"])]
    pub format: Option<String>,

    /// Output file path (default: results.csv for csv, stdout otherwise)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Only show the N highest-risk packages (text and markdown)
    #[arg(long)]
    pub top: Option<usize>,

    /// Never touch the network; use cached documents only
    #[arg(long)]
    pub offline: bool,

    /// Document cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Count vulnerabilities published in this year or later
    #[arg(long, value_name = "YEAR")]
    pub cve_since: Option<u16>,

    /// Exit with code 1 if any package has a risk index at or above this
    #[arg(long, value_name = "RISK")]
    pub fail_on: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create the user config and a project pkgrisk.toml with example settings
    Init,
    /// Show current config and paths
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let workdir = std::env::current_dir()?;
    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run(&workdir, &args, cli.workers, cli.quiet),

        Some(Commands::Thresholds { popularity }) => {
            thresholds::run(&workdir, popularity.as_deref())
        }

        Some(Commands::Clean { dry_run, cache_dir }) => {
            clean::run(&workdir, cache_dir.as_deref(), dry_run)
        }

        Some(Commands::Doctor) => doctor::run(&workdir),

        Some(Commands::Config { action }) => run_config_action(&workdir, action),

        // Default: analyze with configured defaults
        None => analyze::run(&workdir, &AnalyzeArgs::default(), cli.workers, cli.quiet),
    }
}

const PROJECT_CONFIG_TEMPLATE: &str = r#"# pkgrisk project configuration

[inputs]
projects = "projects_to_examine.csv"
distribution = "apt_cache_dumpavail.txt"
popularity = "by_inst"

[cache]
# dir = "/var/cache/pkgrisk"
offline = false
timeout_secs = 30

[scoring]
cve_epoch_year = 2010

[output]
format = "csv"
path = "results.csv"
"#;

fn run_config_action(workdir: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("User config:    {}", style(path.display()).cyan());

            let project_path = workdir.join(TOML_CONFIG_FILE);
            if project_path.exists() {
                println!(
                    "Project config: {} (exists, left unchanged)",
                    project_path.display()
                );
            } else {
                std::fs::write(&project_path, PROJECT_CONFIG_TEMPLATE)?;
                println!("Project config: {}", style(project_path.display()).cyan());
            }

            println!("\nAdd your OpenHub API key to the user config, or set:");
            println!("  export {}=\"...\"", API_KEY_ENV);
            Ok(())
        }
        ConfigAction::Show => show_config(workdir),
    }
}

fn show_config(workdir: &Path) -> Result<()> {
    let user = UserConfig::load(workdir)?;
    let project = load_project_config(workdir);

    let found = |p: &Path| {
        if p.exists() {
            style("✓").green().to_string()
        } else {
            style("(not found)").dim().to_string()
        }
    };

    println!("Config paths:");
    if let Some(user_path) = UserConfig::user_config_path() {
        println!("  User:    {} {}", user_path.display(), found(&user_path));
    }
    let project_path = workdir.join(TOML_CONFIG_FILE);
    println!("  Project: {} {}", project_path.display(), found(&project_path));
    let legacy = workdir.join(LEGACY_KEY_FILE);
    println!("  Legacy key file: {} {}", legacy.display(), found(&legacy));
    println!();

    let key_status = if user.has_api_key() {
        style("✓ configured").green()
    } else {
        style("✗ not set (cached analytics only)").yellow()
    };
    println!("OpenHub API key: {}", key_status);
    println!("Cache dir:       {}", project.cache.resolved_dir().display());
    println!();
    println!("Effective project config:\n");
    print!("{}", render_project_config(&project)?);
    Ok(())
}

fn render_project_config(config: &ProjectConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["pkgrisk"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "warn");
        assert_eq!(cli.workers, 8);
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "pkgrisk", "analyze", "-p", "r.csv", "-f", "md", "--top", "5", "--offline",
            "--fail-on", "12", "--cve-since", "2018", "--workers", "2",
        ])
        .unwrap();
        assert_eq!(cli.workers, 2);
        let Some(Commands::Analyze(args)) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.projects, Some(PathBuf::from("r.csv")));
        assert_eq!(args.format.as_deref(), Some("md"));
        assert_eq!(args.top, Some(5));
        assert!(args.offline);
        assert_eq!(args.fail_on, Some(12));
        assert_eq!(args.cve_since, Some(2018));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["pkgrisk", "analyze", "-f", "sarif"]).is_err());
    }

    #[test]
    fn test_project_template_parses() {
        let config: ProjectConfig = toml::from_str(PROJECT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.output.path, Some(PathBuf::from("results.csv")));
        assert!(render_project_config(&config).is_ok());
    }
}
