//! Doctor command - check environment

use crate::config::{
    load_project_config, UserConfig, API_KEY_ENV, JSON_CONFIG_FILE, TOML_CONFIG_FILE,
};
use anyhow::Result;
use console::style;
use std::path::Path;

/// Outcome of one environment check.
#[derive(Debug, PartialEq, Eq)]
enum Check {
    Ok(String),
    Optional(String),
    Missing(String),
}

pub fn run(workdir: &Path) -> Result<()> {
    println!("pkgrisk doctor\n");

    let checks = collect_checks(workdir)?;
    let mut failed = 0;
    for check in &checks {
        match check {
            Check::Ok(msg) => println!("{} {}", style("✓").green(), msg),
            Check::Optional(msg) => println!("{} {}", style("○").dim(), msg),
            Check::Missing(msg) => {
                failed += 1;
                println!("{} {}", style("✗").red(), msg);
            }
        }
    }

    if failed == 0 {
        println!("\nAll checks passed!");
    } else {
        println!(
            "\n{} check{} failed. `pkgrisk analyze` needs all three input files.",
            failed,
            if failed == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn collect_checks(workdir: &Path) -> Result<Vec<Check>> {
    let project = load_project_config(workdir);
    let user = UserConfig::load(workdir)?;
    let mut checks = Vec::new();

    let config_file = [TOML_CONFIG_FILE, JSON_CONFIG_FILE]
        .into_iter()
        .find(|name| workdir.join(name).exists());
    checks.push(match config_file {
        Some(name) => Check::Ok(format!("Project config: {}", name)),
        None => Check::Optional("Project config: none (defaults)".to_string()),
    });

    for (what, path) in [
        ("Roster", &project.inputs.projects),
        ("Distribution metadata", &project.inputs.distribution),
        ("Popularity table", &project.inputs.popularity),
    ] {
        let full = workdir.join(path);
        checks.push(if full.is_file() {
            Check::Ok(format!("{}: {}", what, full.display()))
        } else {
            Check::Missing(format!("{}: {} not found", what, full.display()))
        });
    }

    let cache = workdir.join(project.cache.resolved_dir());
    checks.push(if cache.is_dir() {
        Check::Ok(format!("Document cache: {}", cache.display()))
    } else {
        Check::Optional(format!(
            "Document cache: {} (created on first fetch)",
            cache.display()
        ))
    });

    checks.push(if user.has_api_key() {
        Check::Ok("OpenHub API key: configured".to_string())
    } else {
        Check::Optional(format!(
            "OpenHub API key: not set; set {} or run `pkgrisk config init`",
            API_KEY_ENV
        ))
    });

    Ok(checks)
}
