//! Output and threshold handling for the analyze command

use super::setup::AnalysisConfig;
use crate::pipeline::RunOutcome;
use crate::ranking::Report;
use crate::reporters::{self, OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use console::style;

/// Render the report and write it to the configured destination.
pub(super) fn format_and_output(report: &Report, config: &AnalysisConfig) -> Result<()> {
    let options = RenderOptions { top: config.top };
    let output = reporters::report_with_format(report, config.format, &options)?;

    match config.output {
        Some(ref out_path) => {
            // Colors only make sense on a terminal
            let content = if config.format == OutputFormat::Text {
                console::strip_ansi_codes(&output).into_owned()
            } else {
                output
            };
            std::fs::write(out_path, content)
                .with_context(|| format!("Failed to write report to {}", out_path.display()))?;
            if !config.quiet {
                eprintln!(
                    "\nReport written to: {}",
                    style(out_path.display()).cyan()
                );
            }
        }
        None => {
            if matches!(config.format, OutputFormat::Text | OutputFormat::Markdown) {
                println!();
            }
            print!("{}", output);
        }
    }

    Ok(())
}

/// Warn about sources that could not be consulted.
pub(super) fn print_run_summary(outcome: &RunOutcome, quiet: bool) {
    if quiet {
        return;
    }
    let summary = outcome.summary();
    if outcome.warnings.is_empty() && outcome.skipped.is_empty() {
        eprintln!("{} {}", style("✓").green(), summary);
    } else {
        eprintln!("{} {}", style("!").yellow(), summary);
        for skipped in &outcome.skipped {
            eprintln!("  {} {}", style("skipped:").dim(), skipped);
        }
    }
}

/// Check if fail threshold is met
pub(super) fn check_fail_threshold(fail_on: Option<u32>, outcome: &RunOutcome) -> Result<()> {
    if let Some(threshold) = fail_on {
        let over = outcome.at_or_above(threshold);
        if over > 0 {
            eprintln!(
                "Failing due to --fail-on={}: {} package(s) at or above",
                threshold, over
            );
            std::process::exit(1);
        }
    }
    Ok(())
}
