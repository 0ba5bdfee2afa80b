//! Text (terminal) reporter with colors and formatting

use super::RenderOptions;
use crate::ranking::{risk_index_column, Report, ReportRow, COMPONENTS_COLUMN};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Risk band colors
fn risk_color(risk: u32) -> &'static str {
    match risk {
        10.. => "\x1b[31m", // Red
        6..=9 => "\x1b[33m", // Yellow
        _ => "\x1b[32m",     // Green
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let cut: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

/// Render report as formatted terminal output
pub fn render(report: &Report, options: &RenderOptions) -> Result<String> {
    let mut out = String::new();
    let cve_column = report
        .headers
        .iter()
        .find(|h| h.starts_with("cve_since_"))
        .cloned()
        .unwrap_or_default();

    out.push_str(&format!("\n{BOLD}Package Risk Ranking{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));

    if report.is_empty() {
        out.push_str("No packages ranked.\n");
        return Ok(out);
    }

    let shown = options.top.unwrap_or(report.rows.len()).min(report.rows.len());
    let risk = |row: &ReportRow| -> u32 {
        report.cell(row, risk_index_column()).parse().unwrap_or(0)
    };
    let high = report.rows.iter().filter(|r| risk(r) >= 10).count();
    out.push_str(&format!(
        "Packages: {}  High risk (10+): {}{}{}\n\n",
        report.rows.len(),
        risk_color(10),
        high,
        RESET
    ));

    out.push_str(&format!(
        "{DIM}  #    RISK  PACKAGE                   VERSION              CVE   LANG      12M   RANK{RESET}\n"
    ));
    out.push_str(&format!(
        "{DIM}  ─────────────────────────────────────────────────────────────────────────────────{RESET}\n"
    ));

    for (i, row) in report.rows.iter().take(shown).enumerate() {
        let r = risk(row);
        let language = match report.cell(row, "main_language_name") {
            "" => report.cell(row, "implemented_in"),
            lang => lang,
        };
        out.push_str(&format!(
            "  {:<4} {}{BOLD}{:>4}{RESET}  {:<25} {:<20} {:<5} {:<9} {:<5} {}\n",
            i + 1,
            risk_color(r),
            r,
            truncate(report.cell(row, "project_name"), 25),
            truncate(report.cell(row, "debian_version"), 20),
            display_or_dash(report.cell(row, &cve_column)),
            truncate(display_or_dash(language), 9),
            display_or_dash(report.cell(row, "twelve_month_contributor_count")),
            display_or_dash(report.cell(row, "popularity_rank")),
        ));
        out.push_str(&format!(
            "       {DIM}{}{RESET}\n",
            report.cell(row, COMPONENTS_COLUMN)
        ));
        let comment = report.cell(row, "comment_on_priority");
        if !comment.is_empty() {
            out.push_str(&format!("       {DIM}note: {}{RESET}\n", comment));
        }
    }

    if shown < report.rows.len() {
        out.push_str(&format!(
            "\n  {DIM}... {} more (use --top to show more){RESET}\n",
            report.rows.len() - shown
        ));
    }

    Ok(out)
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
