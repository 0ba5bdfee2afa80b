//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates a ranking table suitable for issues, pull request comments and
//! review trackers.

use super::RenderOptions;
use crate::ranking::{risk_index_column, Report, ReportRow, COMPONENTS_COLUMN};
use crate::scoring::MAX_RISK_INDEX;
use anyhow::Result;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &Report, options: &RenderOptions) -> Result<String> {
    let mut md = String::new();

    md.push_str("# Package Risk Ranking\n\n");
    md.push_str(&render_summary(report));
    md.push('\n');

    if report.is_empty() {
        md.push_str("_No packages ranked._\n");
        return Ok(md);
    }

    md.push_str(&render_table(report, options));
    md.push('\n');
    md.push_str(&render_legend());

    Ok(md)
}

fn render_summary(report: &Report) -> String {
    let risks: Vec<u32> = report
        .rows
        .iter()
        .map(|r| report.cell(r, risk_index_column()).parse().unwrap_or(0))
        .collect();
    let highest = risks.iter().copied().max().unwrap_or(0);
    format!(
        "| Metric | Value |\n|--------|-------|\n| Packages ranked | {} |\n| Highest risk index | {} / {} |\n| Risk 10 or more | {} |\n",
        report.rows.len(),
        highest,
        MAX_RISK_INDEX,
        risks.iter().filter(|&&r| r >= 10).count()
    )
}

fn render_table(report: &Report, options: &RenderOptions) -> String {
    let cve_column = report
        .headers
        .iter()
        .find(|h| h.starts_with("cve_since_"))
        .cloned()
        .unwrap_or_default();
    let shown = options.top.unwrap_or(report.rows.len());

    let mut md = String::new();
    md.push_str(&format!(
        "| # | Package | Risk | Version | {} | Language | 12-month contributors | Popularity rank | Components | Comment |\n",
        escape(&cve_column)
    ));
    md.push_str("|---|---------|------|---------|-----|----------|-----|------|------------|---------|\n");

    for (i, row) in report.rows.iter().take(shown).enumerate() {
        md.push_str(&format!(
            "| {} | `{}` | **{}** | {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            report.cell(row, "project_name"),
            report.cell(row, risk_index_column()),
            escape(report.cell(row, "debian_version")),
            report.cell(row, &cve_column),
            escape(&language(report, row)),
            report.cell(row, "twelve_month_contributor_count"),
            report.cell(row, "popularity_rank"),
            escape(report.cell(row, COMPONENTS_COLUMN)),
            escape(report.cell(row, "comment_on_priority")),
        ));
    }

    if shown < report.rows.len() {
        md.push_str(&format!(
            "\n_{} more packages not shown._\n",
            report.rows.len() - shown
        ));
    }
    md
}

fn language(report: &Report, row: &ReportRow) -> String {
    match report.cell(row, "main_language_name") {
        "" => report.cell(row, "implemented_in").to_string(),
        lang => lang.to_string(),
    }
}

fn render_legend() -> String {
    "<details>\n<summary>Scoring rubric</summary>\n\n\
     | Factor | Points |\n|--------|--------|\n\
     | No homepage anywhere | +1 |\n\
     | Written in C or C++ | +2 |\n\
     | CVEs since epoch: 0 / 1 / 2-3 / other or unknown | 0 / 1 / 2 / 3 |\n\
     | 12-month contributors: 0 / 1-3 / unknown / more | 5 / 4 / 2 / 0 |\n\
     | Top 1% / top 5% by installs | 2 / 1 |\n\
     | Data or documentation package | -3 |\n\
     | Direct exposure / network data or privileged | 2 / 1 |\n\
     \n</details>\n"
        .to_string()
}

/// Escape characters that break a table cell.
fn escape(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}
