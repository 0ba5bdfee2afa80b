//! Output reporters for ranked risk reports
//!
//! Supports multiple output formats:
//! - `csv` - Spreadsheet-friendly table, one row per package (default)
//! - `json` - Array of row objects keyed by column name
//! - `text` - Terminal table with colors
//! - `markdown` - GitHub-flavored Markdown table
//!
//! Every format is a pure function of the report, so unchanged inputs
//! produce byte-identical output.

mod csv;
mod json;
mod markdown;
mod text;

use crate::ranking::Report;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Text,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: csv, json, text, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Rendering knobs shared by the formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Only the N highest-risk rows (text and markdown)
    pub top: Option<usize>,
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(
    report: &Report,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String> {
    match format {
        OutputFormat::Csv => csv::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Text => text::render(report, options),
        OutputFormat::Markdown => markdown::render(report, options),
    }
}
