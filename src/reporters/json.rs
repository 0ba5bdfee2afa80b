//! JSON reporter
//!
//! Outputs the ranked rows as a pretty-printed array of objects. Keys keep
//! the report's column order.

use crate::ranking::{Report, ReportRow};
use anyhow::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};

struct RowObject<'a> {
    headers: &'a [String],
    row: &'a ReportRow,
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (header, cell) in self.headers.iter().zip(&self.row.cells) {
            map.serialize_entry(header, cell)?;
        }
        map.end()
    }
}

fn rows(report: &Report) -> Vec<RowObject<'_>> {
    report
        .rows
        .iter()
        .map(|row| RowObject {
            headers: &report.headers,
            row,
        })
        .collect()
}

/// Render report as JSON
pub fn render(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(&rows(report))?)
}

/// Render report as compact JSON (single line)
#[cfg(test)]
pub fn render_compact(report: &Report) -> Result<String> {
    Ok(serde_json::to_string(&rows(report))?)
}
