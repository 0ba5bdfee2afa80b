//! Popularity table adapter
//!
//! Parses the popularity-contest `by_inst` table:
//!
//! ```text
//! #rank name                            inst  vote   old recent no-files (maintainer)
//! 1     dpkg                           195283 189487  1193  4587    16 (Dpkg Developers)
//! 2     bash                           195260 ...
//! ----------------------------------------------------------------------------------
//! 195339 Total                        ...
//! ```
//!
//! The `Total` row is kept as an ordinary record; its rank is the population
//! size used for percentile thresholds.

use super::PopularitySource;
use crate::models::{Lookup, LookupKey, PopularityRecord};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PopularityTable {
    rows: Vec<PopularityRecord>,
    by_key: HashMap<LookupKey, usize>,
}

impl PopularityTable {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read popularity table {}", path.display()))?;
        let table = Self::parse(&content);
        debug!(
            "Parsed {} popularity rows from {}",
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn parse(content: &str) -> Self {
        let mut rows = Vec::new();
        for line in content.lines() {
            if line.starts_with('#') || line.starts_with("---") || line.trim().is_empty() {
                continue;
            }
            let mut columns = line.split_whitespace();
            let (Some(rank), Some(name)) = (columns.next(), columns.next()) else {
                debug!("Skipping short popularity line: {:?}", line);
                continue;
            };
            let Ok(rank) = rank.parse::<u64>() else {
                debug!("Skipping popularity line with non-numeric rank: {:?}", line);
                continue;
            };
            rows.push(PopularityRecord {
                key: LookupKey::normalize(name),
                rank,
                count: columns.next().unwrap_or_default().to_string(),
            });
        }
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<PopularityRecord>) -> Self {
        let mut by_key = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            // First occurrence wins; the table is ordered by rank
            by_key.entry(row.key.clone()).or_insert(idx);
        }
        Self { rows, by_key }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PopularitySource for PopularityTable {
    fn all(&self) -> &[PopularityRecord] {
        &self.rows
    }

    fn lookup(&self, key: &LookupKey) -> Lookup<PopularityRecord> {
        match self.by_key.get(key) {
            Some(&idx) => Lookup::Found(self.rows[idx].clone()),
            None => Lookup::Absent,
        }
    }
}
