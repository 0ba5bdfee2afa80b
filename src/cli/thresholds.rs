//! Thresholds command - show the popularity percentile cut-offs

use crate::adapters::{PopularitySource, PopularityTable};
use crate::config::load_project_config;
use crate::population::PopulationStatistics;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run(workdir: &Path, popularity: Option<&Path>) -> Result<()> {
    let path = match popularity {
        Some(p) => workdir.join(p),
        None => workdir.join(load_project_config(workdir).inputs.popularity),
    };
    let table = PopularityTable::load(&path)?;
    let stats = PopulationStatistics::compute(table.all())
        .with_context(|| format!("Cannot derive thresholds from {}", path.display()))?;

    print!("{}", render(&path, table.len(), &stats));
    Ok(())
}

fn render(path: &Path, rows: usize, stats: &PopulationStatistics) -> String {
    format!(
        "Popularity table: {} ({} rows)\n\
         Population:       {}\n\
         Top 1%:           rank <= {}  (2 points)\n\
         Top 5%:           rank <= {}  (1 point)\n",
        style(path.display()).cyan(),
        rows,
        style(stats.total()).bold(),
        stats.one_percent(),
        stats.five_percent(),
    )
}
