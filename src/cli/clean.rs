//! Clean command - remove the document cache

use crate::config::load_project_config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn run(workdir: &Path, cache_dir: Option<&Path>, dry_run: bool) -> Result<()> {
    let root = cache_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| load_project_config(workdir).cache.resolved_dir());
    let root = workdir.join(root);

    if !root.is_dir() {
        println!("No cache found at {}.", root.display());
        return Ok(());
    }

    let namespaces = cached_namespaces(&root)?;
    let total: usize = namespaces.iter().map(|(_, n)| n).sum();

    println!(
        "Cache {} holds {} document{}:",
        root.display(),
        total,
        if total == 1 { "" } else { "s" }
    );
    for (dir, count) in &namespaces {
        println!("  {} ({})", dir.display(), count);
    }

    if dry_run {
        println!("\nDry run - nothing removed. Run without --dry-run to delete.");
        return Ok(());
    }

    remove_cache(&root)?;
    println!("\nRemoved: {}", root.display());

    Ok(())
}

fn remove_cache(root: &Path) -> Result<()> {
    std::fs::remove_dir_all(root)
        .with_context(|| format!("Failed to remove cache {}", root.display()))
}

/// Per-source subdirectories and how many documents each holds.
fn cached_namespaces(root: &Path) -> Result<Vec<(PathBuf, usize)>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let count = std::fs::read_dir(entry.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count();
        found.push((entry.path(), count));
    }
    found.sort();
    Ok(found)
}
