//! Risk analysis pipeline
//!
//! Orchestrates one run:
//! 1. Derive population statistics from the whole popularity table
//! 2. Build and score every roster entry in parallel
//! 3. Rank the scored packages
//!
//! Step 1 is the only barrier. Once the statistics exist, packages are
//! independent of each other and of processing order. A package that cannot
//! be built is skipped with a warning; only missing statistics stop the run.

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use crate::adapters::Sources;
use crate::error::RiskError;
use crate::models::RosterEntry;
use crate::population::PopulationStatistics;
use crate::profile::{self, BuiltProfile};
use crate::ranking::{self, ScoredPackage};
use crate::scoring;

pub const DEFAULT_WORKERS: usize = 8;

/// Called with (package, done, total) after each package.
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

pub struct Pipeline<'a> {
    sources: Sources<'a>,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Pipeline<'a> {
    pub fn new(sources: Sources<'a>) -> Self {
        Self {
            sources,
            workers: DEFAULT_WORKERS,
            progress_callback: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run the whole roster through the pipeline.
    ///
    /// Fails only with [`RiskError::MissingPopulationTotal`] or when the
    /// worker pool cannot be created.
    pub fn run(&self, roster: &[RosterEntry]) -> Result<RunOutcome> {
        let start = Instant::now();
        let stats = PopulationStatistics::compute(self.sources.popularity.all())?;

        info!(
            "Scoring {} packages on {} workers",
            roster.len(),
            self.workers
        );

        let completed = AtomicUsize::new(0);
        let total = roster.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        // Indexed collect keeps roster order for the stable ranking
        let results: Vec<Result<BuiltProfile, RiskError>> = pool.install(|| {
            roster
                .par_iter()
                .map(|entry| {
                    let result = profile::build_from_sources(entry, &self.sources);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(entry.key.as_str(), done, total);
                    }

                    result
                })
                .collect()
        });

        let mut scored = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        let mut skipped = Vec::new();

        for result in results {
            match result {
                Ok(built) => {
                    warnings.extend(built.warnings);
                    let breakdown = scoring::score(&built.profile, &stats);
                    scored.push(ScoredPackage {
                        profile: built.profile,
                        breakdown,
                    });
                }
                Err(e) => {
                    warn!("Skipping package: {}", e);
                    skipped.push(e);
                }
            }
        }

        let ranked = ranking::rank(scored);
        info!(
            "Ranked {} packages ({} skipped) in {:?}",
            ranked.len(),
            skipped.len(),
            start.elapsed()
        );

        Ok(RunOutcome {
            ranked,
            warnings,
            skipped,
            stats,
        })
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Highest risk first
    pub ranked: Vec<ScoredPackage>,
    /// Sources that could not be consulted, per package
    #[serde(skip)]
    pub warnings: Vec<RiskError>,
    /// Roster entries that never produced a profile
    #[serde(skip)]
    pub skipped: Vec<RiskError>,
    pub stats: PopulationStatistics,
}

impl RunOutcome {
    /// Packages at or above the given risk index.
    pub fn at_or_above(&self, risk_index: u32) -> usize {
        self.ranked
            .iter()
            .filter(|p| p.risk_index() >= risk_index)
            .count()
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} ranked", self.ranked.len())];
        if !self.skipped.is_empty() {
            parts.push(format!("{} skipped", self.skipped.len()));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("{} source warnings", self.warnings.len()));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{NoSource, PopularityTable};
    use crate::models::{LookupKey, PopularityRecord};
    use std::sync::Mutex;

    fn popularity() -> PopularityTable {
        PopularityTable::from_rows(vec![
            PopularityRecord {
                key: LookupKey::from("bash"),
                rank: 1,
                count: "200000".into(),
            },
            PopularityRecord {
                key: LookupKey::from("Total"),
                rank: 1000,
                count: "0".into(),
            },
        ])
    }

    fn sources(popularity: &PopularityTable) -> Sources<'_> {
        Sources {
            distribution: &NoSource,
            popularity,
            analytics: &NoSource,
            vulnerabilities: &NoSource,
        }
    }

    #[test]
    fn test_missing_total_is_fatal() {
        let sources = Sources {
            distribution: &NoSource,
            popularity: &NoSource,
            analytics: &NoSource,
            vulnerabilities: &NoSource,
        };
        let err = Pipeline::new(sources)
            .run(&[RosterEntry::new("bash")])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RiskError>(),
            Some(&RiskError::MissingPopulationTotal)
        );
    }

    #[test]
    fn test_unknown_key_skipped_not_fatal() {
        let table = popularity();
        let roster = vec![
            RosterEntry::new("bash"),
            RosterEntry::new("no such pkg"),
            RosterEntry::new("zsh"),
        ];
        let outcome = Pipeline::new(sources(&table))
            .with_workers(2)
            .run(&roster)
            .unwrap();
        assert_eq!(outcome.ranked.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(outcome.skipped[0], RiskError::UnknownLookupKey(_)));
        assert_eq!(outcome.stats.total(), 1000);
    }

    #[test]
    fn test_popular_package_ranks_first() {
        let table = popularity();
        let roster = vec![RosterEntry::new("zsh"), RosterEntry::new("bash")];
        let outcome = Pipeline::new(sources(&table)).run(&roster).unwrap();
        // bash is rank 1, inside the 1% cut-off of 10
        assert_eq!(outcome.ranked[0].profile.key.as_str(), "bash");
        assert_eq!(outcome.ranked[0].breakdown.popularity, 2);
        assert_eq!(outcome.ranked[1].breakdown.popularity, 0);
        assert_eq!(outcome.ranked[1].profile.popularity.count, "");
    }

    #[test]
    fn test_progress_reports_every_package() {
        let table = popularity();
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let roster: Vec<RosterEntry> = (0..20)
            .map(|i| RosterEntry::new(format!("pkg{}", i).as_str()))
            .collect();

        Pipeline::new(sources(&table))
            .with_workers(4)
            .on_progress(Box::new(move |_, done, total| {
                sink.lock().unwrap().push((done, total));
            }))
            .run(&roster)
            .unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen.len(), 20);
        assert_eq!(seen.last(), Some(&(20, 20)));
    }

    #[test]
    fn test_summary_and_threshold_count() {
        let table = popularity();
        let outcome = Pipeline::new(sources(&table))
            .run(&[RosterEntry::new("bash"), RosterEntry::new("x y")])
            .unwrap();
        assert_eq!(outcome.summary(), "1 ranked, 1 skipped");
        assert_eq!(outcome.at_or_above(0), 1);
        assert_eq!(outcome.at_or_above(100), 0);
    }
}
