//! Population statistics
//!
//! Percentile rank cut-offs derived once per run from the whole popularity
//! table. The population size is the rank on the `Total` sentinel row, not
//! the number of packages on the roster.

use crate::error::{RiskError, RiskResult};
use crate::models::PopularityRecord;
use serde::Serialize;
use tracing::debug;

/// Key of the sentinel row carrying the population size.
pub const TOTAL_SENTINEL: &str = "total";

/// A percentile expressed in basis points (1% = 100).
///
/// Integer arithmetic keeps `⌊p × total⌋` exact; a float product such as
/// `0.29 * 100.0` lands just below 29.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Percentile(u32);

impl Percentile {
    pub const ZERO: Percentile = Percentile(0);
    pub const ONE_PERCENT: Percentile = Percentile(100);
    pub const FIVE_PERCENT: Percentile = Percentile(500);
    pub const ALL: Percentile = Percentile(10_000);

    pub const fn from_basis_points(bp: u32) -> Self {
        Self(if bp > 10_000 { 10_000 } else { bp })
    }

    pub const fn from_percent(percent: u32) -> Self {
        Self::from_basis_points(percent.saturating_mul(100))
    }

    pub fn basis_points(self) -> u32 {
        self.0
    }
}

/// Read-only thresholds shared by every scoring call in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationStatistics {
    total: u64,
    one_percent: u64,
    five_percent: u64,
}

impl PopulationStatistics {
    /// Derive thresholds from all popularity rows.
    ///
    /// Fails with `MissingPopulationTotal` when no sentinel row exists. If
    /// the table somehow carries several sentinel rows the largest rank
    /// wins, so the result never depends on row order.
    pub fn compute(records: &[PopularityRecord]) -> RiskResult<Self> {
        let total = records
            .iter()
            .filter(|r| r.key.as_str() == TOTAL_SENTINEL)
            .map(|r| r.rank)
            .max()
            .ok_or(RiskError::MissingPopulationTotal)?;

        let stats = Self::from_total(total);
        debug!(
            "Population total {}: 1% cut-off = {}, 5% cut-off = {}",
            stats.total, stats.one_percent, stats.five_percent
        );
        Ok(stats)
    }

    pub fn from_total(total: u64) -> Self {
        Self {
            total,
            one_percent: floor_share(total, Percentile::ONE_PERCENT),
            five_percent: floor_share(total, Percentile::FIVE_PERCENT),
        }
    }

    /// `⌊p × total⌋`
    pub fn rank_at_percentile(&self, p: Percentile) -> u64 {
        floor_share(self.total, p)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Rank cut-off for the most popular 1% of the population.
    pub fn one_percent(&self) -> u64 {
        self.one_percent
    }

    /// Rank cut-off for the most popular 5% of the population.
    pub fn five_percent(&self) -> u64 {
        self.five_percent
    }
}

fn floor_share(total: u64, p: Percentile) -> u64 {
    // u128 so that a pathological total cannot overflow
    (u128::from(total) * u128::from(p.basis_points()) / 10_000) as u64
}
