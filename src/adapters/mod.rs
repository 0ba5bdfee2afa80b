//! Source adapters
//!
//! One adapter per external source. Each answers "what do you know about
//! this key" with a [`Lookup`], independent of how the raw document was
//! obtained:
//!
//! - `debian` - distribution package database (`apt-cache dumpavail`)
//! - `popcon` - install-count popularity table (`by_inst`)
//! - `openhub` - project analytics XML feed
//! - `security_tracker` - vulnerability tracker HTML pages
//!
//! Adapters are shared read-only across the parallel per-package pass, so
//! every trait requires `Send + Sync`. They must be idempotent for the same
//! key.

pub mod debian;
pub mod openhub;
pub mod popcon;
pub mod security_tracker;
pub(crate) mod xml;

pub use debian::DistributionIndex;
pub use openhub::OpenHubClient;
pub use popcon::PopularityTable;
pub use security_tracker::SecurityTracker;

use crate::models::{
    AnalyticsRecord, DistributionRecord, Lookup, LookupKey, PopularityRecord, VulnerabilityRecord,
};

/// Distribution package metadata, keyed by package name.
pub trait DistributionSource: Send + Sync {
    fn lookup(&self, key: &LookupKey) -> Lookup<DistributionRecord>;
}

/// Popularity table, including the `Total` sentinel row.
pub trait PopularitySource: Send + Sync {
    /// Every row, sentinel included, in table order.
    fn all(&self) -> &[PopularityRecord];

    fn lookup(&self, key: &LookupKey) -> Lookup<PopularityRecord>;
}

/// Third-party project analytics, keyed by a service-specific alias.
pub trait AnalyticsSource: Send + Sync {
    fn lookup(&self, alias: &str) -> Lookup<AnalyticsRecord>;

    /// Human-readable page for the alias, if the service has one.
    fn page_url(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// Vulnerability tracker, keyed by source package name.
pub trait VulnerabilitySource: Send + Sync {
    fn lookup(&self, name: &str) -> Lookup<VulnerabilityRecord>;

    /// Human-readable tracker page for the name, if the tracker has one.
    fn page_url(&self, _name: &str) -> Option<String> {
        None
    }
}

/// The four adapters a run draws from.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    pub distribution: &'a dyn DistributionSource,
    pub popularity: &'a dyn PopularitySource,
    pub analytics: &'a dyn AnalyticsSource,
    pub vulnerabilities: &'a dyn VulnerabilitySource,
}

/// A source that knows nothing. Stands in for any adapter that was not
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl DistributionSource for NoSource {
    fn lookup(&self, _key: &LookupKey) -> Lookup<DistributionRecord> {
        Lookup::Absent
    }
}

impl PopularitySource for NoSource {
    fn all(&self) -> &[PopularityRecord] {
        &[]
    }

    fn lookup(&self, _key: &LookupKey) -> Lookup<PopularityRecord> {
        Lookup::Absent
    }
}

impl AnalyticsSource for NoSource {
    fn lookup(&self, _alias: &str) -> Lookup<AnalyticsRecord> {
        Lookup::Absent
    }
}

impl VulnerabilitySource for NoSource {
    fn lookup(&self, _name: &str) -> Lookup<VulnerabilityRecord> {
        Lookup::Absent
    }
}
