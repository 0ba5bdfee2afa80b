//! Package profile builder
//!
//! Merges the four adapters' records and the operator's roster row into one
//! [`PackageProfile`]. Each attribute has exactly one designated source; no
//! source overrides another.
//!
//! Missing data never fails a build. A source with no record for the key
//! contributes explicit empty strings, and numeric fields fall back to their
//! worst-known value ([`WORST_RANK`] for popularity). The only per-package
//! failure is a key that cannot name a package at all
//! ([`RiskError::UnknownLookupKey`]).

use crate::adapters::Sources;
use crate::error::{RiskError, RiskResult};
use crate::models::{
    AnalyticsRecord, DistributionRecord, Lookup, LookupKey, OperatorFlags, PopularityRecord,
    RosterEntry, VulnerabilityRecord,
};
use serde::Serialize;
use tracing::warn;

/// Popularity rank assumed for packages missing from the popularity table.
/// Ranks below every percentile cut-off.
pub const WORST_RANK: u64 = u64::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionFacts {
    pub source: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
    pub implemented_in: String,
    pub role: String,
}

impl From<Option<DistributionRecord>> for DistributionFacts {
    fn from(record: Option<DistributionRecord>) -> Self {
        let r = record.unwrap_or_default();
        Self {
            source: r.source.unwrap_or_default(),
            version: r.version.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            homepage: r.homepage.unwrap_or_default(),
            implemented_in: r.implemented_in.unwrap_or_default(),
            role: r.role.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularityFacts {
    pub rank: u64,
    /// Raw install count, empty when unknown
    pub count: String,
}

impl PopularityFacts {
    pub fn is_ranked(&self) -> bool {
        self.rank != WORST_RANK
    }
}

impl Default for PopularityFacts {
    fn default() -> Self {
        Self {
            rank: WORST_RANK,
            count: String::new(),
        }
    }
}

impl From<Option<PopularityRecord>> for PopularityFacts {
    fn from(record: Option<PopularityRecord>) -> Self {
        match record {
            Some(r) => Self {
                rank: r.rank,
                count: r.count,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsFacts {
    pub page: String,
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub download_url: String,
    pub twelve_month_contributors: String,
    pub total_contributors: String,
    pub total_code_lines: String,
    pub main_language: String,
    pub licenses: Vec<String>,
    pub activity_note: String,
    pub age_note: String,
    pub comment_note: String,
    pub team_size_note: String,
}

impl From<Option<AnalyticsRecord>> for AnalyticsFacts {
    fn from(record: Option<AnalyticsRecord>) -> Self {
        let r = record.unwrap_or_default();
        Self {
            page: String::new(),
            name: r.name.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            homepage: r.homepage.unwrap_or_default(),
            download_url: r.download_url.unwrap_or_default(),
            twelve_month_contributors: r.twelve_month_contributors.unwrap_or_default(),
            total_contributors: r.total_contributors.unwrap_or_default(),
            total_code_lines: r.total_code_lines.unwrap_or_default(),
            main_language: r.main_language.unwrap_or_default(),
            licenses: r.licenses,
            activity_note: r.activity_note.unwrap_or_default(),
            age_note: r.age_note.unwrap_or_default(),
            comment_note: r.comment_note.unwrap_or_default(),
            team_size_note: r.team_size_note.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilityFacts {
    /// Decimal count, empty when the tracker had nothing to say
    pub count: String,
    pub page: String,
}

impl From<Option<VulnerabilityRecord>> for VulnerabilityFacts {
    fn from(record: Option<VulnerabilityRecord>) -> Self {
        Self {
            count: record.map(|r| r.count.to_string()).unwrap_or_default(),
            page: String::new(),
        }
    }
}

/// Everything known about one package, every field present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageProfile {
    pub key: LookupKey,
    pub distribution: DistributionFacts,
    pub popularity: PopularityFacts,
    pub analytics: AnalyticsFacts,
    pub vulnerabilities: VulnerabilityFacts,
    pub flags: OperatorFlags,
    pub comment: String,
}

impl PackageProfile {
    /// Profile with no source data at all.
    pub fn bare(key: impl Into<LookupKey>) -> Self {
        Self {
            key: key.into(),
            distribution: DistributionFacts::default(),
            popularity: PopularityFacts::default(),
            analytics: AnalyticsFacts::default(),
            vulnerabilities: VulnerabilityFacts::default(),
            flags: OperatorFlags::default(),
            comment: String::new(),
        }
    }
}

/// Raw adapter outputs for one package.
#[derive(Debug, Clone)]
pub struct SourceRecords {
    pub distribution: Lookup<DistributionRecord>,
    pub popularity: Lookup<PopularityRecord>,
    pub analytics: Lookup<AnalyticsRecord>,
    pub vulnerabilities: Lookup<VulnerabilityRecord>,
    pub analytics_page: Option<String>,
    pub vulnerability_page: Option<String>,
}

impl SourceRecords {
    /// Every source absent.
    pub fn empty() -> Self {
        Self {
            distribution: Lookup::Absent,
            popularity: Lookup::Absent,
            analytics: Lookup::Absent,
            vulnerabilities: Lookup::Absent,
            analytics_page: None,
            vulnerability_page: None,
        }
    }
}

/// A built profile plus the per-source failures met on the way.
#[derive(Debug, Clone)]
pub struct BuiltProfile {
    pub profile: PackageProfile,
    /// Only `AdapterUnavailable` entries
    pub warnings: Vec<RiskError>,
}

/// Name under which the vulnerability tracker knows a package: the first
/// word of the distribution `Source` field, else the package key.
pub fn vulnerability_lookup_name(key: &LookupKey, distribution_source: &str) -> String {
    distribution_source
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| key.as_str().to_string())
}

/// Ask every adapter about one roster entry.
pub fn gather(entry: &RosterEntry, sources: &Sources<'_>) -> RiskResult<SourceRecords> {
    ensure_resolvable(&entry.key)?;

    let distribution = sources.distribution.lookup(&entry.key);
    let source_field = match &distribution {
        Lookup::Found(record) => record.source.as_deref().unwrap_or_default(),
        _ => "",
    };
    let tracker_name = vulnerability_lookup_name(&entry.key, source_field);

    let alias = entry.analytics_alias.as_str();
    let analytics = if alias.is_empty() {
        Lookup::Absent
    } else {
        sources.analytics.lookup(alias)
    };

    Ok(SourceRecords {
        popularity: sources.popularity.lookup(&entry.key),
        analytics,
        analytics_page: sources.analytics.page_url(alias),
        vulnerabilities: sources.vulnerabilities.lookup(&tracker_name),
        vulnerability_page: sources.vulnerabilities.page_url(&tracker_name),
        distribution,
    })
}

/// Merge one package's records into a profile. Pure; no I/O.
pub fn build(entry: &RosterEntry, records: SourceRecords) -> RiskResult<BuiltProfile> {
    ensure_resolvable(&entry.key)?;

    let mut warnings = Vec::new();
    let key = entry.key.as_str();

    let distribution = settle(records.distribution, "distribution metadata", key, &mut warnings);
    let popularity = settle(records.popularity, "popularity table", key, &mut warnings);
    let analytics = settle(records.analytics, "project analytics", key, &mut warnings);
    let vulnerabilities = settle(
        records.vulnerabilities,
        "vulnerability tracker",
        key,
        &mut warnings,
    );

    let mut analytics = AnalyticsFacts::from(analytics);
    analytics.page = records.analytics_page.unwrap_or_default();
    let mut vulnerabilities = VulnerabilityFacts::from(vulnerabilities);
    vulnerabilities.page = records.vulnerability_page.unwrap_or_default();

    let profile = PackageProfile {
        key: entry.key.clone(),
        distribution: DistributionFacts::from(distribution),
        popularity: PopularityFacts::from(popularity),
        analytics,
        vulnerabilities,
        flags: entry.flags,
        comment: entry.comment.clone(),
    };

    Ok(BuiltProfile { profile, warnings })
}

/// Gather and build in one step.
pub fn build_from_sources(entry: &RosterEntry, sources: &Sources<'_>) -> RiskResult<BuiltProfile> {
    build(entry, gather(entry, sources)?)
}

fn ensure_resolvable(key: &LookupKey) -> RiskResult<()> {
    if key.is_resolvable() {
        Ok(())
    } else {
        Err(RiskError::UnknownLookupKey(key.as_str().to_string()))
    }
}

/// Collapse a lookup to an optional record, recording a failure as a warning.
fn settle<T>(
    lookup: Lookup<T>,
    adapter: &'static str,
    key: &str,
    warnings: &mut Vec<RiskError>,
) -> Option<T> {
    match lookup {
        Lookup::Found(record) => Some(record),
        Lookup::Absent => None,
        Lookup::Unavailable(reason) => {
            let err = RiskError::AdapterUnavailable {
                adapter,
                key: key.to_string(),
                reason,
            };
            warn!("{}", err);
            warnings.push(err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        AnalyticsSource, DistributionSource, NoSource, PopularitySource, VulnerabilitySource,
    };
    use std::sync::Mutex;

    fn curl_distribution() -> DistributionRecord {
        DistributionRecord {
            source: Some("curl (7.88.1-10)".into()),
            version: Some("7.88.1-10".into()),
            description: Some("command line tool".into()),
            homepage: Some("https://curl.se/".into()),
            implemented_in: Some("c".into()),
            role: Some("program".into()),
        }
    }

    #[test]
    fn test_build_merges_designated_sources() {
        let entry = RosterEntry::new("curl").with_comment("network facing");
        let records = SourceRecords {
            distribution: Lookup::Found(curl_distribution()),
            popularity: Lookup::Found(PopularityRecord {
                key: "curl".into(),
                rank: 120,
                count: "150000".into(),
            }),
            analytics: Lookup::Found(AnalyticsRecord {
                homepage: Some("https://curl.se".into()),
                twelve_month_contributors: Some("98".into()),
                licenses: vec!["MIT".into()],
                ..Default::default()
            }),
            vulnerabilities: Lookup::Found(VulnerabilityRecord { count: 12 }),
            analytics_page: Some("https://www.openhub.net/projects/curl".into()),
            vulnerability_page: Some("https://tracker/curl".into()),
        };

        let built = build(&entry, records).unwrap();
        assert!(built.warnings.is_empty());
        let p = built.profile;
        assert_eq!(p.distribution.version, "7.88.1-10");
        assert_eq!(p.distribution.homepage, "https://curl.se/");
        assert_eq!(p.analytics.homepage, "https://curl.se");
        assert_eq!(p.popularity.rank, 120);
        assert_eq!(p.popularity.count, "150000");
        assert_eq!(p.analytics.twelve_month_contributors, "98");
        assert_eq!(p.analytics.page, "https://www.openhub.net/projects/curl");
        assert_eq!(p.vulnerabilities.count, "12");
        assert_eq!(p.vulnerabilities.page, "https://tracker/curl");
        assert_eq!(p.comment, "network facing");
    }

    #[test]
    fn test_absent_sources_default_to_empty_and_worst_rank() {
        let built = build(&RosterEntry::new("obscure"), SourceRecords::empty()).unwrap();
        assert!(built.warnings.is_empty());
        let p = built.profile;
        assert_eq!(p.distribution, DistributionFacts::default());
        assert_eq!(p.analytics, AnalyticsFacts::default());
        assert_eq!(p.popularity.rank, WORST_RANK);
        assert!(!p.popularity.is_ranked());
        assert_eq!(p.popularity.count, "");
        assert_eq!(p.vulnerabilities.count, "");
    }

    #[test]
    fn test_unavailable_sources_become_warnings() {
        let mut records = SourceRecords::empty();
        records.analytics = Lookup::Unavailable("HTTP 503".into());
        records.vulnerabilities = Lookup::Unavailable("timeout".into());

        let built = build(&RosterEntry::new("curl"), records).unwrap();
        assert_eq!(built.warnings.len(), 2);
        assert!(matches!(
            &built.warnings[0],
            RiskError::AdapterUnavailable { adapter: "project analytics", .. }
        ));
        assert_eq!(built.profile.vulnerabilities.count, "");
        assert_eq!(built.profile.analytics.main_language, "");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = build(&RosterEntry::new("not a package"), SourceRecords::empty()).unwrap_err();
        assert_eq!(err, RiskError::UnknownLookupKey("not a package".into()));
    }

    #[test]
    fn test_vulnerability_lookup_name() {
        let key = LookupKey::from("libssl3");
        assert_eq!(vulnerability_lookup_name(&key, "openssl (3.0.11-1)"), "openssl");
        assert_eq!(vulnerability_lookup_name(&key, ""), "libssl3");
        assert_eq!(vulnerability_lookup_name(&key, "   "), "libssl3");
    }

    /// Records which names each adapter was asked about.
    #[derive(Default)]
    struct Spy {
        asked: Mutex<Vec<String>>,
    }

    impl DistributionSource for Spy {
        fn lookup(&self, key: &LookupKey) -> Lookup<DistributionRecord> {
            self.asked.lock().unwrap().push(format!("dist:{key}"));
            Lookup::Found(DistributionRecord {
                source: Some("openssl (3.0)".into()),
                ..Default::default()
            })
        }
    }

    impl AnalyticsSource for Spy {
        fn lookup(&self, alias: &str) -> Lookup<AnalyticsRecord> {
            self.asked.lock().unwrap().push(format!("analytics:{alias}"));
            Lookup::Absent
        }
    }

    impl VulnerabilitySource for Spy {
        fn lookup(&self, name: &str) -> Lookup<VulnerabilityRecord> {
            self.asked.lock().unwrap().push(format!("vuln:{name}"));
            Lookup::Found(VulnerabilityRecord { count: 1 })
        }
    }

    #[test]
    fn test_gather_routes_keys_to_adapters() {
        let spy = Spy::default();
        let sources = Sources {
            distribution: &spy,
            popularity: &NoSource,
            analytics: &spy,
            vulnerabilities: &spy,
        };

        let entry = RosterEntry::new("libssl3");
        let records = gather(&entry, &sources).unwrap();
        assert!(records.distribution.is_found());
        assert_eq!(records.popularity, Lookup::Absent);
        // Empty alias short-circuits the analytics adapter
        assert_eq!(
            *spy.asked.lock().unwrap(),
            vec!["dist:libssl3".to_string(), "vuln:openssl".to_string()]
        );

        let entry = RosterEntry::new("libssl3").with_alias("OpenSSL");
        gather(&entry, &sources).unwrap();
        assert!(spy
            .asked
            .lock()
            .unwrap()
            .contains(&"analytics:openssl".to_string()));
    }

    #[test]
    fn test_gather_rejects_unknown_key_before_asking() {
        let spy = Spy::default();
        let sources = Sources {
            distribution: &spy,
            popularity: &NoSource,
            analytics: &spy,
            vulnerabilities: &spy,
        };
        assert!(gather(&RosterEntry::new("a/b"), &sources).is_err());
        assert!(spy.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_from_sources_with_nothing_configured() {
        let sources = Sources {
            distribution: &NoSource,
            popularity: &NoSource,
            analytics: &NoSource,
            vulnerabilities: &NoSource,
        };
        let built = build_from_sources(&RosterEntry::new("zsh"), &sources).unwrap();
        assert_eq!(built.profile, {
            let mut p = PackageProfile::bare("zsh");
            p.flags = OperatorFlags::default();
            p
        });
    }
}
