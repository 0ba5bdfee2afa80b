//! Vulnerability tracker adapter (Debian security tracker)
//!
//! Counts the distinct CVE identifiers linked from a source package's
//! tracker page whose year is at or after the configured epoch.

use super::VulnerabilitySource;
use crate::cache::{DocumentCache, DocumentRequest};
use crate::models::{Lookup, VulnerabilityRecord};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://security-tracker.debian.org/tracker/source-package";
pub const DEFAULT_EPOCH_YEAR: u16 = 2010;
/// Cache subdirectory for tracker pages
pub const NAMESPACE: &str = "security-tracker";

static CVE_LINK: OnceLock<Regex> = OnceLock::new();

fn cve_link_pattern() -> &'static Regex {
    CVE_LINK.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["']?[^"'>\s]*?\b(CVE-(\d{4})-\d{4,})"#).expect("valid regex")
    })
}

#[derive(Clone)]
pub struct SecurityTracker {
    cache: DocumentCache,
    epoch_year: u16,
    base_url: String,
}

impl SecurityTracker {
    pub fn new(cache: DocumentCache, epoch_year: u16) -> Self {
        Self {
            cache,
            epoch_year,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn request(&self, name: &str) -> DocumentRequest {
        DocumentRequest::new(NAMESPACE, format!("{}/{}", self.base_url, name), "html")
    }
}

impl VulnerabilitySource for SecurityTracker {
    fn lookup(&self, name: &str) -> Lookup<VulnerabilityRecord> {
        if name.is_empty() {
            return Lookup::Absent;
        }
        match self.cache.get(&self.request(name)) {
            Ok(page) => {
                let count = count_cves_since(&page, self.epoch_year);
                debug!("{} CVEs since {} for '{}'", count, self.epoch_year, name);
                Lookup::Found(VulnerabilityRecord { count })
            }
            Err(e) => Lookup::Unavailable(e.to_string()),
        }
    }

    fn page_url(&self, name: &str) -> Option<String> {
        (!name.is_empty()).then(|| format!("{}/{}", self.base_url, name))
    }
}

/// Distinct CVE ids linked from `page` with year >= `epoch_year`.
pub fn count_cves_since(page: &str, epoch_year: u16) -> u32 {
    let ids: BTreeSet<String> = cve_link_pattern()
        .captures_iter(page)
        .filter(|c| c[2].parse::<u16>().is_ok_and(|year| year >= epoch_year))
        .map(|c| c[1].to_uppercase())
        .collect();
    ids.len() as u32
}
