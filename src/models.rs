//! Core data models for pkgrisk
//!
//! These models are shared by the adapters, the profile builder and the
//! scoring engine. Source records are sparse: every field is optional and a
//! whole record may be absent. Absence is a normal state, not an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-normalized package identifier used to join records across sources.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupKey(String);

impl LookupKey {
    /// Trim surrounding whitespace and lower-case.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the key can name a distribution package at all.
    ///
    /// Package names are non-empty and limited to `[a-z0-9+.-]`, starting
    /// with an alphanumeric. A key that fails this has no identity mapping in
    /// any source.
    pub fn is_resolvable(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

/// Operator-supplied risk flags for one package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorFlags {
    /// Directly reachable from the network (listens on a socket, etc.)
    pub direct_network_exposure: bool,
    /// Parses or otherwise processes data that arrived over the network
    pub processes_network_data: bool,
    /// Runs with, or can grant, elevated privileges
    pub privilege_escalation: bool,
}

/// One row of the operator roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub key: LookupKey,
    /// Analytics-service slug; empty when the project has none.
    pub analytics_alias: String,
    pub flags: OperatorFlags,
    pub comment: String,
}

impl RosterEntry {
    pub fn new(key: impl Into<LookupKey>) -> Self {
        Self {
            key: key.into(),
            analytics_alias: String::new(),
            flags: OperatorFlags::default(),
            comment: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.analytics_alias = alias.trim().to_lowercase();
        self
    }

    pub fn with_flags(mut self, flags: OperatorFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Outcome of a single adapter call.
///
/// `Absent` is the normal "the source knows nothing about this key" case and
/// is silently defaulted. `Unavailable` means the source could not be asked
/// (fetch failed, document malformed); it is logged and then defaulted the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Absent,
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::Absent | Lookup::Unavailable(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(record) => Lookup::Found(f(record)),
            Lookup::Absent => Lookup::Absent,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }
}

/// Distribution package database entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub source: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub implemented_in: Option<String>,
    pub role: Option<String>,
}

/// Row of the popularity (install count) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityRecord {
    pub key: LookupKey,
    pub rank: u64,
    /// Raw install count column, kept verbatim.
    pub count: String,
}

/// Project analytics feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub download_url: Option<String>,
    pub twelve_month_contributors: Option<String>,
    pub total_contributors: Option<String>,
    pub total_code_lines: Option<String>,
    pub main_language: Option<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    pub activity_note: Option<String>,
    pub age_note: Option<String>,
    pub comment_note: Option<String>,
    pub team_size_note: Option<String>,
}

/// Vulnerability tracker result for one source package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// Entries since the configured epoch year
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_normalizes_case_and_whitespace() {
        assert_eq!(LookupKey::normalize("  OpenSSL \t").as_str(), "openssl");
        assert_eq!(LookupKey::from("Bash"), LookupKey::normalize("bash"));
    }

    #[test]
    fn test_lookup_key_resolvable() {
        assert!(LookupKey::from("libc6").is_resolvable());
        assert!(LookupKey::from("g++").is_resolvable());
        assert!(LookupKey::from("python3.11-dev").is_resolvable());
        assert!(!LookupKey::from("").is_resolvable());
        assert!(!LookupKey::from("-foo").is_resolvable());
        assert!(!LookupKey::from("foo bar").is_resolvable());
        assert!(!LookupKey::from("../etc/passwd").is_resolvable());
    }

    #[test]
    fn test_lookup_found_and_map() {
        let hit: Lookup<u32> = Lookup::Found(3);
        assert!(hit.is_found());
        assert_eq!(hit.map(|n| n * 2).found(), Some(6));

        let miss: Lookup<u32> = Lookup::Absent;
        assert_eq!(miss.found(), None);

        let down: Lookup<u32> = Lookup::Unavailable("timeout".into());
        assert!(!down.is_found());
        assert_eq!(down.map(|n| n + 1), Lookup::Unavailable("timeout".into()));
    }

    #[test]
    fn test_roster_entry_alias_is_normalized() {
        let entry = RosterEntry::new("Curl").with_alias(" cURL ");
        assert_eq!(entry.key.as_str(), "curl");
        assert_eq!(entry.analytics_alias, "curl");
    }
}
