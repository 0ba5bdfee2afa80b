//! Distribution metadata adapter
//!
//! Reads the `apt-cache dumpavail` text dump: RFC-822 style blocks separated
//! by blank lines, one block per binary package.
//!
//! ```text
//! Package: curl
//! Source: curl (7.88.1-10)
//! Version: 7.88.1-10+deb12u5
//! Description: command line tool for transferring data with URL syntax
//! Homepage: https://curl.se/
//! Tag: implemented-in::c, interface::commandline, network::client,
//!  protocol::ftp, protocol::http, role::program
//! ```

use super::DistributionSource;
use crate::models::{DistributionRecord, Lookup, LookupKey};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const PACKAGE_FIELD: &str = "Package:";
const IMPLEMENTED_IN_TAG: &str = "implemented-in::";
const ROLE_TAG: &str = "role::";

/// All package blocks of a dump, keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct DistributionIndex {
    packages: HashMap<LookupKey, DistributionRecord>,
}

impl DistributionIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read distribution dump {}", path.display()))?;
        let index = Self::parse(&content);
        debug!(
            "Parsed {} distribution packages from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn parse(content: &str) -> Self {
        let mut packages = HashMap::new();
        let mut current: Option<(LookupKey, DistributionRecord)> = None;

        for line in content.lines() {
            if line.trim().is_empty() {
                if let Some((key, record)) = current.take() {
                    packages.insert(key, record);
                }
                continue;
            }

            if let Some(name) = line.strip_prefix(PACKAGE_FIELD) {
                if let Some((key, record)) = current.take() {
                    packages.insert(key, record);
                }
                current = Some((LookupKey::normalize(name), DistributionRecord::default()));
                continue;
            }

            // Fields before the first `Package:` line belong to nothing
            let Some((_, record)) = current.as_mut() else {
                continue;
            };

            if let Some(value) = field_value(line, "Source:") {
                record.source = value;
            } else if let Some(value) = field_value(line, "Version:") {
                record.version = value;
            } else if let Some(value) = field_value(line, "Description:") {
                record.description = value;
            } else if let Some(value) = field_value(line, "Homepage:") {
                record.homepage = value;
            }

            // Debtags may sit on `Tag:` or on its continuation lines
            if let Some(value) = tag_value(line, IMPLEMENTED_IN_TAG) {
                record.implemented_in = Some(value);
            }
            if let Some(value) = tag_value(line, ROLE_TAG) {
                record.role = Some(value);
            }
        }

        if let Some((key, record)) = current {
            packages.insert(key, record);
        }

        Self { packages }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl DistributionSource for DistributionIndex {
    fn lookup(&self, key: &LookupKey) -> Lookup<DistributionRecord> {
        match self.packages.get(key) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::Absent,
        }
    }
}

/// `Some(None)` for a present-but-blank field, `None` if the line is another field.
fn field_value(line: &str, field: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix(field)?;
    let value = rest.trim();
    Some((!value.is_empty()).then(|| value.to_string()))
}

/// Value of a `facet::value` debtag, up to the next comma or end of line.
fn tag_value(line: &str, tag: &str) -> Option<String> {
    let start = line.find(tag)? + tag.len();
    let rest = &line[start..];
    let value = match rest.find(',') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
