//! Project analytics adapter (OpenHub)
//!
//! Fetches `https://www.openhub.net/projects/<alias>.xml` through the
//! document cache and extracts the fields the risk rubric and the report
//! use. Without an API key only cached documents are served.

use super::xml::{self, Element};
use super::AnalyticsSource;
use crate::cache::{DocumentCache, DocumentRequest};
use crate::models::{AnalyticsRecord, Lookup};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.openhub.net/projects";
/// Cache subdirectory for project documents
pub const NAMESPACE: &str = "openhub";

const FACTOID_ACTIVITY: &str = "FactoidActivity";
const FACTOID_AGE: &str = "FactoidAge";
const FACTOID_COMMENTS: &str = "FactoidComments";
const FACTOID_TEAM_SIZE: &str = "FactoidTeamSize";

#[derive(Clone)]
pub struct OpenHubClient {
    cache: DocumentCache,
    api_key: Option<String>,
    base_url: String,
}

impl OpenHubClient {
    pub fn new(cache: DocumentCache, api_key: Option<String>) -> Self {
        Self {
            cache,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request(&self, alias: &str) -> DocumentRequest {
        let request = DocumentRequest::new(
            NAMESPACE,
            format!("{}/{}.xml", self.base_url, alias),
            "xml",
        );
        match &self.api_key {
            Some(key) => request.with_credential("api_key", key.clone()),
            None => request,
        }
    }

    fn document(&self, alias: &str) -> Result<String, String> {
        let request = self.request(alias);
        if self.api_key.is_none() {
            return match self.cache.cached(&request) {
                Ok(Some(doc)) => Ok(doc),
                Ok(None) => Err("no API key configured and document not cached".to_string()),
                Err(e) => Err(e.to_string()),
            };
        }
        self.cache.get(&request).map_err(|e| e.to_string())
    }
}

impl AnalyticsSource for OpenHubClient {
    fn lookup(&self, alias: &str) -> Lookup<AnalyticsRecord> {
        if alias.is_empty() {
            return Lookup::Absent;
        }
        let document = match self.document(alias) {
            Ok(doc) => doc,
            Err(reason) => return Lookup::Unavailable(reason),
        };
        match parse_project(&document) {
            Ok(record) => {
                debug!("Analytics record for '{}' parsed", alias);
                Lookup::Found(record)
            }
            Err(reason) => Lookup::Unavailable(reason),
        }
    }

    fn page_url(&self, alias: &str) -> Option<String> {
        (!alias.is_empty()).then(|| format!("{}/{}", self.base_url, alias))
    }
}

/// Extract an [`AnalyticsRecord`] from a project XML response.
pub fn parse_project(document: &str) -> Result<AnalyticsRecord, String> {
    let root = xml::parse(document).map_err(|e| format!("malformed analytics XML: {}", e))?;

    if let Some(status) = root.find("status") {
        if status.text() != "success" {
            let detail = root.find("error").map(|e| e.text()).unwrap_or_default();
            return Err(format!("analytics service status '{}' {}", status.text(), detail)
                .trim_end()
                .to_string());
        }
    }

    let Some(project) = root.find("result/project") else {
        return Err("analytics response has no project".to_string());
    };

    let mut record = AnalyticsRecord {
        name: text_at(project, "name"),
        description: text_at(project, "description"),
        homepage: text_at(project, "homepage_url"),
        download_url: text_at(project, "download_url"),
        twelve_month_contributors: text_at(project, "analysis/twelve_month_contributor_count"),
        total_contributors: text_at(project, "analysis/total_contributor_count"),
        total_code_lines: text_at(project, "analysis/total_code_lines"),
        main_language: text_at(project, "analysis/main_language_name"),
        licenses: project
            .find_all("licenses/license/name")
            .into_iter()
            .map(|e| e.text().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        ..Default::default()
    };

    for factoid in project.find_all("analysis/factoids/factoid") {
        let kind = factoid.attribute("type").unwrap_or_default();
        let note = Some(factoid.text().to_string());
        if kind.contains(FACTOID_ACTIVITY) {
            record.activity_note = note;
        } else if kind.contains(FACTOID_AGE) {
            record.age_note = note;
        } else if kind.contains(FACTOID_COMMENTS) {
            record.comment_note = note;
        } else if kind.contains(FACTOID_TEAM_SIZE) {
            record.team_size_note = note;
        }
    }

    Ok(record)
}

/// Text of a child element, if the element is present.
fn text_at(element: &Element, path: &str) -> Option<String> {
    element.find(path).map(|e| e.text().to_string())
}
