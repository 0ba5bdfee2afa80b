//! Document cache for remote sources
//!
//! Every remote document (analytics XML, vulnerability tracker HTML) is
//! fetched with a plain HTTP GET and persisted on disk, keyed by its URL. A
//! cached copy is always preferred, so repeated runs are idempotent and the
//! data is a point-in-time snapshot refreshed out of band (`pkgrisk clean`).

pub mod paths;

pub use paths::{cache_key, default_cache_dir, document_path};

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network access disabled and {0} is not cached")]
    Offline(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A remote document and where its cached copy lives.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    /// Cache subdirectory, one per source
    pub namespace: &'static str,
    /// Public URL; also the cache key
    pub url: String,
    /// Query parameter appended on the wire only (API keys)
    pub credential: Option<(&'static str, String)>,
    pub extension: &'static str,
}

impl DocumentRequest {
    pub fn new(namespace: &'static str, url: impl Into<String>, extension: &'static str) -> Self {
        Self {
            namespace,
            url: url.into(),
            credential: None,
            extension,
        }
    }

    pub fn with_credential(mut self, param: &'static str, value: impl Into<String>) -> Self {
        self.credential = Some((param, value.into()));
        self
    }

    fn wire_url(&self) -> String {
        match &self.credential {
            Some((param, value)) => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", self.url, sep, param, value)
            }
            None => self.url.clone(),
        }
    }
}

/// Thread-safe fetch-through document cache
#[derive(Clone)]
pub struct DocumentCache {
    root: PathBuf,
    /// `None` when network access is disabled
    agent: Option<ureq::Agent>,
}

impl DocumentCache {
    /// Cache that may fetch missing documents over HTTP.
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        // Sync HTTP via ureq; non-2xx statuses are inspected, not raised
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            root: root.into(),
            agent: Some(agent),
        }
    }

    /// Cache that only serves what is already on disk.
    pub fn offline(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            agent: None,
        }
    }

    pub fn path_for(&self, request: &DocumentRequest) -> PathBuf {
        document_path(&self.root, request.namespace, &request.url, request.extension)
    }

    /// Cached copy only; never touches the network.
    pub fn cached(&self, request: &DocumentRequest) -> Result<Option<String>, FetchError> {
        let path = self.path_for(request);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Cache hit for {} ({})", request.url, path.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::Io(e)),
        }
    }

    /// Cached copy, or fetch and persist it.
    pub fn get(&self, request: &DocumentRequest) -> Result<String, FetchError> {
        if let Some(content) = self.cached(request)? {
            return Ok(content);
        }
        let Some(agent) = &self.agent else {
            return Err(FetchError::Offline(request.url.clone()));
        };

        debug!("Cache miss, fetching {}", request.url);
        let response = agent
            .get(&request.wire_url())
            .call()
            .map_err(|e| FetchError::Transport {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                status,
                url: request.url.clone(),
            });
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Transport {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        // The body is good even if the cache copy is not
        if let Err(e) = self.store(request, &body) {
            warn!("Failed to cache {}: {}", request.url, e);
        }
        Ok(body)
    }

    /// Persist a document. Each writer gets its own temp file in the target
    /// directory, then renames it into place, so readers never see a partial
    /// file and concurrent writers of the same URL never collide.
    pub fn store(&self, request: &DocumentRequest, content: &str) -> Result<PathBuf, FetchError> {
        let path = self.path_for(request);
        let dir = path.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path).map_err(|e| FetchError::Io(e.error))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DocumentRequest {
        DocumentRequest::new(
            "tracker",
            "https://security-tracker.debian.org/tracker/source-package/zlib",
            "html",
        )
    }

    #[test]
    fn test_offline_miss_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::offline(dir.path());
        assert!(matches!(cache.get(&request()), Err(FetchError::Offline(_))));
        assert!(cache.cached(&request()).unwrap().is_none());
    }

    #[test]
    fn test_store_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::offline(dir.path());
        let path = cache.store(&request(), "<html>ok</html>").unwrap();
        assert!(path.starts_with(dir.path().join("tracker")));
        assert_eq!(cache.get(&request()).unwrap(), "<html>ok</html>");
    }

    #[test]
    fn test_concurrent_store_same_document() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::offline(dir.path());
        let body = "<tr>CVE-2024-0001</tr>\n".repeat(50_000);

        let failures: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        (0..10)
                            .filter(|_| cache.store(&request(), &body).is_err())
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(failures, 0);
        assert_eq!(cache.get(&request()).unwrap(), body);
        // No temp files left beside the document
        let entries = std::fs::read_dir(dir.path().join("tracker")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_credential_not_part_of_cache_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::offline(dir.path());
        let plain = DocumentRequest::new("analytics", "https://h/projects/curl.xml", "xml");
        let keyed = plain.clone().with_credential("api_key", "secret");
        assert_eq!(cache.path_for(&plain), cache.path_for(&keyed));
        assert_eq!(keyed.wire_url(), "https://h/projects/curl.xml?api_key=secret");
        assert!(!cache.path_for(&keyed).to_string_lossy().contains("secret"));
    }

    #[test]
    fn test_wire_url_with_existing_query() {
        let req = DocumentRequest::new("a", "https://h/p?x=1", "xml").with_credential("k", "v");
        assert_eq!(req.wire_url(), "https://h/p?x=1&k=v");
    }
}
