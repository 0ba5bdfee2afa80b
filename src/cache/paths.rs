//! Cache path utilities - documents live under ~/.cache/pkgrisk/<namespace>/

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Default cache root.
/// Uses ~/.cache/pkgrisk/ on Unix, %LOCALAPPDATA%/pkgrisk/ on Windows.
pub fn default_cache_dir() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            // Fallback to ~/.cache
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("pkgrisk")
}

/// Path of the cached copy of `url` inside `root/namespace`.
pub fn document_path(root: &Path, namespace: &str, url: &str, extension: &str) -> PathBuf {
    root.join(namespace)
        .join(format!("{}.{}", cache_key(url), extension))
}

/// Stable, filesystem-safe name for a URL.
///
/// Readable slug from the last path segment plus a SHA-256 prefix of the
/// whole URL. SHA-256 rather than `DefaultHasher` so names survive compiler
/// upgrades.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();

    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let slug: String = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("doc")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .take(40)
        .collect();
    let slug = if slug.is_empty() { "doc".to_string() } else { slug };

    format!("{}-{}", slug, hash)
}
