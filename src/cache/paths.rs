// Cache path utilities.
// Locates named cache stores on disk and derives entry file names from request keys.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Get the base cache directory (~/.cache/osgithub on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "osgithub").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding every entry of the store called `name`.
pub fn store_dir(root: &Path, name: &str) -> PathBuf {
    root.join(sanitize_name(name))
}

/// Path to the entry file for a cache key inside a store directory.
pub fn entry_path(store_dir: &Path, key: &CacheKey) -> PathBuf {
    store_dir.join(format!("{}.json", key.digest()))
}

/// Identity of a cached response: the full request URL and the credentials it was fetched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub url: String,
    pub authorization: Option<String>,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, authorization: Option<&str>) -> Self {
        Self {
            url: url.into(),
            authorization: authorization.map(str::to_string),
        }
    }

    /// Hex SHA-256 of the URL and Authorization header value.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_bytes());
        hasher.update(b"\n");
        if let Some(auth) = &self.authorization {
            hasher.update(auth.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
