// Named, file-backed HTTP response cache.
// One JSON file per (URL, credentials) key, with expiry checked on every read.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::Result;

use super::expiry::Expiry;
use super::paths::{self, CacheKey};

/// A stored response with its freshness metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Full request URL, including the query string.
    pub url: String,
    pub status: u16,
    pub body: String,
    /// When the response was stored.
    pub cached_at: DateTime<Utc>,
    /// When the response goes stale; `None` means never.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>, expiry: Expiry) -> Self {
        let cached_at = Utc::now();
        Self {
            url: url.into(),
            status,
            body: body.into(),
            cached_at,
            expires_at: expiry.expires_at(cached_at),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A cache store persisted under `<root>/<name>/`, shared by every client opened with the same name.
#[derive(Debug, Clone)]
pub struct CacheStore {
    name: String,
    dir: PathBuf,
}

impl CacheStore {
    /// Open (creating if needed) the store called `name` under `root`.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        let dir = paths::store_dir(root, name);
        fs::create_dir_all(&dir)?;
        info!(name, dir = %dir.display(), "Opened HTTP cache store");
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh entry for `key`, if any. Stale and unreadable entries are removed.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>> {
        let path = paths::entry_path(&self.dir, key);
        let Some(entry) = self.read_entry(&path)? else {
            return Ok(None);
        };

        if entry.is_expired() {
            debug!(url = %entry.url, "Cache entry expired");
            delete(&path)?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Store a response under `key`. Non-cacheable expiries are ignored.
    pub fn put(&self, key: &CacheKey, status: u16, body: &str, expiry: Expiry) -> Result<()> {
        if !expiry.is_cacheable() {
            return Ok(());
        }
        let entry = CachedResponse::new(key.url.clone(), status, body, expiry);
        write_entry(&paths::entry_path(&self.dir, key), &entry)
    }

    /// URLs of every entry currently on disk, fresh or not.
    pub fn urls(&self) -> Result<Vec<String>> {
        let mut urls: Vec<String> = self
            .entries()?
            .into_iter()
            .map(|(_, entry)| entry.url)
            .collect();
        urls.sort();
        urls.dedup();
        Ok(urls)
    }

    /// Delete every entry stored for `url`, whatever credentials fetched it.
    pub fn delete_url(&self, url: &str) -> Result<usize> {
        self.delete_where(|entry_url| entry_url == url)
    }

    /// Delete every entry whose URL satisfies `pred`. Returns the number removed.
    pub fn delete_where(&self, pred: impl Fn(&str) -> bool) -> Result<usize> {
        let mut removed = 0;
        for (path, entry) in self.entries()? {
            if pred(&entry.url) {
                delete(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove all entries, keeping the store directory.
    pub fn clear(&self) -> Result<()> {
        let removed = self.delete_where(|_| true)?;
        info!(name = %self.name, removed, "Cleared HTTP cache store");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(PathBuf, CachedResponse)>> {
        let mut entries = Vec::new();
        if !self.dir.exists() {
            return Ok(entries);
        }
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(entry) = self.read_entry(&path)? {
                entries.push((path, entry));
            }
        }
        Ok(entries)
    }

    fn read_entry(&self, path: &Path) -> Result<Option<CachedResponse>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache entry");
                delete(path)?;
                Ok(None)
            }
        }
    }
}

fn write_entry(path: &Path, entry: &CachedResponse) -> Result<()> {
    write_json(path, entry)
}

/// Serialize to a uniquely named temp file beside `path`, then rename over it.
/// Concurrent writers of one key each rename their own complete file; the last one wins.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(json.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Remove a file; already gone counts as success.
fn delete(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
