// Cache module for persisted HTTP responses.
// Resolves per-URL expiry and stores GitHub API responses on disk across processes.

pub mod expiry;
pub mod paths;
pub mod store;

pub use expiry::{Expiry, ExpiryPolicy, resolve_expiry, url_matches};
pub use paths::{CacheKey, cache_dir};
pub use store::{CacheStore, CachedResponse};
