// Client configuration.
// Explicit settings for a GitHubClient, optionally assembled once from the environment.

use std::path::PathBuf;

use url::Url;

use crate::cache::{Expiry, ExpiryPolicy};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_CACHE_NAME: &str = "http_cache";

pub const USER_AGENT_VAR: &str = "GITHUB_USER_AGENT";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const CACHE_NAME_VAR: &str = "REQUESTS_CACHE_NAME";

/// Settings used to construct a [`GitHubClient`](crate::GitHubClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Required; construction fails without it.
    pub user_agent: Option<String>,
    pub token: Option<String>,
    pub use_cache: bool,
    /// Expiry for requests matching none of `urls_expire_after`.
    pub expire_after: Expiry,
    /// Ordered glob patterns; the first match decides a request's expiry.
    pub urls_expire_after: Vec<(String, Expiry)>,
    pub cache_name: String,
    /// Root for cache stores; defaults to the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub base_url: Url,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            token: None,
            use_cache: true,
            expire_after: Expiry::Never,
            urls_expire_after: Vec::new(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_dir: None,
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    /// Defaults with user agent, token and cache name taken from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with user agent, token and cache name taken from `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            user_agent: get(USER_AGENT_VAR),
            token: get(TOKEN_VAR),
            cache_name: get(CACHE_NAME_VAR).unwrap_or_else(|| DEFAULT_CACHE_NAME.to_string()),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_expire_after(mut self, expiry: impl Into<Expiry>) -> Self {
        self.expire_after = expiry.into();
        self
    }

    /// Append an override; earlier patterns take precedence.
    pub fn with_url_expiry(mut self, pattern: impl Into<String>, expiry: impl Into<Expiry>) -> Self {
        self.urls_expire_after.push((pattern.into(), expiry.into()));
        self
    }

    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.expire_after, self.urls_expire_after.clone())
    }
}

fn default_base_url() -> Url {
    Url::parse(GITHUB_API_BASE).expect("GitHub API base URL is valid")
}
