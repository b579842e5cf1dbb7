// GitHub API HTTP client.
// Handles authentication headers, cached GET requests, and status-to-error mapping.

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::cache::{self, CacheKey, CacheStore, ExpiryPolicy};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

use super::repo::Repository;
use super::types::ApiErrorBody;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// A response body with its status, from the network or the cache store.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
    pub from_cache: bool,
}

/// GitHub API client with an optional persistent response cache.
pub struct GitHubClient {
    client: Client,
    authorization: Option<String>,
    base_url: Url,
    expiry: ExpiryPolicy,
    cache: Option<CacheStore>,
}

impl GitHubClient {
    /// Create a client from explicit configuration.
    ///
    /// Fails with [`Error::Configuration`] when no user agent is set or the
    /// base URL cannot hold path segments. When
    /// caching is enabled the named cache store is opened (and created if needed).
    pub fn new(config: ClientConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .as_deref()
            .filter(|ua| !ua.is_empty())
            .ok_or_else(|| Error::Configuration("a user agent is required".to_string()))?;
        if config.base_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "base URL {} cannot carry API paths",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| Error::Configuration(format!("invalid user agent: {}", e)))?,
        );

        let authorization = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|token| format!("Bearer {}", token));
        if let Some(auth) = &authorization {
            let mut value = HeaderValue::from_str(auth)
                .map_err(|e| Error::Configuration(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(Error::Network)?;

        let cache = if config.use_cache {
            let root = match config.cache_dir.clone() {
                Some(dir) => dir,
                None => cache::cache_dir().ok_or_else(|| {
                    Error::Configuration("could not determine a cache directory".to_string())
                })?,
            };
            Some(CacheStore::open(&root, &config.cache_name)?)
        } else {
            None
        };

        Ok(Self {
            client,
            authorization,
            base_url: config.base_url.clone(),
            expiry: config.expiry_policy(),
            cache,
        })
    }

    /// Create a client from GITHUB_USER_AGENT, GITHUB_TOKEN and REQUESTS_CACHE_NAME.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Handle for `owner/name`. Performs no I/O.
    pub fn get_repo(&self, full_name: &str) -> Result<Repository<'_>> {
        let invalid = || Error::InvalidRepoName(full_name.to_string());
        let (owner, name) = full_name.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Repository::new(self, owner, name))
    }

    /// The cache store, when caching is enabled.
    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    pub fn expiry_policy(&self) -> &ExpiryPolicy {
        &self.expiry
    }

    /// API URL for path segments (each percent-encoded) and query parameters.
    pub fn api_url(&self, segments: &[&str], params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects base URLs without path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    /// GET an API path and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.get(self.api_url(segments, params)).await?;
        let response = check_response(response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// GET a URL through the cache. Only 200 responses are stored.
    pub async fn get(&self, url: Url) -> Result<HttpResponse> {
        let expiry = self.expiry.resolve(url.as_str());
        let key = CacheKey::new(url.as_str(), self.authorization.as_deref());

        if let Some(store) = self.cache.as_ref().filter(|_| expiry.is_cacheable()) {
            if let Some(hit) = store.get(&key)? {
                debug!(url = %url, "Cache hit");
                return Ok(HttpResponse {
                    url: hit.url,
                    status: StatusCode::from_u16(hit.status).unwrap_or(StatusCode::OK),
                    body: hit.body,
                    from_cache: true,
                });
            }
            debug!(url = %url, ?expiry, "Cache miss");
        }

        debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK {
            if let Some(store) = &self.cache {
                store.put(&key, status.as_u16(), &body, expiry)?;
            }
        }

        Ok(HttpResponse {
            url: url.to_string(),
            status,
            body,
            from_cache: false,
        })
    }
}

/// Check response status and convert errors.
fn check_response(response: HttpResponse) -> Result<HttpResponse> {
    if response.status.is_success() {
        return Ok(response);
    }

    let parsed: ApiErrorBody = serde_json::from_str(&response.body).unwrap_or_default();
    if response.status == StatusCode::FORBIDDEN
        && parsed
            .errors
            .iter()
            .any(|e| e.code.as_deref() == Some("too_large"))
    {
        return Err(Error::FileTooLarge { url: response.url });
    }

    let message = parsed.message.unwrap_or_else(|| {
        if response.body.is_empty() {
            response
                .status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            response.body.clone()
        }
    });
    Err(Error::Remote {
        status: response.status,
        message,
        body: response.body,
    })
}
