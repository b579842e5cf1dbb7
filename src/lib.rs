// GitHub repository client with a persistent response cache.
// Requests go through a named on-disk cache whose lifetime is resolved per URL pattern.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;

pub use cache::{Expiry, ExpiryPolicy};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use github::{
    Branch, ContentFile, ContentType, Contents, FetchType, GitHubClient, PullRequest,
    PullRequestState, Repository,
};
