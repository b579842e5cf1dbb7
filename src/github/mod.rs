// GitHub API module.
// Provides the cached client, repository handle, and response types for the GitHub REST API.

pub mod client;
pub mod repo;
pub mod types;

pub use client::{GitHubClient, HttpResponse};
pub use repo::{PULL_REQUESTS_PER_PAGE, Repository};
pub use types::{
    Blob, Branch, CommitDetails, CommitListItem, CommitRef, CommitSummary, ContentFile,
    ContentType, Contents, FetchType, GitRef, PullRequest, PullRequestState, RepoDetails,
    Signature, TagRef, User,
};
