// Repository handle.
// Typed accessors for one repository's branches, pull requests, contents, and git objects.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::client::GitHubClient;
use super::types::{
    Blob, Branch, CommitListItem, CommitSummary, ContentFile, Contents, FetchType, GitCommit,
    PullRequest, PullRequestState, RepoDetails, Repository as RepositoryInfo, Tag, TagRef,
};

/// Page size used for pull request listings.
pub const PULL_REQUESTS_PER_PAGE: u32 = 30;

/// One remote repository, bound to the client whose session it uses.
#[derive(Clone)]
pub struct Repository<'a> {
    client: &'a GitHubClient,
    owner: String,
    name: String,
}

impl std::fmt::Debug for Repository<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .finish()
    }
}

impl<'a> Repository<'a> {
    pub(crate) fn new(client: &'a GitHubClient, owner: &str, name: &str) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Web URL of the repository.
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut segments = vec!["repos", self.owner.as_str(), self.name.as_str()];
        segments.extend_from_slice(path);
        self.client.get_json(&segments, params).await
    }

    /// Get branches, in API order.
    pub async fn get_branches(&self) -> Result<Vec<Branch>> {
        self.get_json(&["branches"], &[]).await
    }

    /// Get the first page of pull requests in the given state.
    pub async fn get_pull_requests(&self, state: PullRequestState) -> Result<Vec<PullRequest>> {
        self.get_pull_requests_page(state, 1).await
    }

    /// Get one page of pull requests in the given state.
    pub async fn get_pull_requests_page(
        &self,
        state: PullRequestState,
        page: u32,
    ) -> Result<Vec<PullRequest>> {
        let page = page.to_string();
        let per_page = PULL_REQUESTS_PER_PAGE.to_string();
        let params = [
            ("state", state.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];
        self.get_json(&["pulls"], &params).await
    }

    /// Get a file or directory at `git_ref` (branch, tag or commit SHA).
    pub async fn get_contents(&self, path: &str, git_ref: &str) -> Result<Contents> {
        let (contents, _) = self.fetch_contents(path, git_ref, false).await?;
        Ok(contents)
    }

    /// Like [`get_contents`](Self::get_contents), also reporting which endpoint served the file.
    ///
    /// Files the contents API refuses as too large or returns without content,
    /// or every file when `from_git_blob` is set, are read from their git blob instead.
    pub async fn fetch_contents(
        &self,
        path: &str,
        git_ref: &str,
        from_git_blob: bool,
    ) -> Result<(Contents, FetchType)> {
        let (value, fetch_type) = if from_git_blob {
            (None, FetchType::Blob)
        } else {
            match self.get_json::<Value>(&contents_path(path), &[("ref", git_ref)]).await {
                Ok(value) => (Some(value), FetchType::Contents),
                Err(Error::FileTooLarge { url }) => {
                    debug!(url = %url, "File too large for contents API, fetching git blob");
                    (None, FetchType::Blob)
                }
                Err(e) => return Err(e),
            }
        };

        let (mut file, fetch_type) = match value {
            Some(Value::Array(entries)) => {
                return Ok((Contents::Directory(entries_from_json(entries)?), fetch_type));
            }
            Some(value) => {
                let file = serde_json::from_value::<ContentFile>(value)?;
                if file.is_content_omitted() {
                    debug!(path, "Contents API omitted file content, fetching git blob");
                    (self.get_contents_from_git_blob(path, git_ref).await?, FetchType::Blob)
                } else {
                    (file, fetch_type)
                }
            }
            None => (self.get_contents_from_git_blob(path, git_ref).await?, fetch_type),
        };

        file.last_updated = self.get_last_updated(path, git_ref).await?;
        Ok((Contents::File(file), fetch_type))
    }

    /// Listing of the directory containing `path`.
    pub async fn get_parent_contents(&self, path: &str, git_ref: &str) -> Result<Vec<ContentFile>> {
        let parent = parent_path(path);
        match self
            .get_json::<Value>(&contents_path(parent), &[("ref", git_ref)])
            .await?
        {
            Value::Array(entries) => entries_from_json(entries),
            value => Ok(vec![serde_json::from_value(value)?]),
        }
    }

    /// Entry in the parent listing with the same file name as `path`.
    pub async fn matching_file_from_parent_contents(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<ContentFile>> {
        let Some(file_name) = Path::new(path).file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        Ok(self
            .get_parent_contents(path, git_ref)
            .await?
            .into_iter()
            .find(|entry| entry.name == file_name))
    }

    /// Locate `path` in its parent listing and read its content from the git blob.
    pub async fn get_contents_from_git_blob(&self, path: &str, git_ref: &str) -> Result<ContentFile> {
        let entry = self
            .matching_file_from_parent_contents(path, git_ref)
            .await?
            .ok_or_else(|| Error::MissingFile {
                path: path.to_string(),
            })?;
        let sha = entry.sha.clone().ok_or_else(|| Error::MissingFile {
            path: path.to_string(),
        })?;
        let blob = self.get_git_blob(&sha).await?;
        Ok(entry.with_blob(blob))
    }

    /// Fetch a git blob by SHA.
    pub async fn get_git_blob(&self, sha: &str) -> Result<Blob> {
        self.get_json(&["git", "blobs", sha], &[]).await
    }

    /// Latest `count` commits touching `path` at `git_ref`.
    pub async fn get_commits_for_file(
        &self,
        path: &str,
        git_ref: &str,
        count: u32,
    ) -> Result<Vec<CommitListItem>> {
        let per_page = count.to_string();
        let params = [("sha", git_ref), ("path", path), ("per_page", per_page.as_str())];
        self.get_json(&["commits"], &params).await
    }

    /// Date of the last commit to `path`, `None` when it has no history at `git_ref`.
    pub async fn get_last_updated(&self, path: &str, git_ref: &str) -> Result<Option<NaiveDate>> {
        let commits = self.get_commits_for_file(path, git_ref, 1).await?;
        Ok(commits
            .first()
            .map(|commit| commit.commit.committer.date.date_naive()))
    }

    /// README text at `git_ref`.
    pub async fn get_readme(&self, git_ref: &str) -> Result<String> {
        let file: ContentFile = self.get_json(&["readme"], &[("ref", git_ref)]).await?;
        let bytes = file.content.unwrap_or_default();
        String::from_utf8(bytes).map_err(|e| Error::ContentDecode(e.to_string()))
    }

    /// Repository name and description.
    pub async fn get_repo_details(&self) -> Result<RepoDetails> {
        let repo: RepositoryInfo = self.get_json(&[], &[]).await?;
        Ok(RepoDetails {
            name: repo.name,
            about: repo.description,
        })
    }

    /// Tags with the commit each points at.
    pub async fn get_tags(&self) -> Result<Vec<TagRef>> {
        let tags: Vec<Tag> = self.get_json(&["tags"], &[]).await?;
        Ok(tags
            .into_iter()
            .map(|tag| TagRef {
                tag_name: tag.name,
                sha: tag.commit.sha,
            })
            .collect())
    }

    /// Author name and committer date of a commit.
    pub async fn get_commit(&self, sha: &str) -> Result<CommitSummary> {
        let commit: GitCommit = self.get_json(&["git", "commits", sha], &[]).await?;
        Ok(CommitSummary {
            author: commit.author.name,
            date: commit.committer.date,
        })
    }

    /// Drop every cached response for this repository. Returns the number removed.
    pub fn clear_cache(&self) -> Result<usize> {
        let Some(store) = self.client.cache() else {
            return Ok(0);
        };
        let needle = self.full_name().to_lowercase();
        let removed = store.delete_where(|url| url.to_lowercase().contains(&needle))?;
        info!(repo = %self.full_name(), removed, "Cleared cached responses");
        Ok(removed)
    }
}

fn entries_from_json(entries: Vec<Value>) -> Result<Vec<ContentFile>> {
    entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(Error::from))
        .collect()
}

fn contents_path(path: &str) -> Vec<&str> {
    let mut segments = vec!["contents"];
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
    segments
}

fn parent_path(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}
