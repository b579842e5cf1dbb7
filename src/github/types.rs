// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Branch of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
    #[serde(default)]
    pub protected: bool,
}

/// Pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub url: Option<String>,
}

/// Pull request state, also used as the listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    #[default]
    Open,
    Closed,
    /// Filter only; the API never reports it on a pull request.
    All,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
            PullRequestState::All => "all",
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull request as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub head: GitRef,
    pub base: GitRef,
    pub user: Option<User>,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// Git reference (branch/commit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

/// GitHub user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
}

/// Kind of entry in a contents listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One file or directory entry from the contents API.
///
/// Content is present only for single-file responses and is held decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawContentFile")]
pub struct ContentFile {
    pub name: String,
    pub path: String,
    pub content_type: ContentType,
    pub sha: Option<String>,
    pub size: u64,
    pub html_url: Option<String>,
    pub download_url: Option<String>,
    /// Decoded bytes of the file.
    pub content: Option<Vec<u8>>,
    /// Date of the latest commit touching this path, filled for single files.
    pub last_updated: Option<NaiveDate>,
}

impl ContentFile {
    /// File content as UTF-8 text, `None` for listing entries.
    pub fn decoded_content(&self) -> Option<Result<&str, std::str::Utf8Error>> {
        self.content.as_deref().map(std::str::from_utf8)
    }

    pub fn is_dir(&self) -> bool {
        self.content_type == ContentType::Dir
    }

    /// A file whose bytes the contents API did not include.
    pub fn is_content_omitted(&self) -> bool {
        self.content_type == ContentType::File && self.content.is_none()
    }

    /// The same entry carrying content fetched from a git blob.
    pub(crate) fn with_blob(mut self, blob: Blob) -> Self {
        self.size = blob.size;
        self.content = Some(blob.content);
        self
    }
}

/// Wire shape of a contents entry before content decoding.
#[derive(Debug, Deserialize)]
struct RawContentFile {
    name: Option<String>,
    path: String,
    #[serde(rename = "type")]
    content_type: ContentType,
    sha: Option<String>,
    #[serde(default)]
    size: u64,
    encoding: Option<String>,
    content: Option<String>,
    html_url: Option<String>,
    download_url: Option<String>,
}

impl TryFrom<RawContentFile> for ContentFile {
    type Error = String;

    fn try_from(raw: RawContentFile) -> Result<Self, Self::Error> {
        // "none" marks content the API left out (files over 1 MB)
        let content = match (raw.content, raw.encoding.as_deref()) {
            (_, Some("none")) | (None, _) => None,
            (Some(c), encoding) => Some(decode_content(&c, encoding)?),
        };
        let name = raw
            .name
            .unwrap_or_else(|| raw.path.rsplit('/').next().unwrap_or_default().to_string());

        Ok(Self {
            name,
            path: raw.path,
            content_type: raw.content_type,
            sha: raw.sha,
            size: raw.size,
            html_url: raw.html_url,
            download_url: raw.download_url,
            content,
            last_updated: None,
        })
    }
}

/// Result of a contents lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    File(ContentFile),
    /// Entries in the order the API returned them.
    Directory(Vec<ContentFile>),
}

impl Contents {
    pub fn into_file(self) -> Option<ContentFile> {
        match self {
            Contents::File(file) => Some(file),
            Contents::Directory(_) => None,
        }
    }

    pub fn into_entries(self) -> Option<Vec<ContentFile>> {
        match self {
            Contents::Directory(entries) => Some(entries),
            Contents::File(_) => None,
        }
    }
}

/// Which endpoint produced a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchType {
    Contents,
    Blob,
}

/// Git blob, content decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBlob")]
pub struct Blob {
    pub sha: String,
    pub size: u64,
    pub content: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct RawBlob {
    sha: String,
    #[serde(default)]
    size: u64,
    content: String,
    encoding: Option<String>,
}

impl TryFrom<RawBlob> for Blob {
    type Error = String;

    fn try_from(raw: RawBlob) -> Result<Self, Self::Error> {
        Ok(Self {
            content: decode_content(&raw.content, raw.encoding.as_deref())?,
            sha: raw.sha,
            size: raw.size,
        })
    }
}

/// Decode API content; GitHub wraps base64 at 60 columns.
fn decode_content(content: &str, encoding: Option<&str>) -> Result<Vec<u8>, String> {
    match encoding {
        Some("base64") | None => {
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|e| format!("invalid base64 content: {}", e))
        }
        Some("utf-8") | Some("utf8") => Ok(content.as_bytes().to_vec()),
        Some(other) => Err(format!("unsupported content encoding {:?}", other)),
    }
}

/// Entry from the commits list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitListItem {
    pub sha: Option<String>,
    pub commit: CommitDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetails {
    pub committer: Signature,
}

/// Author or committer identity with timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    pub name: Option<String>,
    pub date: DateTime<Utc>,
}

/// Git commit object from the git database API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitCommit {
    pub author: Signature,
    pub committer: Signature,
}

/// Summary of a commit: author name and committer date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub author: Option<String>,
    pub date: DateTime<Utc>,
}

/// Tag as returned by the tags endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Tag {
    pub name: String,
    pub commit: CommitRef,
}

/// Tag name and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub tag_name: String,
    pub sha: String,
}

/// Subset of repository metadata.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Repository {
    pub name: String,
    pub description: Option<String>,
}

/// Repository name and "About" text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDetails {
    pub name: String,
    pub about: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub code: Option<String>,
}
