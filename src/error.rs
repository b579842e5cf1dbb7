// Error types for the GitHub client.
// Separates configuration, remote (HTTP status), transport, and decoding failures.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid repository name {0:?}, expected \"owner/name\"")]
    InvalidRepoName(String),

    #[error("GitHub API returned {status}: {message}")]
    Remote {
        status: StatusCode,
        message: String,
        body: String,
    },

    #[error("File too large for the contents API: {url}")]
    FileTooLarge { url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Content decoding error: {0}")]
    ContentDecode(String),

    #[error("File not found in parent directory listing: {path}")]
    MissingFile { path: String },

    #[error("Cache store error: {0}")]
    Cache(#[from] std::io::Error),
}

impl Error {
    /// HTTP status of a rejected request, if the service answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            Error::FileTooLarge { .. } => Some(StatusCode::FORBIDDEN),
            _ => None,
        }
    }

    /// True when the service could not be reached.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
