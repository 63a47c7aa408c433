//! Adapter interfaces for external systems.
//!
//! Adapters wrap the GitHub REST API (contents, repositories, users) and the
//! GitHub OAuth device flow. The core only talks to repository files through
//! the [`ContentsApi`] trait, so the conflict handling can be exercised
//! against an in-memory implementation.

pub mod github;
pub mod oauth;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use github::{GitHubClient, GitHubError, RepoContents, RepoInfo};
pub use oauth::{DeviceCode, DeviceFlowClient, PollOutcome, TokenResponse};

/// A file as returned by the contents endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Base64 payload (GitHub wraps it at 60 columns)
    pub content: String,

    /// Blob SHA, the version token for the next write
    pub sha: String,
}

impl RemoteFile {
    /// Decode the payload as UTF-8 text
    pub fn text(&self) -> Result<String, GitHubError> {
        decode_content(&self.content)
    }
}

/// Read/write access to the files of one repository
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Fetch a file. A missing file is reported as a 404 status error.
    async fn get_file(&self, path: &str) -> Result<RemoteFile, GitHubError>;

    /// Create or update a file, returning the new blob SHA.
    ///
    /// `content` is already base64 encoded. `sha` must be the current blob SHA
    /// when the file exists; a stale SHA is reported as a 409 status error.
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, GitHubError>;
}

/// Encode UTF-8 text for the contents endpoint
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a contents payload, ignoring the line breaks GitHub inserts
pub fn decode_content(payload: &str) -> Result<String, GitHubError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| GitHubError::InvalidResponse(format!("bad base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| GitHubError::InvalidResponse(format!("content is not UTF-8: {}", e)))
}
