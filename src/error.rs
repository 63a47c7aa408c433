//! Domain errors for codehub.
//!
//! These are the conditions the upload flow can detect on its own (missing
//! auth, missing markers, unknown language). Transport and HTTP status
//! failures live in [`crate::adapters::GitHubError`] and are wrapped here.

use thiserror::Error;

use crate::adapters::GitHubError;

/// Result alias used across the core modules
pub type Result<T> = std::result::Result<T, CodeHubError>;

/// Distinguished error kind for everything codehub can diagnose itself
#[derive(Debug, Error)]
pub enum CodeHubError {
    #[error("No GitHub token stored. Run `codehub auth` first")]
    TokenUndefined,

    #[error("Repository is not linked for commits. Run `codehub repo link` or `codehub repo create`")]
    NotAuthorizedByGit,

    #[error("No repository defined")]
    NoRepoDefined,

    #[error("Topic section markers not found: {0}")]
    TopicSectionNotFound(String),

    #[error("Could not find successful submission after {attempts} attempts")]
    SubmissionNotFound { attempts: u32 },

    #[error("Submission is missing {0}")]
    SubmissionIncomplete(&'static str),

    #[error("Language not recognised: {0}")]
    LanguageNotFound(String),

    #[error("Repository error ({status}): {message}")]
    Repository { status: u16, message: String },

    #[error("Device flow failed: {0}")]
    DeviceFlow(String),

    #[error("Device flow authorization timed out after {0}s")]
    DeviceFlowTimeout(u64),

    #[error("Stored content is not valid: {0}")]
    Decode(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CodeHubError {
    /// True when the underlying GitHub response was 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GitHub(e) if e.is_not_found())
    }

    /// True when the underlying GitHub response was 409 (stale SHA)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::GitHub(e) if e.is_conflict())
    }
}
