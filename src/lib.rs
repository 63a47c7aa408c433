//! codehub - sync solved coding problems to a GitHub repository
//!
//! Accepted LeetCode and GeeksForGeeks submissions are committed to a linked
//! repository together with a problem README, optional notes, topic tables
//! in a per-platform README, and a `stats.json` of solved counts.
//!
//! # Concurrency
//!
//! Writes are versioned by blob SHA:
//! - The last SHA of every file is kept in a local ledger
//! - A stale SHA (HTTP 409) is refetched and the write retried once
//! - Conflicting `stats.json` writes are merged before the retry
//!
//! # Modules
//!
//! - `adapters`: GitHub contents/repository API and the OAuth device flow
//! - `core`: State, upload flow, stats sync, topic README upkeep
//! - `domain`: Data structures (Platform, Stats, Submission, ReadmeComposer)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Authorize and link a repository
//! codehub auth
//! codehub repo link octocat/leetcode-solutions
//!
//! # Upload an accepted submission
//! codehub upload submission.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{ContentsApi, GitHubClient, GitHubError, RemoteFile};
pub use crate::core::{RepoWriter, StateStore, SubmissionUploader};
pub use domain::{merge_stats, Platform, ReadmeComposer, Stats, Submission};
pub use error::{CodeHubError, Result};
