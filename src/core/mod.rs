//! Core upload logic.
//!
//! This module contains:
//! - State: local token, repository link and stats ledger
//! - Journal: append-only log of repository writes
//! - Uploader: SHA-versioned writes with a single retry on conflict
//! - Stats sync: persisting and pulling `stats.json`
//! - Topics: platform README topic tables
//! - Submit: the full upload flow for a submission
//! - Poller: bounded wait for an accepted submission

pub mod journal;
pub mod poller;
pub mod state;
pub mod stats_sync;
pub mod submit;
pub mod topics;
pub mod uploader;

// Re-export commonly used types
pub use journal::{hash_content, UploadJournal, WriteOutcome, WriteRecord};
pub use poller::poll_until;
pub use state::{CommitTarget, LocalState, Mode, StateStore};
pub use stats_sync::{persist_stats, sync_all, sync_from_repo};
pub use submit::{discussion_line, SubmissionUploader, UploadReport};
pub use topics::{sort_readme, update_topic_readme};
pub use uploader::RepoWriter;
