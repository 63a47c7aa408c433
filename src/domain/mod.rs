//! Domain types for codehub.
//!
//! This module contains the pure data structures and text transforms:
//! - Platform: practice sites, difficulties, repository paths
//! - Stats: solved counts and the SHA ledger
//! - Readme: topic tables in the platform README
//! - Submission: an accepted solution ready for upload

pub mod platform;
pub mod readme;
pub mod stats;
pub mod submission;

// Re-export commonly used types
pub use platform::{
    language_extension, slugify, Difficulty, Platform, NOTES_FILENAME, README_FILENAME,
    STATS_FILENAME,
};
pub use readme::ReadmeComposer;
pub use stats::{merge_stats, DifficultyCounts, ProblemEntry, Stats};
pub use submission::{Submission, DEFAULT_SOLUTION_MESSAGE};
