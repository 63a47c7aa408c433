//! Canonical paths for codehub state.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! | Location | Purpose |
//! |----------|---------|
//! | `state.json` | Token, linked repository, per-platform stats and SHA ledger |
//! | `uploads.jsonl` | Append-only journal of every repository write |

use std::path::{Path, PathBuf};

use anyhow::Result;

pub const STATE_FILE: &str = "state.json";
pub const JOURNAL_FILE: &str = "uploads.jsonl";

/// Get the codehub home directory (~/.codehub)
pub fn codehub_home() -> Result<PathBuf> {
    crate::config::codehub_home()
}

/// Get the local state file (~/.codehub/state.json)
pub fn state_file() -> Result<PathBuf> {
    Ok(state_file_in(&codehub_home()?))
}

/// Get the upload journal (~/.codehub/uploads.jsonl)
pub fn journal_file() -> Result<PathBuf> {
    Ok(journal_file_in(&codehub_home()?))
}

pub fn state_file_in(home: &Path) -> PathBuf {
    home.join(STATE_FILE)
}

pub fn journal_file_in(home: &Path) -> PathBuf {
    home.join(JOURNAL_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_in_home() {
        let home = PathBuf::from("/tmp/codehub-home");
        assert_eq!(state_file_in(&home), PathBuf::from("/tmp/codehub-home/state.json"));
        assert_eq!(journal_file_in(&home), PathBuf::from("/tmp/codehub-home/uploads.jsonl"));
    }
}
