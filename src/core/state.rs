//! Local key-value state: token, linked repository, stats and SHA ledger.
//!
//! State lives in a single JSON document. All mutations go through
//! [`StateStore::update`], which holds an async mutex for the in-memory copy
//! and an exclusive `fs2` lock on a sidecar file while it rereads, mutates
//! and replaces the document. Concurrent uploads in one process and separate
//! codehub processes therefore never lose each other's SHAs.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Platform, Stats};
use crate::error::{CodeHubError, Result};

/// How the linked repository is used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// No repository linked yet
    #[default]
    Hook,
    /// Solutions are committed to `hook`
    Commit,
}

/// Everything codehub remembers between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    /// Linked repository as `owner/repo`
    #[serde(default)]
    pub hook: Option<String>,

    #[serde(default)]
    pub repo_url: Option<String>,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub stats: BTreeMap<Platform, Stats>,

    /// Pull stats from the repository on the next link/sync
    #[serde(default = "default_sync_stats")]
    pub sync_stats: bool,
}

fn default_sync_stats() -> bool {
    true
}

impl Default for LocalState {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            hook: None,
            repo_url: None,
            mode: Mode::Hook,
            stats: BTreeMap::new(),
            sync_stats: true,
        }
    }
}

/// Credentials needed to commit
#[derive(Debug, Clone)]
pub struct CommitTarget {
    pub token: String,
    pub hook: String,
}

impl LocalState {
    /// Stats for a platform (an empty record if none yet)
    pub fn stats(&self, platform: Platform) -> Stats {
        self.stats
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| Stats::for_platform(platform))
    }

    pub fn stats_mut(&mut self, platform: Platform) -> &mut Stats {
        self.stats
            .entry(platform)
            .or_insert_with(|| Stats::for_platform(platform))
    }

    /// Token and repository, checked in the order the upload flow needs them
    pub fn commit_target(&self) -> Result<CommitTarget> {
        let token = self
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(CodeHubError::TokenUndefined)?;

        if self.mode != Mode::Commit {
            return Err(CodeHubError::NotAuthorizedByGit);
        }

        let hook = self
            .hook
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or(CodeHubError::NoRepoDefined)?;

        Ok(CommitTarget { token, hook })
    }

    /// Forget the linked repository
    pub fn unlink(&mut self) {
        self.hook = None;
        self.repo_url = None;
        self.mode = Mode::Hook;
        self.sync_stats = true;
    }
}

/// File-backed state shared by all tasks of one run
pub struct StateStore {
    path: PathBuf,
    state: Mutex<LocalState>,
}

impl StateStore {
    /// Open the state file, starting empty when it does not exist
    pub async fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            LocalState::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open the state file in the configured home directory
    pub async fn open_default() -> anyhow::Result<Self> {
        let path = crate::config::paths::state_file()?;
        Ok(Self::open(path).await?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> LocalState {
        self.state.lock().await.clone()
    }

    /// Mutate the state and write it to disk before releasing the lock.
    ///
    /// The document is reread under the file lock first, so writes made by
    /// another process since this store was opened are kept.
    pub async fn update<F, T>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut LocalState) -> T,
    {
        let mut state = self.state.lock().await;
        let _lock = lock_state(&self.path)?;

        if let Some(on_disk) = read_state(&self.path)? {
            *state = on_disk;
        }
        let result = mutate(&mut state);
        write_state(&self.path, &state)?;
        Ok(result)
    }

    /// Remember the SHA of a committed file
    pub async fn record_sha(
        &self,
        platform: Platform,
        problem: &str,
        filename: &str,
        sha: &str,
    ) -> Result<()> {
        self.update(|state| state.stats_mut(platform).record_sha(problem, filename, sha))
            .await
    }
}

fn state_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Exclusive lock on the sidecar `.lock` file, released when dropped
fn lock_state(path: &Path) -> Result<File> {
    std::fs::create_dir_all(state_dir(path))?;

    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path.with_extension("lock"))?;
    lock.lock_exclusive()?;
    Ok(lock)
}

fn read_state(path: &Path) -> Result<Option<LocalState>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace the state file atomically; the caller holds the lock
fn write_state(path: &Path, state: &LocalState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let mut tmp = tempfile::NamedTempFile::new_in(state_dir(path))?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| CodeHubError::Io(e.error))?;

    debug!(path = %path.display(), "State saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;
    use tempfile::TempDir;

    #[test]
    fn test_commit_target_checks() {
        let mut state = LocalState::default();
        assert!(matches!(state.commit_target(), Err(CodeHubError::TokenUndefined)));

        state.token = Some("gho_x".to_string());
        assert!(matches!(state.commit_target(), Err(CodeHubError::NotAuthorizedByGit)));

        state.mode = Mode::Commit;
        assert!(matches!(state.commit_target(), Err(CodeHubError::NoRepoDefined)));

        state.hook = Some("octo/solutions".to_string());
        let target = state.commit_target().unwrap();
        assert_eq!(target.hook, "octo/solutions");

        state.unlink();
        assert_eq!(state.mode, Mode::Hook);
        assert!(state.hook.is_none());
    }

    #[tokio::test]
    async fn test_state_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");

        let store = StateStore::open(path.clone()).await.unwrap();
        store
            .update(|state| {
                state.token = Some("gho_x".to_string());
                state.stats_mut(Platform::Leetcode).mark_solved("0001-two-sum", Difficulty::Easy);
            })
            .await
            .unwrap();
        store
            .record_sha(Platform::Leetcode, "0001-two-sum", "0001-two-sum.py", "abc")
            .await
            .unwrap();

        let reopened = StateStore::open(path).await.unwrap();
        let state = reopened.snapshot().await;
        assert_eq!(state.token.as_deref(), Some("gho_x"));
        let stats = state.stats(Platform::Leetcode);
        assert_eq!(stats.easy, 1);
        assert_eq!(stats.sha("0001-two-sum", "0001-two-sum.py"), Some("abc"));
        assert!(state.sync_stats);
    }

    #[tokio::test]
    async fn test_concurrent_sha_records_are_kept() {
        let temp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(
            StateStore::open(temp.path().join("state.json")).await.unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_sha(Platform::Geeksforgeeks, "p", &format!("f{}", i), "sha")
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = StateStore::open(temp.path().join("state.json")).await.unwrap();
        let stats = reopened.snapshot().await.stats(Platform::Geeksforgeeks);
        assert_eq!(stats.shas["p"].files.len(), 8);
    }

    #[tokio::test]
    async fn test_two_stores_on_one_file_keep_both_shas() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        // Both opened before either writes, like two codehub processes
        let first = StateStore::open(path.clone()).await.unwrap();
        let second = StateStore::open(path.clone()).await.unwrap();

        first
            .record_sha(Platform::Leetcode, "0001-two-sum", "0001-two-sum.py", "sha-a")
            .await
            .unwrap();
        second
            .record_sha(Platform::Leetcode, "0002-add-two-numbers", "README.md", "sha-b")
            .await
            .unwrap();

        let stats = StateStore::open(path)
            .await
            .unwrap()
            .snapshot()
            .await
            .stats(Platform::Leetcode);
        assert_eq!(stats.sha("0001-two-sum", "0001-two-sum.py"), Some("sha-a"));
        assert_eq!(stats.sha("0002-add-two-numbers", "README.md"), Some("sha-b"));

        // The second store also sees the first store's write in memory
        let in_memory = second.snapshot().await.stats(Platform::Leetcode);
        assert_eq!(in_memory.sha("0001-two-sum", "0001-two-sum.py"), Some("sha-a"));
    }
}
