//! Repository writes with SHA bookkeeping.
//!
//! Every write sends the last SHA recorded in the ledger. A 409 means the
//! ledger is stale: the current SHA is fetched and the write is retried
//! exactly once. Any other failure goes straight back to the caller.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{ContentsApi, RemoteFile};
use crate::domain::Platform;
use crate::error::Result;

use super::journal::{UploadJournal, WriteRecord};
use super::state::StateStore;

/// A repository file as keyed in the ledger
#[derive(Debug, Clone, Copy)]
struct LedgerFile<'a> {
    platform: Platform,
    problem: &'a str,
    filename: &'a str,
}

impl<'a> LedgerFile<'a> {
    fn new(platform: Platform, problem: &'a str, filename: &'a str) -> Self {
        Self {
            platform,
            problem,
            filename,
        }
    }

    fn path(&self) -> String {
        self.platform.path(self.problem, self.filename)
    }
}

/// Writes files of one linked repository and keeps the ledger current
#[derive(Clone)]
pub struct RepoWriter {
    api: Arc<dyn ContentsApi>,
    state: Arc<StateStore>,
    journal: Option<Arc<UploadJournal>>,
}

impl RepoWriter {
    pub fn new(api: Arc<dyn ContentsApi>, state: Arc<StateStore>) -> Self {
        Self {
            api,
            state,
            journal: None,
        }
    }

    /// Record every write in a journal
    pub fn with_journal(mut self, journal: Arc<UploadJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Fetch a file of the platform directory
    pub async fn fetch(&self, platform: Platform, problem: &str, filename: &str) -> Result<RemoteFile> {
        let path = platform.path(problem, filename);
        Ok(self.api.get_file(&path).await?)
    }

    /// Write a file using the SHA from the ledger
    pub async fn write_file(
        &self,
        platform: Platform,
        problem: &str,
        filename: &str,
        content: &str,
        message: &str,
    ) -> Result<String> {
        let sha = self
            .state
            .snapshot()
            .await
            .stats(platform)
            .sha(problem, filename)
            .map(str::to_string);
        self.write_with_sha(platform, problem, filename, content, message, sha)
            .await
    }

    /// Write a file with an explicit SHA, retrying once on conflict.
    ///
    /// `content` must already be base64 encoded.
    #[instrument(skip(self, content, sha), fields(platform = %platform))]
    pub async fn write_with_sha(
        &self,
        platform: Platform,
        problem: &str,
        filename: &str,
        content: &str,
        message: &str,
        sha: Option<String>,
    ) -> Result<String> {
        let file = LedgerFile::new(platform, problem, filename);

        match self.commit(file, content, message, sha.as_deref(), false).await {
            Err(e) if e.is_conflict() => {
                let path = file.path();
                warn!(%path, "Stale SHA, refetching before retry");
                let current = self.api.get_file(&path).await?;
                self.commit(file, content, message, Some(&current.sha), true)
                    .await
            }
            other => other,
        }
    }

    /// Single PUT with no retry; a 409 is returned to the caller
    pub async fn put_once(
        &self,
        platform: Platform,
        problem: &str,
        filename: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<String> {
        let file = LedgerFile::new(platform, problem, filename);
        self.commit(file, content, message, sha, false).await
    }

    /// Final PUT after a conflict, using the SHA fetched from the repository
    pub async fn put_after_conflict(
        &self,
        platform: Platform,
        problem: &str,
        filename: &str,
        content: &str,
        message: &str,
        fetched_sha: &str,
    ) -> Result<String> {
        let file = LedgerFile::new(platform, problem, filename);
        self.commit(file, content, message, Some(fetched_sha), true)
            .await
    }

    /// One PUT: record the new SHA in the ledger and journal the outcome
    async fn commit(
        &self,
        file: LedgerFile<'_>,
        content: &str,
        message: &str,
        sha: Option<&str>,
        after_conflict: bool,
    ) -> Result<String> {
        let path = file.path();
        let record = WriteRecord::new(file.platform, &path, message, content);

        match self.api.put_file(&path, content, sha, message).await {
            Ok(new_sha) => {
                self.state
                    .record_sha(file.platform, file.problem, file.filename, &new_sha)
                    .await?;
                info!(%path, sha = %new_sha, "Committed");
                self.journal(record.committed(&new_sha, after_conflict)).await;
                Ok(new_sha)
            }
            Err(e) => {
                self.journal(record.failed(&e.to_string())).await;
                Err(e.into())
            }
        }
    }

    async fn journal(&self, record: WriteRecord) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = journal.append(&record).await {
            // Journal is diagnostic only; the commit already happened or failed on its own
            debug!(error = %e, "Failed to append upload journal");
        }
    }
}
