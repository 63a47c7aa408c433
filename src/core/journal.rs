//! Append-only journal of repository writes.
//!
//! Every commit attempt is recorded as one JSON line so a failed upload can
//! be inspected afterwards (`codehub history`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::Platform;

/// Result of one write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Accepted on the first PUT
    Committed,
    /// Accepted after refetching the SHA following a 409
    CommittedAfterConflict,
    Failed,
}

/// One line of the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    /// Repository path written
    pub path: String,
    pub message: String,
    pub outcome: WriteOutcome,
    /// SHA-256 of the uploaded payload (first 16 hex chars)
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteRecord {
    pub fn new(platform: Platform, path: &str, message: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            platform,
            path: path.to_string(),
            message: message.to_string(),
            outcome: WriteOutcome::Failed,
            content_hash: hash_content(content),
            sha: None,
            error: None,
        }
    }

    pub fn committed(mut self, sha: &str, after_conflict: bool) -> Self {
        self.outcome = if after_conflict {
            WriteOutcome::CommittedAfterConflict
        } else {
            WriteOutcome::Committed
        };
        self.sha = Some(sha.to_string());
        self
    }

    pub fn failed(mut self, error: &str) -> Self {
        self.outcome = WriteOutcome::Failed;
        self.error = Some(error.to_string());
        self
    }
}

/// JSONL journal file
pub struct UploadJournal {
    path: PathBuf,
}

impl UploadJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Open the journal in the configured home directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::config::paths::journal_file()?))
    }

    /// Append a record
    pub async fn append(&self, record: &WriteRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;

        let json = serde_json::to_string(record).context("Failed to serialize write record")?;
        file.write_all(format!("{}\n", json).as_bytes())
            .await
            .context("Failed to write journal record")?;
        file.flush().await.context("Failed to flush journal")?;

        Ok(())
    }

    /// All records in order
    pub async fn replay(&self) -> Result<Vec<WriteRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;

        let mut lines = BufReader::new(file).lines();
        let mut records = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let record: WriteRecord = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse journal line: {}", line))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Most recent records first
    pub async fn recent(&self, limit: usize) -> Result<Vec<WriteRecord>> {
        let mut records = self.replay().await?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}

/// Hash payload content (first 16 chars of SHA256)
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}
