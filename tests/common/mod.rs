//! In-memory GitHub repository for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use codehub::adapters::{decode_content, encode_content, ContentsApi, GitHubError, RemoteFile};
use codehub::config::UploadSettings;
use codehub::core::{RepoWriter, StateStore, UploadJournal};
use tempfile::TempDir;

/// A PUT as seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub path: String,
    pub sha: Option<String>,
    pub message: String,
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, (String, String)>,
    puts: Vec<PutCall>,
    gets: Vec<String>,
    /// Status codes returned by the next PUTs to a path, before normal handling
    injected: HashMap<String, VecDeque<u16>>,
}

/// Contents endpoint backed by a map, with GitHub's SHA rules
#[derive(Default)]
pub struct FakeRepo {
    inner: Mutex<Inner>,
    next_sha: AtomicU32,
}

impl FakeRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn mint_sha(&self) -> String {
        format!("sha-{}", self.next_sha.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store a file directly, as another device would, returning its SHA
    pub fn seed(&self, path: &str, text: &str) -> String {
        let sha = self.mint_sha();
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), (encode_content(text), sha.clone()));
        sha
    }

    /// Fail the next PUT to `path` with `status`
    pub fn fail_next_put(&self, path: &str, status: u16) {
        self.inner
            .lock()
            .unwrap()
            .injected
            .entry(path.to_string())
            .or_default()
            .push_back(status);
    }

    pub fn text(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(path)
            .map(|(content, _)| decode_content(content).unwrap())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|(_, sha)| sha.clone())
    }

    pub fn puts_to(&self, path: &str) -> Vec<PutCall> {
        let inner = self.inner.lock().unwrap();
        inner.puts.iter().filter(|p| p.path == path).cloned().collect()
    }

    pub fn gets_of(&self, path: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.gets.iter().filter(|p| *p == path).count()
    }
}

fn status(status: u16, path: &str) -> GitHubError {
    GitHubError::Status {
        status,
        path: path.to_string(),
    }
}

#[async_trait]
impl ContentsApi for FakeRepo {
    async fn get_file(&self, path: &str) -> Result<RemoteFile, GitHubError> {
        let mut inner = self.inner.lock().unwrap();
        inner.gets.push(path.to_string());
        let (content, sha) = inner.files.get(path).cloned().ok_or_else(|| status(404, path))?;

        // GitHub wraps payloads at 60 columns
        let wrapped = content
            .as_bytes()
            .chunks(60)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(RemoteFile {
            content: wrapped,
            sha,
        })
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, GitHubError> {
        let new_sha = self.mint_sha();
        let mut inner = self.inner.lock().unwrap();
        inner.puts.push(PutCall {
            path: path.to_string(),
            sha: sha.map(str::to_string),
            message: message.to_string(),
        });

        if let Some(code) = inner.injected.get_mut(path).and_then(VecDeque::pop_front) {
            return Err(status(code, path));
        }

        match (inner.files.get(path), sha) {
            (Some((_, current)), Some(given)) if current != given => return Err(status(409, path)),
            (Some(_), None) => return Err(status(422, path)),
            _ => {}
        }

        inner
            .files
            .insert(path.to_string(), (content.to_string(), new_sha.clone()));
        Ok(new_sha)
    }
}

/// State, journal and writer over a fake repository in a temp directory
pub struct Harness {
    pub temp: TempDir,
    pub repo: Arc<FakeRepo>,
    pub state: Arc<StateStore>,
    pub journal: Arc<UploadJournal>,
    pub writer: RepoWriter,
}

impl Harness {
    pub async fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let repo = FakeRepo::new();
        let state = Arc::new(StateStore::open(temp.path().join("state.json")).await.unwrap());
        let journal = Arc::new(UploadJournal::new(temp.path().join("uploads.jsonl")));
        let writer = RepoWriter::new(repo.clone(), state.clone()).with_journal(journal.clone());

        Self {
            temp,
            repo,
            state,
            journal,
            writer,
        }
    }
}

/// Upload settings without waits
pub fn fast_settings() -> UploadSettings {
    UploadSettings {
        poll_interval_ms: 0,
        poll_attempts: 3,
        conflict_backoff_ms: 0,
    }
}
