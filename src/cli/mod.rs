//! Command-line interface for codehub.
//!
//! Provides commands for authorizing with GitHub, linking a repository,
//! uploading accepted submissions, and inspecting local stats.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{DeviceFlowClient, GitHubClient};
use crate::config;
use crate::core::{
    poll_until, sort_readme, sync_all, CommitTarget, RepoWriter, StateStore, SubmissionUploader,
    UploadJournal, WriteOutcome,
};
use crate::domain::{Platform, ReadmeComposer, Submission};
use crate::error::CodeHubError;

pub mod repo;

/// codehub - sync solved LeetCode and GeeksForGeeks problems to GitHub
#[derive(Parser, Debug)]
#[command(name = "codehub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize codehub with GitHub (device flow)
    Auth,

    /// Create, link or unlink the solutions repository
    Repo {
        #[command(subcommand)]
        command: repo::RepoCommands,
    },

    /// Replace local stats with the copy stored in the repository
    Sync,

    /// Upload an accepted submission described by a JSON file
    Upload {
        /// Submission file
        file: PathBuf,
    },

    /// Wait for a submission file to appear, then upload it
    Watch {
        /// Submission file written by the browser helper
        file: PathBuf,

        /// Keep the file after a successful upload
        #[arg(long)]
        keep: bool,
    },

    /// Prepend a discussion post link to a problem README
    Discuss {
        #[arg(short, long, value_enum, default_value = "leetcode")]
        platform: Platform,

        /// Problem directory, e.g. 0001-two-sum
        problem: String,

        /// Discussion post URL
        url: String,
    },

    /// Platform README maintenance
    Readme {
        #[command(subcommand)]
        command: ReadmeCommands,
    },

    /// Show local solved counts
    Stats,

    /// List recent repository writes
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum ReadmeCommands {
    /// Sort topic tables and fold stray topic tables into the managed section
    Sort {
        /// Only this platform (default: all)
        #[arg(short, long, value_enum)]
        platform: Option<Platform>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Auth => authorize().await,
            Commands::Repo { command } => repo::execute(command).await,
            Commands::Sync => sync().await,
            Commands::Upload { file } => upload(&file).await,
            Commands::Watch { file, keep } => watch(&file, keep).await,
            Commands::Discuss {
                platform,
                problem,
                url,
            } => discuss(platform, &problem, &url).await,
            Commands::Readme {
                command: ReadmeCommands::Sort { platform },
            } => sort_readmes(platform).await,
            Commands::Stats => show_stats().await,
            Commands::History { limit } => show_history(limit).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Open the state store and journal in the configured home
pub(crate) async fn open_state() -> Result<Arc<StateStore>> {
    Ok(Arc::new(StateStore::open_default().await?))
}

/// Writer for the linked repository, failing when auth or link is missing
pub(crate) async fn connect(state: Arc<StateStore>) -> Result<(RepoWriter, CommitTarget)> {
    let cfg = config::config()?;
    let target = state.snapshot().await.commit_target()?;

    let github = GitHubClient::new(&cfg.api_url, &target.token);
    let journal = Arc::new(UploadJournal::open_default()?);
    let writer = RepoWriter::new(Arc::new(github.contents(&target.hook)), state).with_journal(journal);

    Ok((writer, target))
}

async fn uploader() -> Result<SubmissionUploader> {
    let cfg = config::config()?;
    let (writer, target) = connect(open_state().await?).await?;
    Ok(SubmissionUploader::new(writer, target.hook, cfg.upload.clone()))
}

/// Run the device flow and store the token
async fn authorize() -> Result<()> {
    let cfg = config::config()?;
    let flow = DeviceFlowClient::from_config(&cfg.oauth);

    let code = flow
        .request_device_code()
        .await
        .context("Failed to start GitHub authorization")?;

    println!("Open {} and enter the code:", code.verification_uri);
    println!();
    println!("    {}", code.user_code);
    println!();
    eprintln!("Waiting for authorization (expires in {}s)...", code.expires_in);

    let token = flow.poll_for_token(&code).await?;
    let username = GitHubClient::new(&cfg.api_url, &token)
        .current_user()
        .await
        .context("Failed to fetch the authorized GitHub user")?;

    let state = open_state().await?;
    state
        .update(|s| {
            s.token = Some(token);
            s.username = Some(username.clone());
        })
        .await?;

    println!("Authorized as {}", username);
    Ok(())
}

/// Pull stats for both platforms
async fn sync() -> Result<()> {
    let (writer, target) = connect(open_state().await?).await?;
    let synced = sync_all(&writer).await?;

    println!("Synced stats from {}", target.hook);
    for (platform, stats) in synced {
        println!("  {:<14} {} solved", platform.display_name(), stats.solved);
    }
    Ok(())
}

async fn upload(file: &Path) -> Result<()> {
    let submission = Submission::from_file(file)?;
    let report = uploader().await?.upload(&submission).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &crate::core::UploadReport) {
    println!("Uploaded {}/{}", report.problem, report.filename);
    if report.readme_sha.is_some() {
        println!("  README.md created");
    }
    if report.notes_sha.is_some() {
        println!("  NOTES.md attached");
    }
    if report.topics_updated {
        println!("  Topic tables updated");
    }
    if report.newly_solved {
        println!("  Stats updated");
    }
}

/// Poll for a submission file, then upload it
async fn watch(file: &Path, keep: bool) -> Result<()> {
    let cfg = config::config()?;
    let uploader = uploader().await?;

    eprintln!("Waiting for {}...", file.display());
    let submission = poll_until(cfg.upload.poll_interval(), cfg.upload.poll_attempts, move || async move {
        if !file.exists() {
            return Ok(None);
        }
        match Submission::from_file(file) {
            Ok(submission) if submission.accepted => Ok(Some(submission)),
            // Still being written, or not yet accepted
            _ => Ok(None),
        }
    })
    .await?;

    let report = uploader.upload(&submission).await?;
    print_report(&report);

    if !keep {
        tokio::fs::remove_file(file)
            .await
            .with_context(|| format!("Failed to remove {}", file.display()))?;
    }
    Ok(())
}

async fn discuss(platform: Platform, problem: &str, url: &str) -> Result<()> {
    let uploader = uploader().await?;
    uploader
        .prepend_discussion(platform, problem, url)
        .await
        .with_context(|| format!("Failed to update README of {}", problem))?;
    println!("Discussion post linked in {}", platform.path(problem, "README.md"));
    Ok(())
}

async fn sort_readmes(only: Option<Platform>) -> Result<()> {
    let (writer, target) = connect(open_state().await?).await?;
    let platforms = match only {
        Some(platform) => vec![platform],
        None => Platform::ALL.to_vec(),
    };

    for platform in platforms {
        let composer = ReadmeComposer::new(platform, target.hook.clone());
        match sort_readme(&writer, &composer, platform).await {
            Ok(Some(_)) => println!("{}: sorted", platform.display_name()),
            Ok(None) => println!("{}: already sorted", platform.display_name()),
            Err(e) if e.is_not_found() => println!("{}: no README yet", platform.display_name()),
            Err(e @ CodeHubError::TopicSectionNotFound(_)) => {
                println!("{}: {}", platform.display_name(), e)
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn show_stats() -> Result<()> {
    let state = open_state().await?.snapshot().await;

    match &state.hook {
        Some(hook) => println!("Repository: {}", hook),
        None => println!("Repository: (not linked)"),
    }
    println!();

    for platform in Platform::ALL {
        let stats = state.stats(platform);
        let counts = stats.derive_counts();
        println!("{} ({} solved)", platform.display_name(), stats.solved);
        for difficulty in platform.difficulties() {
            println!("  {:<8} {}", difficulty.display_name(), counts.get(*difficulty));
        }
    }
    Ok(())
}

async fn show_history(limit: usize) -> Result<()> {
    let journal = UploadJournal::open_default()?;
    let records = journal.recent(limit).await?;

    if records.is_empty() {
        println!("No uploads recorded");
        return Ok(());
    }

    println!("{:<20} {:<10} {:<26} PATH", "TIME", "HASH", "OUTCOME");
    println!("{}", "-".repeat(80));
    for record in records {
        let outcome = match record.outcome {
            WriteOutcome::Committed => "committed".to_string(),
            WriteOutcome::CommittedAfterConflict => "committed (after 409)".to_string(),
            WriteOutcome::Failed => format!("failed: {}", record.error.unwrap_or_default()),
        };
        println!(
            "{:<20} {:<10} {:<26} {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            &record.content_hash[..record.content_hash.len().min(8)],
            outcome,
            record.path
        );
    }
    Ok(())
}

async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    let config_file = cfg
        .config_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none - using defaults)".to_string());
    println!("Config file: {}", config_file);
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  State:   {}", config::paths::state_file_in(&cfg.home).display());
    println!("  Journal: {}", config::paths::journal_file_in(&cfg.home).display());
    println!();
    println!("GitHub:");
    println!("  API URL:   {}", cfg.api_url);
    println!("  Client ID: {}", cfg.oauth.client_id);
    println!("  Scopes:    {}", cfg.oauth.scopes.join(" "));
    println!();
    println!("Upload:");
    println!("  Poll interval:    {}ms", cfg.upload.poll_interval_ms);
    println!("  Poll attempts:    {}", cfg.upload.poll_attempts);
    println!("  Conflict backoff: {}ms", cfg.upload.conflict_backoff_ms);

    Ok(())
}
