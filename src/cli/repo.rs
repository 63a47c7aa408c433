//! Repository subcommands: create, link and unlink the solutions repository.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use crate::adapters::{GitHubClient, RepoInfo};
use crate::config;
use crate::core::{sync_all, Mode};
use crate::error::CodeHubError;

use super::{connect, open_state};

#[derive(Subcommand, Debug)]
pub enum RepoCommands {
    /// Create a new private repository and link it
    Create {
        /// Repository name
        name: String,
    },

    /// Link an existing repository
    Link {
        /// Repository as owner/repo
        full_name: String,
    },

    /// Stop committing to the linked repository
    Unlink,
}

pub async fn execute(command: RepoCommands) -> Result<()> {
    match command {
        RepoCommands::Create { name } => create(&name).await,
        RepoCommands::Link { full_name } => link(&full_name).await,
        RepoCommands::Unlink => unlink().await,
    }
}

async fn github() -> Result<GitHubClient> {
    let cfg = config::config()?;
    let state = open_state().await?.snapshot().await;
    let token = state
        .token
        .filter(|t| !t.is_empty())
        .ok_or(CodeHubError::TokenUndefined)?;
    Ok(GitHubClient::new(&cfg.api_url, token))
}

async fn create(name: &str) -> Result<()> {
    let repo = github().await?.create_repo(name).await?;
    println!("Created {} ({})", repo.full_name, repo.html_url);
    attach(repo).await
}

async fn link(full_name: &str) -> Result<()> {
    let repo = github().await?.get_repo(full_name).await?;
    println!("Linked {} ({})", repo.full_name, repo.html_url);
    attach(repo).await
}

/// Switch to commit mode for `repo` and pull its stats when a sync is pending
async fn attach(repo: RepoInfo) -> Result<()> {
    let state = open_state().await?;
    let needs_sync = state
        .update(|s| {
            s.hook = Some(repo.full_name.clone());
            s.repo_url = Some(repo.html_url.clone());
            s.mode = Mode::Commit;
            s.sync_stats
        })
        .await?;

    if needs_sync {
        let (writer, _) = connect(state).await?;
        let synced = sync_all(&writer)
            .await
            .with_context(|| format!("Failed to sync stats from {}", repo.full_name))?;
        for (platform, stats) in synced {
            info!(platform = %platform, solved = stats.solved, "Stats synced");
        }
    }
    Ok(())
}

async fn unlink() -> Result<()> {
    let state = open_state().await?;
    let previous = state
        .update(|s| {
            let previous = s.hook.clone();
            s.unlink();
            previous
        })
        .await?;

    match previous {
        Some(hook) => println!("Unlinked {}", hook),
        None => println!("No repository was linked"),
    }
    Ok(())
}
