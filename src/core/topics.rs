//! Platform README upkeep: topic tables for solved problems.

use std::time::Duration;

use tracing::{info, instrument};

use crate::adapters::encode_content;
use crate::domain::{Platform, ReadmeComposer, README_FILENAME};
use crate::error::Result;

use super::uploader::RepoWriter;

pub const CREATE_README_MESSAGE: &str = "Create README - CodeHub";
pub const UPDATE_README_MESSAGE: &str = "Update README - Topic Tags";

/// Platform README files live in the ledger under `README.md` with an empty file key
const LEDGER_KEY: &str = "";

/// Current platform README, creating it from the default text when missing
async fn load_or_create(writer: &RepoWriter, platform: Platform) -> Result<String> {
    match writer.fetch(platform, README_FILENAME, LEDGER_KEY).await {
        Ok(file) => {
            writer
                .state()
                .record_sha(platform, README_FILENAME, LEDGER_KEY, &file.sha)
                .await?;
            Ok(file.text()?)
        }
        Err(e) if e.is_not_found() => {
            info!(platform = %platform, "Creating platform README");
            let text = platform.default_readme();
            writer
                .write_with_sha(
                    platform,
                    README_FILENAME,
                    LEDGER_KEY,
                    &encode_content(&text),
                    CREATE_README_MESSAGE,
                    None,
                )
                .await?;
            Ok(text)
        }
        Err(e) => Err(e),
    }
}

/// List `problem` under each of `topics` in the platform README
#[instrument(skip(writer, composer, topics), fields(platform = %platform))]
pub async fn update_topic_readme(
    writer: &RepoWriter,
    composer: &ReadmeComposer,
    platform: Platform,
    problem: &str,
    topics: &[String],
    backoff: Duration,
) -> Result<String> {
    let mut markdown = load_or_create(writer, platform).await?;

    for topic in topics {
        markdown = composer.append_problem(&markdown, topic, problem)?;
    }
    markdown = composer.sort_topics(&markdown)?;

    tokio::time::sleep(backoff).await;

    writer
        .write_file(
            platform,
            README_FILENAME,
            LEDGER_KEY,
            &encode_content(&markdown),
            UPDATE_README_MESSAGE,
        )
        .await
}

/// Re-sort the topic tables of an existing platform README
#[instrument(skip(writer, composer), fields(platform = %platform))]
pub async fn sort_readme(
    writer: &RepoWriter,
    composer: &ReadmeComposer,
    platform: Platform,
) -> Result<Option<String>> {
    let file = writer.fetch(platform, README_FILENAME, LEDGER_KEY).await?;
    let current = file.text()?;
    let sorted = composer.sort_topics(&current)?;

    if sorted == current {
        info!("Topic tables already sorted");
        return Ok(None);
    }

    let sha = writer
        .write_with_sha(
            platform,
            README_FILENAME,
            LEDGER_KEY,
            &encode_content(&sorted),
            UPDATE_README_MESSAGE,
            Some(file.sha),
        )
        .await?;
    Ok(Some(sha))
}
