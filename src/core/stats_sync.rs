//! Persisting stats to `<platform>/stats.json` and pulling them back.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::adapters::{encode_content, RemoteFile};
use crate::domain::{merge_stats, Platform, Stats, STATS_FILENAME};
use crate::error::{CodeHubError, Result};

use super::uploader::RepoWriter;

/// Commit message for stats writes
pub const STATS_COMMIT_MESSAGE: &str = "Updated stats";

/// Ledger location of the stats file SHA
const LEDGER_KEY: &str = "";

/// Serialize stats as stored in the repository: `{ "<platform>": stats }`
pub fn stats_document(platform: Platform, stats: &Stats) -> Result<String> {
    let mut document = BTreeMap::new();
    document.insert(platform.dir(), stats);
    Ok(serde_json::to_string(&document)?)
}

/// Parse a stats file, returning `None` when it has no entry for the platform
pub fn parse_stats_document(platform: Platform, text: &str) -> Result<Option<Stats>> {
    let mut document: BTreeMap<String, Stats> = serde_json::from_str(text)
        .map_err(|e| CodeHubError::Decode(format!("{}: {}", STATS_FILENAME, e)))?;
    Ok(document.remove(platform.dir()))
}

fn remote_stats(platform: Platform, file: &RemoteFile) -> Result<Stats> {
    let text = file.text()?;
    Ok(parse_stats_document(platform, &text)?.unwrap_or_else(|| Stats::for_platform(platform)))
}

/// Push local stats.
///
/// On a 409 the remote stats are merged into the local record, the merged
/// result is stored locally and written once more with the fetched SHA.
#[instrument(skip(writer), fields(platform = %platform))]
pub async fn persist_stats(writer: &RepoWriter, platform: Platform, backoff: Duration) -> Result<String> {
    let state = writer.state().snapshot().await;
    let local = state.stats(platform);
    let sha = local.sha(STATS_FILENAME, LEDGER_KEY).map(str::to_string);
    let content = encode_content(&stats_document(platform, &local)?);

    match writer
        .put_once(
            platform,
            STATS_FILENAME,
            LEDGER_KEY,
            &content,
            STATS_COMMIT_MESSAGE,
            sha.as_deref(),
        )
        .await
    {
        Ok(new_sha) => {
            info!(solved = local.solved, "Stats persisted");
            Ok(new_sha)
        }
        Err(e) if e.is_conflict() => {
            warn!("Stats changed remotely, merging");
            let current = writer.fetch(platform, STATS_FILENAME, LEDGER_KEY).await?;
            let remote = remote_stats(platform, &current)?;

            let merged = writer
                .state()
                .update(|state| {
                    let merged = merge_stats(&remote, &state.stats(platform));
                    state.stats.insert(platform, merged.clone());
                    merged
                })
                .await?;

            tokio::time::sleep(backoff).await;

            // A second conflict propagates: retrying again would overwrite
            // remote changes this merge has not seen
            let content = encode_content(&stats_document(platform, &merged)?);
            let new_sha = writer
                .put_after_conflict(
                    platform,
                    STATS_FILENAME,
                    LEDGER_KEY,
                    &content,
                    STATS_COMMIT_MESSAGE,
                    &current.sha,
                )
                .await?;
            info!(solved = merged.solved, "Merged stats persisted");
            Ok(new_sha)
        }
        Err(e) => Err(e),
    }
}

/// Replace local stats with the repository copy.
///
/// A repository without `stats.json` starts from empty stats.
#[instrument(skip(writer), fields(platform = %platform))]
pub async fn sync_from_repo(writer: &RepoWriter, platform: Platform) -> Result<Stats> {
    let stats = match writer.fetch(platform, STATS_FILENAME, LEDGER_KEY).await {
        Ok(file) => {
            let mut stats = remote_stats(platform, &file)?;
            stats.record_sha(STATS_FILENAME, LEDGER_KEY, file.sha);
            stats
        }
        Err(e) if e.is_not_found() => {
            info!("No stats in repository, starting fresh");
            Stats::for_platform(platform)
        }
        Err(e) => return Err(e),
    };

    writer
        .state()
        .update(|state| {
            state.stats.insert(platform, stats.clone());
        })
        .await?;

    Ok(stats)
}

/// Pull stats for every platform and clear the pending-sync flag
pub async fn sync_all(writer: &RepoWriter) -> Result<Vec<(Platform, Stats)>> {
    let mut synced = Vec::new();
    for platform in Platform::ALL {
        synced.push((platform, sync_from_repo(writer, platform).await?));
    }
    writer.state().update(|state| state.sync_stats = false).await?;
    Ok(synced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;

    #[test]
    fn test_stats_document_is_keyed_by_platform() {
        let mut stats = Stats::for_platform(Platform::Geeksforgeeks);
        stats.mark_solved("rotate-array", Difficulty::Basic);

        let text = stats_document(Platform::Geeksforgeeks, &stats).unwrap();
        assert!(text.starts_with("{\"geeksforgeeks\":"));

        let parsed = parse_stats_document(Platform::Geeksforgeeks, &text)
            .unwrap()
            .unwrap();
        assert_eq!(parsed, stats);
        assert!(parse_stats_document(Platform::Leetcode, &text).unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_stats_document(Platform::Leetcode, "not json"),
            Err(CodeHubError::Decode(_))
        ));
    }
}
