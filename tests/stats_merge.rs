//! Persisting stats.json, including the merge after a concurrent update.

mod common;

use std::time::Duration;

use codehub::core::stats_sync::{parse_stats_document, stats_document};
use codehub::core::{persist_stats, sync_all, WriteOutcome};
use codehub::domain::{merge_stats, Difficulty, Platform, Stats};
use common::Harness;

const STATS_PATH: &str = "leetcode/stats.json";

fn solved(stats: &mut Stats, problem: &str, difficulty: Difficulty) {
    stats.record_sha(problem, &format!("{}.rs", problem), format!("sha-{}", problem));
    stats.mark_solved(problem, difficulty);
}

#[test]
fn test_merge_counts_follow_the_ledger() {
    let mut remote = Stats::for_platform(Platform::Leetcode);
    solved(&mut remote, "0001-two-sum", Difficulty::Easy);
    solved(&mut remote, "0004-median", Difficulty::Hard);
    // Counts claimed by the remote must not survive the merge
    remote.solved = 40;
    remote.hard = 17;

    let mut local = Stats::for_platform(Platform::Leetcode);
    solved(&mut local, "0001-two-sum", Difficulty::Easy);
    solved(&mut local, "0002-add-two-numbers", Difficulty::Medium);

    let merged = merge_stats(&remote, &local);
    assert_eq!(merged.solved, 3);
    assert_eq!(merged.easy, 1);
    assert_eq!(merged.medium, 1);
    assert_eq!(merged.hard, 1);
    assert!(merged.is_consistent());
    assert_eq!(merged.shas.len(), 3);
}

#[tokio::test]
async fn test_persist_creates_stats_file() {
    let h = Harness::new().await;
    h.state
        .update(|s| solved(s.stats_mut(Platform::Leetcode), "0001-two-sum", Difficulty::Easy))
        .await
        .unwrap();

    let sha = persist_stats(&h.writer, Platform::Leetcode, Duration::ZERO).await.unwrap();

    let text = h.repo.text(STATS_PATH).unwrap();
    let remote = parse_stats_document(Platform::Leetcode, &text).unwrap().unwrap();
    assert_eq!(remote.solved, 1);

    let local = h.state.snapshot().await.stats(Platform::Leetcode);
    assert_eq!(local.sha("stats.json", ""), Some(sha.as_str()));
    assert_eq!(h.repo.puts_to(STATS_PATH)[0].message, "Updated stats");

    let records = h.journal.recent(1).await.unwrap();
    assert_eq!(records[0].path, STATS_PATH);
    assert_eq!(records[0].outcome, WriteOutcome::Committed);
    assert_eq!(records[0].sha.as_deref(), Some(sha.as_str()));
}

#[tokio::test]
async fn test_conflict_merges_remote_solves() {
    let h = Harness::new().await;

    // Local: one solve, and a stats.json sha that another device has since replaced
    h.state
        .update(|s| {
            let stats = s.stats_mut(Platform::Leetcode);
            solved(stats, "0002-add-two-numbers", Difficulty::Medium);
            stats.record_sha("stats.json", "", "stale");
        })
        .await
        .unwrap();

    let mut remote = Stats::for_platform(Platform::Leetcode);
    solved(&mut remote, "0001-two-sum", Difficulty::Easy);
    solved(&mut remote, "0004-median", Difficulty::Hard);
    let remote_sha = h
        .repo
        .seed(STATS_PATH, &stats_document(Platform::Leetcode, &remote).unwrap());

    persist_stats(&h.writer, Platform::Leetcode, Duration::ZERO).await.unwrap();

    let puts = h.repo.puts_to(STATS_PATH);
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].sha.as_deref(), Some("stale"));
    assert_eq!(puts[1].sha.as_deref(), Some(remote_sha.as_str()));

    let written = parse_stats_document(Platform::Leetcode, &h.repo.text(STATS_PATH).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(written.solved, 3);
    assert!(written.is_consistent());

    let local = h.state.snapshot().await.stats(Platform::Leetcode);
    assert_eq!(local.solved, 3);
    assert_eq!((local.easy, local.medium, local.hard), (1, 1, 1));
    assert_eq!(local.sha("stats.json", ""), h.repo.sha(STATS_PATH).as_deref());
}

#[tokio::test]
async fn test_second_conflict_after_merge_is_returned() {
    let h = Harness::new().await;
    h.state
        .update(|s| {
            let stats = s.stats_mut(Platform::Leetcode);
            solved(stats, "0002-add-two-numbers", Difficulty::Medium);
            stats.record_sha("stats.json", "", "stale");
        })
        .await
        .unwrap();

    let mut remote = Stats::for_platform(Platform::Leetcode);
    solved(&mut remote, "0001-two-sum", Difficulty::Easy);
    let remote_sha = h
        .repo
        .seed(STATS_PATH, &stats_document(Platform::Leetcode, &remote).unwrap());
    h.repo.fail_next_put(STATS_PATH, 409);
    h.repo.fail_next_put(STATS_PATH, 409);

    let err = persist_stats(&h.writer, Platform::Leetcode, Duration::ZERO)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // One merge, then the second 409 goes back to the caller
    let puts = h.repo.puts_to(STATS_PATH);
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[1].sha.as_deref(), Some(remote_sha.as_str()));
    assert_eq!(h.repo.gets_of(STATS_PATH), 1);
    assert_eq!(h.repo.sha(STATS_PATH), Some(remote_sha));

    // The merge is still kept locally
    let local = h.state.snapshot().await.stats(Platform::Leetcode);
    assert_eq!(local.solved, 2);

    let records = h.journal.recent(2).await.unwrap();
    assert!(records.iter().all(|r| r.outcome == WriteOutcome::Failed));
}

#[tokio::test]
async fn test_sync_replaces_local_stats() {
    let h = Harness::new().await;
    h.state
        .update(|s| {
            solved(s.stats_mut(Platform::Leetcode), "local-only", Difficulty::Hard);
            solved(s.stats_mut(Platform::Geeksforgeeks), "gfg-local", Difficulty::School);
        })
        .await
        .unwrap();

    let mut remote = Stats::for_platform(Platform::Leetcode);
    solved(&mut remote, "0001-two-sum", Difficulty::Easy);
    h.repo
        .seed(STATS_PATH, &stats_document(Platform::Leetcode, &remote).unwrap());

    let synced = sync_all(&h.writer).await.unwrap();
    assert_eq!(synced.len(), 2);

    let state = h.state.snapshot().await;
    assert!(!state.sync_stats);

    let leetcode = state.stats(Platform::Leetcode);
    assert_eq!(leetcode.solved, 1);
    assert!(leetcode.shas.contains_key("0001-two-sum"));
    assert!(!leetcode.shas.contains_key("local-only"));
    assert_eq!(leetcode.sha("stats.json", ""), h.repo.sha(STATS_PATH).as_deref());

    // No stats.json for GeeksForGeeks: start fresh
    let gfg = state.stats(Platform::Geeksforgeeks);
    assert_eq!(gfg, Stats::for_platform(Platform::Geeksforgeeks));
}
