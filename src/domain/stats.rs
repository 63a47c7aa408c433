//! Solved-problem statistics and the SHA ledger.
//!
//! The aggregate counts are never incremented directly: they are always
//! recomputed from the difficulty tags stored in the ledger, so a merged or
//! hand-edited record cannot drift from its own ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::platform::{Difficulty, Platform};

/// Ledger entry for one problem (or one platform-level file)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
    /// Difficulty tag, set once the problem has been counted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,

    /// File name -> last known content SHA
    #[serde(flatten)]
    pub files: BTreeMap<String, String>,
}

/// Per-platform statistics record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub solved: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<u32>,
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
    #[serde(default)]
    pub shas: BTreeMap<String, ProblemEntry>,
}

/// Counts derived from a ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifficultyCounts {
    pub school: u32,
    pub basic: u32,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl DifficultyCounts {
    pub fn solved(&self) -> u32 {
        self.school + self.basic + self.easy + self.medium + self.hard
    }

    pub fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::School => self.school,
            Difficulty::Basic => self.basic,
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Unknown => 0,
        }
    }
}

impl Stats {
    /// Empty record shaped for a platform (GeeksForGeeks carries school/basic)
    pub fn for_platform(platform: Platform) -> Self {
        let mut stats = Self::default();
        if platform == Platform::Geeksforgeeks {
            stats.school = Some(0);
            stats.basic = Some(0);
        }
        stats
    }

    /// Count ledger entries by their difficulty tag
    pub fn derive_counts(&self) -> DifficultyCounts {
        let mut counts = DifficultyCounts::default();
        for entry in self.shas.values() {
            let Some(tag) = entry.difficulty.as_deref() else {
                continue;
            };
            match tag {
                "school" => counts.school += 1,
                "basic" => counts.basic += 1,
                "easy" => counts.easy += 1,
                "medium" => counts.medium += 1,
                "hard" => counts.hard += 1,
                _ => {}
            }
        }
        counts
    }

    /// Recompute aggregate fields from the ledger
    pub fn recount(&mut self) {
        let counts = self.derive_counts();
        self.easy = counts.easy;
        self.medium = counts.medium;
        self.hard = counts.hard;
        if self.school.is_some() || counts.school > 0 {
            self.school = Some(counts.school);
        }
        if self.basic.is_some() || counts.basic > 0 {
            self.basic = Some(counts.basic);
        }
        self.solved = counts.solved();
    }

    /// True when the aggregate fields agree with the ledger
    pub fn is_consistent(&self) -> bool {
        let counts = self.derive_counts();
        self.solved == counts.solved()
            && self.easy == counts.easy
            && self.medium == counts.medium
            && self.hard == counts.hard
            && self.school.unwrap_or(0) == counts.school
            && self.basic.unwrap_or(0) == counts.basic
    }

    /// Last known SHA for a file, if any
    pub fn sha(&self, problem: &str, filename: &str) -> Option<&str> {
        self.shas
            .get(problem)
            .and_then(|entry| entry.files.get(filename))
            .map(String::as_str)
    }

    /// Remember the SHA GitHub returned for a write
    pub fn record_sha(&mut self, problem: &str, filename: &str, sha: impl Into<String>) {
        self.shas
            .entry(problem.to_string())
            .or_default()
            .files
            .insert(filename.to_string(), sha.into());
    }

    /// Tag a problem with its difficulty and refresh the counts
    pub fn mark_solved(&mut self, problem: &str, difficulty: Difficulty) {
        self.shas.entry(problem.to_string()).or_default().difficulty =
            Some(difficulty.as_str().to_string());
        self.recount();
    }

    /// A problem counts as completed once a solution file named after it was
    /// committed.
    pub fn is_completed(&self, problem: &str) -> bool {
        self.shas
            .get(problem)
            .is_some_and(|entry| entry.files.keys().any(|file| file.contains(problem)))
    }
}

/// Merge remote and local stats after a write conflict.
///
/// Both ledgers are unioned. Where both sides hold a value for the same leaf
/// (a file SHA or a difficulty tag) the remote value wins. Aggregate counts
/// are then recomputed from the merged ledger, so the incoming scalar counts
/// of either side never survive the merge.
pub fn merge_stats(remote: &Stats, local: &Stats) -> Stats {
    let mut merged = local.clone();

    for (problem, remote_entry) in &remote.shas {
        let entry = merged.shas.entry(problem.clone()).or_default();
        for (file, sha) in &remote_entry.files {
            entry.files.insert(file.clone(), sha.clone());
        }
        if remote_entry.difficulty.is_some() {
            entry.difficulty = remote_entry.difficulty.clone();
        }
    }

    merged.school = remote.school.or(local.school);
    merged.basic = remote.basic.or(local.basic);
    merged.recount();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(stats: &mut Stats, problem: &str, difficulty: Difficulty) {
        stats.record_sha(problem, &format!("{}.py", problem), format!("sha-{}", problem));
        stats.mark_solved(problem, difficulty);
    }

    #[test]
    fn test_mark_solved_recounts() {
        let mut stats = Stats::for_platform(Platform::Leetcode);
        solved(&mut stats, "0001-two-sum", Difficulty::Easy);
        solved(&mut stats, "0002-add-two-numbers", Difficulty::Medium);

        assert_eq!(stats.solved, 2);
        assert_eq!(stats.easy, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.hard, 0);
        assert!(stats.is_consistent());

        // Marking the same problem again does not double count
        stats.mark_solved("0001-two-sum", Difficulty::Easy);
        assert_eq!(stats.solved, 2);
    }

    #[test]
    fn test_is_completed_requires_solution_file() {
        let mut stats = Stats::default();
        stats.record_sha("0001-two-sum", "README.md", "abc");
        assert!(!stats.is_completed("0001-two-sum"));

        stats.record_sha("0001-two-sum", "0001-two-sum.py", "def");
        assert!(stats.is_completed("0001-two-sum"));
        assert!(!stats.is_completed("0002-add-two-numbers"));
    }

    #[test]
    fn test_unknown_difficulty_not_counted() {
        let mut stats = Stats::default();
        stats.mark_solved("mystery", Difficulty::Unknown);
        assert_eq!(stats.solved, 0);
        assert_eq!(stats.shas["mystery"].difficulty.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_merge_unions_ledgers() {
        let mut local = Stats::for_platform(Platform::Leetcode);
        solved(&mut local, "a", Difficulty::Easy);

        let mut remote = Stats::for_platform(Platform::Leetcode);
        solved(&mut remote, "b", Difficulty::Hard);
        remote.record_sha("a", "a.py", "remote-sha");

        let merged = merge_stats(&remote, &local);
        assert_eq!(merged.solved, 2);
        assert_eq!(merged.easy, 1);
        assert_eq!(merged.hard, 1);
        assert_eq!(merged.sha("a", "a.py"), Some("remote-sha"));
        assert!(merged.is_consistent());
    }

    #[test]
    fn test_merge_ignores_incoming_counts() {
        let mut remote = Stats::default();
        remote.solved = 40;
        remote.easy = 40;

        let mut local = Stats::default();
        solved(&mut local, "x", Difficulty::Medium);
        local.solved = 7;

        let merged = merge_stats(&remote, &local);
        assert_eq!(merged.solved, 1);
        assert_eq!(merged.easy, 0);
        assert_eq!(merged.medium, 1);
    }

    #[test]
    fn test_ledger_json_shape() {
        let mut stats = Stats::for_platform(Platform::Geeksforgeeks);
        solved(&mut stats, "rotate-array", Difficulty::Basic);
        stats.record_sha("README.md", "", "readme-sha");

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["basic"], 1);
        assert_eq!(json["shas"]["rotate-array"]["difficulty"], "basic");
        assert_eq!(json["shas"]["rotate-array"]["rotate-array.py"], "sha-rotate-array");
        assert_eq!(json["shas"]["README.md"][""], "readme-sha");

        let back: Stats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
