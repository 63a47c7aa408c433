//! Accepted submissions handed to codehub for upload.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::platform::{slugify, Difficulty, Platform};

/// Commit message used for code when the site reports no runtime stats
pub const DEFAULT_SOLUTION_MESSAGE: &str = "Solution submitted successfully";

/// A solved problem as captured from the practice site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub platform: Platform,

    /// Problem title as displayed by the site
    pub title: String,

    /// Directory name; derived from the title when absent
    #[serde(default)]
    pub slug: Option<String>,

    /// Difficulty label, e.g. `Medium` or `Difficulty: Basic`
    pub difficulty: String,

    /// Language label, e.g. `Python3` or `C++ (g++ 5.4)`
    pub language: String,

    /// Solution source
    pub code: String,

    /// Link to the problem page
    #[serde(default)]
    pub url: Option<String>,

    /// Problem statement (HTML or Markdown) for the problem README
    #[serde(default)]
    pub statement: Option<String>,

    /// Personal notes for NOTES.md
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub topic_tags: Vec<String>,

    /// Runtime/memory summary, used as the commit message for the code
    #[serde(default)]
    pub stats_message: Option<String>,

    /// Whether the site accepted the submission
    #[serde(default = "default_accepted")]
    pub accepted: bool,
}

fn default_accepted() -> bool {
    true
}

impl Submission {
    /// Parse a submission from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse submission JSON")
    }

    /// Load a submission from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read submission file: {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Directory name of the problem in the repository
    pub fn problem_slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(&self.title),
        }
    }

    pub fn parsed_difficulty(&self) -> Difficulty {
        Difficulty::parse(&self.difficulty)
    }

    pub fn commit_message(&self) -> &str {
        self.stats_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_SOLUTION_MESSAGE)
    }

    /// Notes worth uploading, if any
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Problem README: linked title, difficulty, then the statement
    pub fn readme_markdown(&self) -> Option<String> {
        let statement = self.statement.as_deref().filter(|s| !s.trim().is_empty())?;
        let heading = match self.url.as_deref() {
            Some(url) => format!("<a href=\"{}\">{}</a>", url, self.title),
            None => self.title.clone(),
        };
        Some(format!(
            "<h2>{}</h2><h3>{}</h3><hr>{}",
            heading,
            self.parsed_difficulty().display_name(),
            statement
        ))
    }

    /// Reject submissions that cannot be committed
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.accepted {
            return Err(crate::error::CodeHubError::SubmissionIncomplete("an accepted verdict"));
        }
        if self.code.trim().is_empty() {
            return Err(crate::error::CodeHubError::SubmissionIncomplete("code"));
        }
        // Titles with no ASCII letters or digits slugify to nothing
        if self.problem_slug().is_empty() {
            return Err(crate::error::CodeHubError::SubmissionIncomplete("a title or slug"));
        }
        Ok(())
    }
}
