//! Upload flow for an accepted submission.
//!
//! The problem README, notes, solution and topic README are written
//! concurrently. Stats are only touched the first time a problem is solved.

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, instrument};

use crate::adapters::encode_content;
use crate::config::UploadSettings;
use crate::domain::{Platform, ReadmeComposer, Submission, NOTES_FILENAME, README_FILENAME};
use crate::error::Result;

use super::stats_sync::persist_stats;
use super::topics::update_topic_readme;
use super::uploader::RepoWriter;

pub const README_COMMIT_MESSAGE: &str = "Create README - CodeHub";
pub const NOTES_COMMIT_MESSAGE: &str = "Attach NOTES - CodeHub";
pub const DISCUSSION_COMMIT_MESSAGE: &str = "Prepend discussion post - CodeHub";

/// What an upload did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub problem: String,
    pub filename: String,
    pub solution_sha: String,
    pub readme_sha: Option<String>,
    pub notes_sha: Option<String>,
    pub topics_updated: bool,
    /// First time this problem was solved, stats were updated
    pub newly_solved: bool,
}

/// Commits submissions to the linked repository
pub struct SubmissionUploader {
    writer: RepoWriter,
    hook: String,
    settings: UploadSettings,
}

impl SubmissionUploader {
    pub fn new(writer: RepoWriter, hook: impl Into<String>, settings: UploadSettings) -> Self {
        Self {
            writer,
            hook: hook.into(),
            settings,
        }
    }

    pub fn writer(&self) -> &RepoWriter {
        &self.writer
    }

    /// Commit a submission and, if it is a new solve, the updated stats
    #[instrument(skip(self, submission), fields(platform = %submission.platform, title = %submission.title))]
    pub async fn upload(&self, submission: &Submission) -> Result<UploadReport> {
        submission.validate()?;

        let platform = submission.platform;
        let problem = submission.problem_slug();
        let extension = platform.language_extension(&submission.language)?;
        let filename = format!("{}{}", problem, extension);

        let stats = self.writer.state().snapshot().await.stats(platform);
        let already_completed = stats.is_completed(&problem);
        let needs_readme = stats.sha(&problem, README_FILENAME).is_none();

        let readme = async {
            match submission.readme_markdown().filter(|_| needs_readme) {
                Some(markdown) => self
                    .writer
                    .write_with_sha(
                        platform,
                        &problem,
                        README_FILENAME,
                        &encode_content(&markdown),
                        README_COMMIT_MESSAGE,
                        None,
                    )
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };

        let notes = async {
            match submission.notes() {
                Some(notes) => self
                    .writer
                    .write_file(
                        platform,
                        &problem,
                        NOTES_FILENAME,
                        &encode_content(notes),
                        NOTES_COMMIT_MESSAGE,
                    )
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };

        let encoded_code = encode_content(&submission.code);
        let solution = self.writer.write_file(
            platform,
            &problem,
            &filename,
            &encoded_code,
            submission.commit_message(),
        );

        let topics = async {
            if submission.topic_tags.is_empty() {
                return Ok(false);
            }
            let composer = ReadmeComposer::new(platform, self.hook.clone());
            update_topic_readme(
                &self.writer,
                &composer,
                platform,
                &problem,
                &submission.topic_tags,
                self.settings.conflict_backoff(),
            )
            .await
            .map(|_| true)
        };

        let (readme_sha, notes_sha, solution_sha, topics_updated) =
            tokio::try_join!(readme, notes, solution, topics)?;

        if !already_completed {
            let difficulty = submission.parsed_difficulty();
            self.writer
                .state()
                .update(|state| state.stats_mut(platform).mark_solved(&problem, difficulty))
                .await?;
            persist_stats(&self.writer, platform, self.settings.conflict_backoff()).await?;
        }

        info!(%problem, newly_solved = !already_completed, "Submission uploaded");

        Ok(UploadReport {
            problem,
            filename,
            solution_sha,
            readme_sha,
            notes_sha,
            topics_updated,
            newly_solved: !already_completed,
        })
    }

    /// Prepend a discussion post link to a problem README
    #[instrument(skip(self))]
    pub async fn prepend_discussion(&self, platform: Platform, problem: &str, url: &str) -> Result<String> {
        let file = self.writer.fetch(platform, problem, README_FILENAME).await?;
        let current = file.text()?;
        let updated = format!("{}{}", discussion_line(url, &Local::now()), current);

        self.writer
            .write_with_sha(
                platform,
                problem,
                README_FILENAME,
                &encode_content(&updated),
                DISCUSSION_COMMIT_MESSAGE,
                Some(file.sha),
            )
            .await
    }
}

/// `[Discussion Post (created on D/M/YYYY at H:MM)](url)` followed by a hard line break
pub fn discussion_line<Tz: TimeZone>(url: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "[Discussion Post (created on {})]({})  \n",
        at.format("%-d/%-m/%Y at %-H:%M"),
        url
    )
}
