//! Topic tables in the platform README.
//!
//! The managed part of the README is bounded by HTML comment markers:
//!
//! ```text
//! <!---LeetCode Topics Start-->
//! # LeetCode Topics
//! ## Array
//! |  |
//! | ------- |
//! | [0001-two-sum](https://github.com/<hook>/tree/master/leetcode/0001-two-sum) |
//! <!---LeetCode Topics End-->
//! ```
//!
//! Everything outside the markers belongs to the user and is preserved
//! byte for byte, except topic tables that duplicate a managed topic, which
//! the sort pass folds into the managed section.

use std::collections::HashMap;

use crate::error::{CodeHubError, Result};

use super::platform::Platform;

const TABLE_HEADER: &str = "|  |";
const TABLE_SEPARATOR: &str = "| ------- |";

/// Composes topic tables for one platform and one repository
#[derive(Debug, Clone)]
pub struct ReadmeComposer {
    platform: Platform,
    hook: String,
    start: String,
    header: String,
    end: String,
}

impl ReadmeComposer {
    /// `hook` is the `owner/repo` full name of the linked repository
    pub fn new(platform: Platform, hook: impl Into<String>) -> Self {
        let name = platform.display_name();
        Self {
            platform,
            hook: hook.into(),
            start: format!("<!---{} Topics Start-->", name),
            header: format!("# {} Topics", name),
            end: format!("<!---{} Topics End-->", name),
        }
    }

    /// Link target for a problem row
    pub fn problem_url(&self, problem: &str) -> String {
        format!(
            "https://github.com/{}/tree/master/{}/{}",
            self.hook,
            self.platform.dir(),
            problem
        )
    }

    /// Byte range of the text strictly between the markers
    fn locate_section(&self, markdown: &str) -> Option<(usize, usize)> {
        let start = markdown.find(&self.start)?;
        let content_start = start + self.start.len();
        let content_end = content_start + markdown[content_start..].find(&self.end)?;
        Some((content_start, content_end))
    }

    fn section_error(&self) -> CodeHubError {
        CodeHubError::TopicSectionNotFound(self.start.clone())
    }

    /// Add `problem` to the `topic` table, creating the section and the table
    /// when needed. Adding a problem that is already listed under the topic
    /// returns the document unchanged.
    pub fn append_problem(&self, markdown: &str, topic: &str, problem: &str) -> Result<String> {
        let mut doc = markdown.to_string();
        let has_start = doc.contains(&self.start);
        let has_end = doc.contains(&self.end);
        if !has_start && !has_end {
            doc.push('\n');
            doc.push_str(&[self.start.as_str(), self.header.as_str(), self.end.as_str()].join("\n"));
        }

        let (content_start, content_end) = self
            .locate_section(&doc)
            .ok_or_else(|| self.section_error())?;

        let mut lines: Vec<String> = doc[content_start..content_end]
            .split('\n')
            .map(String::from)
            .collect();

        let topic_header = format!("## {}", topic.trim());
        let link_text = format!("[{}]", problem);
        let new_row = format!("| [{}]({}) |", problem, self.problem_url(problem));

        match lines.iter().position(|l| l.trim_end() == topic_header) {
            Some(header_idx) => {
                let table_end = table_end(&lines, header_idx + 1);
                if lines[header_idx + 1..table_end]
                    .iter()
                    .any(|row| row.contains(&link_text))
                {
                    return Ok(doc);
                }
                lines.insert(table_end, new_row);
            }
            None => {
                if lines.last().is_some_and(|l| !l.is_empty()) {
                    lines.push(String::new());
                }
                let at = lines.len() - 1;
                lines.splice(
                    at..at,
                    [topic_header, TABLE_HEADER.to_string(), TABLE_SEPARATOR.to_string(), new_row],
                );
            }
        }

        if lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push(String::new());
        }

        Ok(format!(
            "{}{}{}",
            &doc[..content_start],
            lines.join("\n"),
            &doc[content_end..]
        ))
    }

    /// Rebuild every topic table in the managed section with its rows
    /// deduplicated and sorted by display name.
    ///
    /// Topic tables with the same heading found outside the markers are
    /// merged in and removed from where they were. Fails when the section
    /// markers are missing.
    pub fn sort_topics(&self, markdown: &str) -> Result<String> {
        let (content_start, content_end) = self
            .locate_section(markdown)
            .ok_or_else(|| self.section_error())?;

        let mut before = markdown[..content_start - self.start.len()].to_string();
        let mut after = markdown[content_end + self.end.len()..].to_string();

        let mut topics = parse_topics(&markdown[content_start..content_end]);

        for (topic, rows) in topics.iter_mut() {
            rows.extend(take_topic_tables(&mut before, topic.as_str()));
            rows.extend(take_topic_tables(&mut after, topic.as_str()));

            let mut seen = std::collections::HashSet::new();
            rows.retain(|row| seen.insert(row.clone()));
            rows.sort_by(|a, b| {
                display_name(a)
                    .to_lowercase()
                    .cmp(&display_name(b).to_lowercase())
                    .then_with(|| a.cmp(b))
            });
        }

        let mut parts = vec![self.start.clone(), self.header.clone()];
        for (topic, rows) in &topics {
            let mut block = vec![
                format!("## {}", topic),
                TABLE_HEADER.to_string(),
                TABLE_SEPARATOR.to_string(),
            ];
            block.extend(rows.iter().cloned());
            parts.push(block.join("\n"));
        }
        parts.push(self.end.clone());

        Ok(format!("{}{}{}", before, parts.join("\n"), after))
    }

    /// Problems listed under `topic` in the managed section
    pub fn topic_rows(&self, markdown: &str, topic: &str) -> Vec<String> {
        let Some((content_start, content_end)) = self.locate_section(markdown) else {
            return Vec::new();
        };
        parse_topics(&markdown[content_start..content_end])
            .into_iter()
            .filter(|(name, _)| name == topic.trim())
            .flat_map(|(_, rows)| rows)
            .collect()
    }
}

/// Index one past the last table row following `from`
fn table_end(lines: &[String], from: usize) -> usize {
    let mut end = from;
    while end < lines.len() && lines[end].trim_start().starts_with('|') {
        end += 1;
    }
    end
}

/// Header (`|  |`) and separator (`| --- |`) rows carry no problem
fn is_structural_row(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Text of the first `[...]` link label, or the whole row
fn display_name(row: &str) -> &str {
    row.find('[')
        .and_then(|open| {
            let rest = &row[open + 1..];
            rest.find(']').map(|close| &rest[..close])
        })
        .unwrap_or(row)
}

/// Topic tables of a section in order of first appearance. Repeated
/// headings are folded into the first one.
fn parse_topics(section: &str) -> Vec<(String, Vec<String>)> {
    let mut topics: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for line in section.split('\n') {
        let trimmed = line.trim_end();
        if let Some(name) = trimmed.strip_prefix("## ") {
            let name = name.trim().to_string();
            let idx = *index.entry(name.clone()).or_insert_with(|| {
                topics.push((name, Vec::new()));
                topics.len() - 1
            });
            current = Some(idx);
        } else if trimmed.trim_start().starts_with('|') {
            if let Some(idx) = current {
                if !is_structural_row(trimmed) {
                    topics[idx].1.push(trimmed.trim_start().to_string());
                }
            }
        } else {
            current = None;
        }
    }

    topics
}

/// Remove every `## topic` table from `text`, returning its problem rows.
///
/// A heading not directly followed by a table row is left in place.
fn take_topic_tables(text: &mut String, topic: &str) -> Vec<String> {
    let heading = format!("## {}", topic);
    let mut lines: Vec<String> = text.split('\n').map(String::from).collect();
    let mut rows = Vec::new();
    let mut changed = false;

    let is_row = |line: &String| line.trim_start().starts_with('|');
    let mut start = 0;
    while start < lines.len() {
        if lines[start].trim_end() != heading || !lines.get(start + 1).is_some_and(is_row) {
            start += 1;
            continue;
        }

        let mut end = start + 1;
        while end < lines.len() && is_row(&lines[end]) {
            let row = lines[end].trim();
            if !is_structural_row(row) {
                rows.push(row.to_string());
            }
            end += 1;
        }
        lines.drain(start..end);
        changed = true;
    }

    if changed {
        *text = lines.join("\n");
    }
    rows
}
