//! Practice sites, difficulties, and the naming rules for files pushed to
//! the repository.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CodeHubError, Result};

/// Name of the per-problem and per-platform readme
pub const README_FILENAME: &str = "README.md";

/// Name of the persisted stats file (one per platform directory)
pub const STATS_FILENAME: &str = "stats.json";

/// Name of the optional notes file
pub const NOTES_FILENAME: &str = "NOTES.md";

/// A coding-practice site whose solutions are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Leetcode,
    Geeksforgeeks,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Leetcode, Platform::Geeksforgeeks];

    /// Top-level directory in the repository, also the key inside stats.json
    pub fn dir(&self) -> &'static str {
        match self {
            Platform::Leetcode => "leetcode",
            Platform::Geeksforgeeks => "geeksforgeeks",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Leetcode => "LeetCode",
            Platform::Geeksforgeeks => "GeeksForGeeks",
        }
    }

    /// Difficulties counted for this platform
    pub fn difficulties(&self) -> &'static [Difficulty] {
        match self {
            Platform::Leetcode => &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
            Platform::Geeksforgeeks => &[
                Difficulty::School,
                Difficulty::Basic,
                Difficulty::Easy,
                Difficulty::Medium,
                Difficulty::Hard,
            ],
        }
    }

    /// Text of the platform README created when the repository has none
    pub fn default_readme(&self) -> String {
        format!(
            "A collection of {} questions to ace the coding interview! - Created using [CodeHub](https://github.com/)",
            self.display_name()
        )
    }

    /// Path of a file in the repository.
    ///
    /// An empty `filename` addresses a platform-level file named `problem`
    /// (for example `leetcode/README.md`).
    pub fn path(&self, problem: &str, filename: &str) -> String {
        if filename.is_empty() {
            format!("{}/{}", self.dir(), problem)
        } else {
            format!("{}/{}/{}", self.dir(), problem, filename)
        }
    }

    /// Resolve the file extension for a language label such as `Python3` or
    /// `C++ (g++ 5.4)`.
    pub fn language_extension(&self, language: &str) -> Result<&'static str> {
        match language_extension(language) {
            Some(ext) => Ok(ext),
            None => match self {
                Platform::Leetcode => Err(CodeHubError::LanguageNotFound(language.to_string())),
                Platform::Geeksforgeeks => Ok(".txt"),
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Map a language label to its source file extension
pub fn language_extension(language: &str) -> Option<&'static str> {
    let label = language.split('(').next().unwrap_or_default().trim();
    let ext = match label {
        "C" => ".c",
        "C++" | "cpp" => ".cpp",
        "C#" | "csharp" => ".cs",
        "Java" | "java" => ".java",
        "Python" | "Python3" | "python" | "python3" => ".py",
        "JavaScript" | "Javascript" | "javascript" => ".js",
        "TypeScript" | "typescript" => ".ts",
        "Go" | "golang" => ".go",
        "Rust" | "rust" => ".rs",
        "Kotlin" | "kotlin" => ".kt",
        "Swift" | "swift" => ".swift",
        "Ruby" | "ruby" => ".rb",
        "Scala" | "scala" => ".scala",
        "PHP" | "php" => ".php",
        "MySQL" | "mysql" => ".sql",
        _ => return None,
    };
    Some(ext)
}

/// Difficulty label as shown by the practice site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    School,
    Basic,
    Easy,
    Medium,
    Hard,
    Unknown,
}

impl Difficulty {
    /// Parse text like `Difficulty: Medium` or `EASY`
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let label = match trimmed.get(..11) {
            Some(prefix) if prefix.eq_ignore_ascii_case("difficulty:") => &trimmed[11..],
            _ => trimmed,
        };

        match label.trim().to_ascii_uppercase().as_str() {
            "SCHOOL" => Difficulty::School,
            "BASIC" => Difficulty::Basic,
            "EASY" => Difficulty::Easy,
            "MEDIUM" => Difficulty::Medium,
            "HARD" => Difficulty::Hard,
            _ => Difficulty::Unknown,
        }
    }

    /// Key used in the stats ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::School => "school",
            Difficulty::Basic => "basic",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Difficulty::School => "School",
            Difficulty::Basic => "Basic",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

const ACCENTED: &str = "àáâäæãåāăąçćčđďèéêëēėęěğǵḧîïíīįìłḿñńǹňôöòóœøōõőṕŕřßśšşșťțûüùúūǘůűųẃẍÿýžźż·/_,:;";
const FOLDED: &str = "aaaaaaaaaacccddeeeeeeeegghiiiiiilmnnnnoooooooooprrsssssttuuuuuuuuuwxyyzzz------";

/// Turn a problem title into a directory-safe slug
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut spaced = String::with_capacity(lowered.len());
    let mut in_space = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_space {
                spaced.push('-');
            }
            in_space = true;
        } else {
            spaced.push(c);
            in_space = false;
        }
    }

    let mut slug = String::with_capacity(spaced.len());
    for c in spaced.chars() {
        if let Some(pos) = ACCENTED.chars().position(|a| a == c) {
            slug.extend(FOLDED.chars().nth(pos));
        } else if c == '&' {
            slug.push_str("-and-");
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            Platform::Leetcode.path("0001-two-sum", "0001-two-sum.py"),
            "leetcode/0001-two-sum/0001-two-sum.py"
        );
        assert_eq!(Platform::Geeksforgeeks.path(STATS_FILENAME, ""), "geeksforgeeks/stats.json");
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Difficulty: Medium"), Difficulty::Medium);
        assert_eq!(Difficulty::parse("  EASY "), Difficulty::Easy);
        assert_eq!(Difficulty::parse("difficulty:school"), Difficulty::School);
        assert_eq!(Difficulty::parse("Impossible"), Difficulty::Unknown);
        assert_eq!(Difficulty::parse(""), Difficulty::Unknown);
    }

    #[test]
    fn test_language_extension() {
        assert_eq!(language_extension("Python3"), Some(".py"));
        assert_eq!(language_extension("C++ (g++ 5.4)"), Some(".cpp"));
        assert_eq!(language_extension("Brainfuck"), None);

        assert!(matches!(
            Platform::Leetcode.language_extension("Brainfuck"),
            Err(CodeHubError::LanguageNotFound(_))
        ));
        assert_eq!(Platform::Geeksforgeeks.language_extension("Brainfuck").unwrap(), ".txt");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Two Sum"), "two-sum");
        assert_eq!(slugify("  Rotate   Array  "), "rotate-array");
        assert_eq!(slugify("Café & Crème"), "cafe-and-creme");
        assert_eq!(slugify("Max sum: sub/array"), "max-sum-sub-array");
        assert_eq!(slugify("K-th (Largest)!"), "k-th-largest");
    }
}
