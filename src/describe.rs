//! Project description file parsing.
//!
//! The description file is a loose markdown document with one block per
//! project:
//!
//! ```text
//! # arss
//! A feed reader that ranks articles by
//! <a href="https://example.org">semantic</a> similarity.
//!
//! # ulysquot
//! Quotes from Ulysses.
//! ```
//!
//! A heading is a line of exactly `# ` followed by a single word (letters,
//! digits, `_`). Anything else, `## Notes` or `# two words` included, is body
//! text of the current block. Body lines are trimmed and joined with single
//! spaces; inline HTML passes through untouched.

use serde::Serialize;
use std::fs;
use std::path::Path;

/// One project block from the description file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDescription {
    pub name: String,
    /// Single-paragraph description, possibly containing HTML.
    pub description: String,
}

/// Return the project name if `line` is a project heading.
fn heading_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix("# ")?.trim_end();
    let is_word = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_word.then_some(name)
}

/// Parse description file content into blocks, in first-appearance order.
///
/// Text before the first heading is ignored. A heading repeated later keeps
/// its original position and takes the later body.
pub fn parse_descriptions(content: &str) -> Vec<ProjectDescription> {
    let mut blocks: Vec<(String, Vec<&str>)> = Vec::new();

    for line in content.lines() {
        if let Some(name) = heading_name(line) {
            blocks.push((name.to_string(), Vec::new()));
        } else if let Some((_, body)) = blocks.last_mut() {
            body.push(line);
        }
    }

    let mut projects: Vec<ProjectDescription> = Vec::new();
    for (name, body) in blocks {
        let description = body
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        match projects.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.description = description,
            None => projects.push(ProjectDescription { name, description }),
        }
    }
    projects
}

/// Read and parse a description file.
pub fn load_descriptions(path: &Path) -> std::io::Result<Vec<ProjectDescription>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_descriptions(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(projects: &[ProjectDescription]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn parses_blocks_in_order() {
        let projects = parse_descriptions("# arss\nFeed reader.\n\n# ulysquot\nQuotes.\n");
        assert_eq!(names(&projects), vec!["arss", "ulysquot"]);
        assert_eq!(projects[0].description, "Feed reader.");
        assert_eq!(projects[1].description, "Quotes.");
    }

    #[test]
    fn multiline_body_collapses_to_one_paragraph() {
        let projects = parse_descriptions("# arss\n  Line one\n\n   line two  \nline three\n");
        assert_eq!(projects[0].description, "Line one line two line three");
    }

    #[test]
    fn markup_is_preserved() {
        let projects =
            parse_descriptions("# arss\nSee <a href=\"https://x.org\">the\nsite</a>.\n");
        assert_eq!(
            projects[0].description,
            "See <a href=\"https://x.org\">the site</a>."
        );
    }

    #[test]
    fn empty_body_yields_empty_description() {
        let projects = parse_descriptions("# arss\n# ulysquot\nQuotes.");
        assert_eq!(projects[0].description, "");
        assert_eq!(projects[1].description, "Quotes.");
    }

    #[test]
    fn non_heading_lines_are_body_text() {
        let projects = parse_descriptions("# arss\n## Notes\n# two words\n#tight\nend");
        assert_eq!(names(&projects), vec!["arss"]);
        assert_eq!(projects[0].description, "## Notes # two words #tight end");
    }

    #[test]
    fn heading_allows_trailing_whitespace() {
        let projects = parse_descriptions("# arss   \nBody\r\n");
        assert_eq!(names(&projects), vec!["arss"]);
        assert_eq!(projects[0].description, "Body");
    }

    #[test]
    fn names_are_case_sensitive() {
        let projects = parse_descriptions("# Arss\nUpper\n# arss\nLower\n");
        assert_eq!(names(&projects), vec!["Arss", "arss"]);
    }

    #[test]
    fn preamble_is_ignored() {
        let projects = parse_descriptions("Intro text\n\n# arss\nBody");
        assert_eq!(names(&projects), vec!["arss"]);
    }

    #[test]
    fn repeated_heading_keeps_position_takes_last_body() {
        let projects = parse_descriptions("# a\nfirst\n# b\nbee\n# a\nsecond\n");
        assert_eq!(names(&projects), vec!["a", "b"]);
        assert_eq!(projects[0].description, "second");
    }

    #[test]
    fn empty_file_has_no_projects() {
        assert!(parse_descriptions("").is_empty());
    }
}
