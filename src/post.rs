//! Post publishing.
//!
//! A post source is a markdown file with a fixed three-part layout:
//!
//! ```text
//! # Hello            <- title, leading #'s stripped
//! 2024-01-01         <- date, used verbatim
//! Some *text*        <- body, everything after line two
//! ```
//!
//! Publishing renders `hello.html` next to the section index, adds a dated
//! entry to that index, and points the main index's "Recently wrote" block at
//! the new post. Every edit is computed before the first write, so a missing
//! anchor leaves all files as they were.

use crate::config::{self, PostConfig};
use crate::index::{self, IndexError, LinkEntry};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const POST_CSS: &str = "
            body {
                margin: 90px auto 50px;
                width: 700px;
                font-family: 'iA Writer Quattro S', serif !important;
                font-size: 16px;
                line-height: 1.4;
            }
            .right { float: right; }
        ";

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Markdown file needs at least 3 lines (title, date, body): {0}")]
    TooShort(PathBuf),
    #[error("Cannot derive an output name from {0}")]
    InvalidSource(PathBuf),
    #[error("{source} ({path})")]
    Index {
        path: PathBuf,
        #[source]
        source: IndexError,
    },
}

/// A parsed post source.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub date: String,
    /// Markdown body, trimmed.
    pub body: String,
}

/// Outcome of publishing a post.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Generated page filename (no directory).
    pub filename: String,
    pub page: PathBuf,
    pub index: PathBuf,
    /// False when the index already linked to the page.
    pub index_updated: bool,
    pub main_index: Option<PathBuf>,
}

/// Split post source into title, date and body. `None` if under three lines.
pub fn parse_post(content: &str) -> Option<Post> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 3 {
        return None;
    }
    Some(Post {
        title: lines[0].trim_start_matches('#').trim().to_string(),
        date: lines[1].trim().to_string(),
        body: lines[2..].join("\n").trim().to_string(),
    })
}

/// `posts/hello.md` → `hello.html`
pub fn output_filename(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    Some(format!("{stem}.html"))
}

pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    body_html
}

/// Render the standalone page for a post.
pub fn render_page(post: &Post, stylesheet: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (post.title) }
                link href=(stylesheet) rel="stylesheet" type="text/css" media="all";
                style { (PreEscaped(POST_CSS)) }
            }
            body {
                b { (post.title) }
                div.right { (post.date) }
                hr;
                (PreEscaped(render_markdown(&post.body)))
            }
        }
    }
}

fn read(path: &Path) -> Result<String, PostError> {
    fs::read_to_string(path).map_err(|source| PostError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, content: &str) -> Result<(), PostError> {
    fs::write(path, content).map_err(|source| PostError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a post and link it from the index pages.
pub fn publish(
    source: &Path,
    config: &PostConfig,
    root: &Path,
) -> Result<PublishReport, PostError> {
    let post = parse_post(&read(source)?).ok_or_else(|| PostError::TooShort(source.to_path_buf()))?;
    let filename =
        output_filename(source).ok_or_else(|| PostError::InvalidSource(source.to_path_buf()))?;
    let page_html = render_page(&post, &config.stylesheet).into_string();
    let entry = LinkEntry::new(&post.date, &filename, &post.title);

    let index_path = config::resolve_path(root, &config.index);
    let updated_index = index::insert_entry(&read(&index_path)?, &entry).map_err(|source| {
        PostError::Index {
            path: index_path.clone(),
            source,
        }
    })?;
    if updated_index.is_none() {
        tracing::info!(index = %index_path.display(), href = %filename, "index already links to post");
    }

    let main_update = if config.update_main_index {
        let main_path = config::resolve_path(root, &config.main_index);
        let recent = entry.with_href_prefix(&config.main_index_href_prefix);
        let updated =
            index::replace_recent_block(&read(&main_path)?, &config.recent_anchor, &recent)
                .map_err(|source| PostError::Index {
                    path: main_path.clone(),
                    source,
                })?;
        Some((main_path, updated))
    } else {
        None
    };

    let output_dir = config::resolve_path(root, &config.output_dir);
    fs::create_dir_all(&output_dir).map_err(|source| PostError::Write {
        path: output_dir.clone(),
        source,
    })?;
    let page = output_dir.join(&filename);
    write(&page, &page_html)?;
    tracing::debug!(page = %page.display(), "wrote post page");

    let index_updated = updated_index.is_some();
    if let Some(updated) = updated_index {
        write(&index_path, &updated)?;
    }
    let main_index = match main_update {
        Some((path, updated)) => {
            write(&path, &updated)?;
            Some(path)
        }
        None => None,
    };

    Ok(PublishReport {
        filename,
        page,
        index: index_path,
        index_updated,
        main_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MAIN_INDEX, WROTE_INDEX, post_site};

    #[test]
    fn parse_title_date_body() {
        let post = parse_post("# Hello\n2024-01-01\nSome *text*\n").unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.date, "2024-01-01");
        assert_eq!(post.body, "Some *text*");
    }

    #[test]
    fn title_heading_markers_stripped() {
        let post = parse_post("###   Deep title  \n  2024  \nbody").unwrap();
        assert_eq!(post.title, "Deep title");
        assert_eq!(post.date, "2024");
    }

    #[test]
    fn title_without_heading_marker() {
        let post = parse_post("Plain\n2024\nbody").unwrap();
        assert_eq!(post.title, "Plain");
    }

    #[test]
    fn body_keeps_inner_blank_lines() {
        let post = parse_post("T\nD\n\nPara one\n\nPara two\n\n").unwrap();
        assert_eq!(post.body, "Para one\n\nPara two");
    }

    #[test]
    fn too_short_is_none() {
        assert!(parse_post("# Title\n2024").is_none());
        assert!(parse_post("").is_none());
    }

    #[test]
    fn three_lines_with_empty_body_is_ok() {
        let post = parse_post("T\nD\n\n").unwrap();
        assert_eq!(post.body, "");
    }

    #[test]
    fn output_name_strips_directory_and_extension() {
        assert_eq!(
            output_filename(Path::new("drafts/hello.md")).as_deref(),
            Some("hello.html")
        );
        assert_eq!(
            output_filename(Path::new("notes.v2.markdown")).as_deref(),
            Some("notes.v2.html")
        );
        assert_eq!(output_filename(Path::new("bare")).as_deref(), Some("bare.html"));
    }

    #[test]
    fn page_contains_title_date_and_body() {
        let post = parse_post("# Hello\n2024-01-01\nSome *text*").unwrap();
        let html = render_page(&post, "../style.css").into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains("<b>Hello</b>"));
        assert!(html.contains(r#"<div class="right">2024-01-01</div>"#));
        assert!(html.contains("<em>text</em>"));
        assert!(html.contains(r#"href="../style.css""#));
    }

    #[test]
    fn title_is_escaped_in_page() {
        let post = parse_post("# A <b> & c\nd\nbody").unwrap();
        let html = render_page(&post, "s.css").into_string();
        assert!(html.contains("<title>A &lt;b&gt; &amp; c</title>"));
    }

    #[test]
    fn publish_writes_page_and_indexes() {
        let site = post_site();
        let source = site.path().join("drafts/hello.md");
        let report = publish(&source, &site.config, &site.root()).unwrap();

        assert_eq!(report.filename, "hello.html");
        assert!(report.index_updated);
        let page = fs::read_to_string(&report.page).unwrap();
        assert!(page.contains("<title>Hello</title>"));
        assert!(page.contains("<em>text</em>"));

        let index = fs::read_to_string(&report.index).unwrap();
        assert!(index.contains(
            r#"<span class="entry-date">2024-01-01</span> <a href="hello.html">Hello</a><br>"#
        ));

        let main = fs::read_to_string(report.main_index.unwrap()).unwrap();
        assert!(main.contains(r#"<a href="wrote/hello.html">Hello</a>"#));
    }

    #[test]
    fn publish_twice_adds_one_entry() {
        let site = post_site();
        let source = site.path().join("drafts/hello.md");
        publish(&source, &site.config, &site.root()).unwrap();
        let second = publish(&source, &site.config, &site.root()).unwrap();
        assert!(!second.index_updated);

        let index = fs::read_to_string(&second.index).unwrap();
        assert_eq!(index.matches(r#"href="hello.html""#).count(), 1);
    }

    #[test]
    fn missing_paragraph_writes_nothing() {
        let site = post_site();
        let index_path = site.root().join("wroteindex.html");
        let broken = WROTE_INDEX.replace("<p>\n", "<div>\n");
        fs::write(&index_path, &broken).unwrap();

        let source = site.path().join("drafts/hello.md");
        let result = publish(&source, &site.config, &site.root());
        assert!(matches!(
            result,
            Err(PostError::Index {
                source: IndexError::MissingParagraph,
                ..
            })
        ));
        assert!(!site.root().join("hello.html").exists());
        assert_eq!(fs::read_to_string(&index_path).unwrap(), broken);
        assert_eq!(
            fs::read_to_string(site.path().join("index.html")).unwrap(),
            MAIN_INDEX
        );
    }

    #[test]
    fn missing_recent_block_writes_nothing() {
        let site = post_site();
        fs::write(site.path().join("index.html"), "<html></html>").unwrap();
        let source = site.path().join("drafts/hello.md");
        let result = publish(&source, &site.config, &site.root());
        assert!(matches!(
            result,
            Err(PostError::Index {
                source: IndexError::MissingRecentBlock,
                ..
            })
        ));
        assert!(!site.root().join("hello.html").exists());
        assert_eq!(
            fs::read_to_string(site.root().join("wroteindex.html")).unwrap(),
            WROTE_INDEX
        );
    }

    #[test]
    fn main_index_update_can_be_disabled() {
        let mut site = post_site();
        site.config.update_main_index = false;
        fs::remove_file(site.path().join("index.html")).unwrap();
        let source = site.path().join("drafts/hello.md");
        let report = publish(&source, &site.config, &site.root()).unwrap();
        assert!(report.main_index.is_none());
    }

    #[test]
    fn short_source_is_error() {
        let site = post_site();
        let source = site.path().join("drafts/short.md");
        fs::write(&source, "# Only title\n").unwrap();
        assert!(matches!(
            publish(&source, &site.config, &site.root()),
            Err(PostError::TooShort(_))
        ));
    }
}
