//! Link entries in index pages.
//!
//! Two kinds of edits, both pure functions from page text to page text:
//!
//! - [`insert_entry`] prepends a dated link to a section listing, right after
//!   the first line that is exactly `<p>`. A listing that already links to the
//!   same href is left alone, so publishing twice adds one entry.
//! - [`replace_recent_block`] swaps the `<p>…</p><br>` block after the
//!   "Recently wrote" heading of the main index for a block holding only the
//!   newest entry.
//!
//! ```text
//! <a class="no-underline" href="wrote/wroteindex.html"><b>Recently wrote ></b></a><br>
//! <p>
//!     <span class="entry-date">2024-01-01</span> <a href="wrote/hello.html">Hello</a><br>
//! </p><br>
//! ```

use crate::splice::Cursor;
use maud::html;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("Could not find <p> in index to insert link")]
    MissingParagraph,
    #[error("Could not find the Recently wrote block to replace")]
    MissingRecentBlock,
}

/// A dated link, as shown in index pages.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEntry {
    pub date: String,
    pub href: String,
    pub text: String,
}

impl LinkEntry {
    pub fn new(date: &str, href: &str, text: &str) -> Self {
        Self {
            date: date.to_string(),
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    /// Same entry with `prefix` in front of the href.
    pub fn with_href_prefix(&self, prefix: &str) -> Self {
        Self {
            href: format!("{prefix}{}", self.href),
            ..self.clone()
        }
    }

    /// `<span class="entry-date">DATE</span> <a href="HREF">TEXT</a><br>`
    pub fn render(&self) -> String {
        html! {
            span.entry-date { (self.date) }
            " "
            a href=(self.href) { (self.text) }
            br;
        }
        .into_string()
    }

    /// The href attribute as it appears in a rendered entry.
    fn href_attribute(&self) -> String {
        format!("href=\"{}\"", html! { (self.href) }.into_string())
    }
}

/// Whether `index` already links to the entry's href.
pub fn contains_link(index: &str, entry: &LinkEntry) -> bool {
    index.contains(&entry.href_attribute())
}

/// Insert `entry` on its own line after the first `<p>` line.
///
/// Returns `Ok(None)` when the index already links to the entry's href.
pub fn insert_entry(index: &str, entry: &LinkEntry) -> Result<Option<String>, IndexError> {
    if contains_link(index, entry) {
        return Ok(None);
    }

    let mut out = String::with_capacity(index.len() + 128);
    let mut inserted = false;
    for line in index.split_inclusive('\n') {
        out.push_str(line);
        if !inserted && line.trim() == "<p>" {
            if !line.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&entry.render());
            out.push('\n');
            inserted = true;
        }
    }

    if inserted {
        Ok(Some(out))
    } else {
        Err(IndexError::MissingParagraph)
    }
}

/// Byte range of the `<p>…</p><br>` block following the heading that ends at `pos`.
fn recent_block_span(html: &str, pos: usize) -> Option<(usize, usize)> {
    let block = Cursor::new(html, pos)
        .skip_ws()
        .eat_any(&["&gt;", ">"])?
        .eat("</b></a><br>")?
        .skip_ws();
    let end = block.eat("<p>")?.seek("</p><br>")?.eat("</p><br>")?;
    Some((block.pos(), end.pos()))
}

/// Replace the block after `anchor` with one holding only `entry`.
pub fn replace_recent_block(
    html: &str,
    anchor: &str,
    entry: &LinkEntry,
) -> Result<String, IndexError> {
    let block = format!("<p>\n    {}\n</p><br>", entry.render());
    let mut from = 0;
    while let Some(found) = html[from..].find(anchor) {
        let heading_end = from + found + anchor.len();
        if let Some((start, end)) = recent_block_span(html, heading_end) {
            return Ok(format!("{}{}{}", &html[..start], block, &html[end..]));
        }
        from = heading_end;
    }
    Err(IndexError::MissingRecentBlock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MAIN_INDEX, RECENT_ANCHOR, WROTE_INDEX};

    fn hello() -> LinkEntry {
        LinkEntry::new("2024-01-01", "hello.html", "Hello")
    }

    #[test]
    fn entry_render_format() {
        assert_eq!(
            hello().render(),
            r#"<span class="entry-date">2024-01-01</span> <a href="hello.html">Hello</a><br>"#
        );
    }

    #[test]
    fn entry_text_is_escaped() {
        let entry = LinkEntry::new("2024", "a.html", "Fish & <Chips>");
        assert!(entry.render().contains("Fish &amp; &lt;Chips&gt;"));
    }

    #[test]
    fn insert_after_first_paragraph_line() {
        let out = insert_entry(WROTE_INDEX, &hello()).unwrap().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let p = lines.iter().position(|l| l.trim() == "<p>").unwrap();
        assert_eq!(lines[p + 1], hello().render());
        assert!(out.contains("older.html"));
    }

    #[test]
    fn insert_is_idempotent() {
        let once = insert_entry(WROTE_INDEX, &hello()).unwrap().unwrap();
        assert_eq!(insert_entry(&once, &hello()).unwrap(), None);
        assert_eq!(once.matches(r#"href="hello.html""#).count(), 1);
    }

    #[test]
    fn existing_href_anywhere_skips() {
        let index = "<p>\n<!-- <a href=\"hello.html\">draft</a> -->\n</p>\n";
        assert_eq!(insert_entry(index, &hello()).unwrap(), None);
    }

    #[test]
    fn similar_href_does_not_skip() {
        let index = "<p>\n<a href=\"hello.html.bak\">x</a>\n</p>\n";
        assert!(insert_entry(index, &hello()).unwrap().is_some());
    }

    #[test]
    fn indented_paragraph_marker_matches() {
        let index = "<body>\n    <p>  \n</p>\n";
        let out = insert_entry(index, &hello()).unwrap().unwrap();
        assert_eq!(
            out,
            format!("<body>\n    <p>  \n{}\n</p>\n", hello().render())
        );
    }

    #[test]
    fn paragraph_with_content_is_not_a_marker() {
        let index = "<p>Intro</p>\n";
        assert_eq!(
            insert_entry(index, &hello()),
            Err(IndexError::MissingParagraph)
        );
    }

    #[test]
    fn marker_on_last_line_without_newline() {
        let out = insert_entry("<p>", &hello()).unwrap().unwrap();
        assert_eq!(out, format!("<p>\n{}\n", hello().render()));
    }

    #[test]
    fn recent_block_replaced() {
        let entry = hello().with_href_prefix("wrote/");
        let out = replace_recent_block(MAIN_INDEX, RECENT_ANCHOR, &entry).unwrap();
        assert!(out.contains(
            "<p>\n    <span class=\"entry-date\">2024-01-01</span> <a href=\"wrote/hello.html\">Hello</a><br>\n</p><br>"
        ));
        assert!(!out.contains("old-post.html"));
        assert!(out.contains("Recently read"));
    }

    #[test]
    fn recent_block_replace_is_stable() {
        let entry = hello().with_href_prefix("wrote/");
        let once = replace_recent_block(MAIN_INDEX, RECENT_ANCHOR, &entry).unwrap();
        let twice = replace_recent_block(&once, RECENT_ANCHOR, &entry).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn recent_block_accepts_escaped_gt() {
        let html = format!("{RECENT_ANCHOR} &gt;</b></a><br>\n<p>old</p><br>\n");
        let out = replace_recent_block(&html, RECENT_ANCHOR, &hello()).unwrap();
        assert!(out.starts_with(&format!("{RECENT_ANCHOR} &gt;</b></a><br>\n<p>\n")));
        assert!(out.ends_with("</p><br>\n"));
    }

    #[test]
    fn recent_block_missing() {
        assert_eq!(
            replace_recent_block("<p>nothing</p><br>", RECENT_ANCHOR, &hello()),
            Err(IndexError::MissingRecentBlock)
        );
    }

    #[test]
    fn recent_anchor_without_block_is_missing() {
        let html = format!("{RECENT_ANCHOR} ></b></a><br>\n<div>no paragraph</div>");
        assert_eq!(
            replace_recent_block(&html, RECENT_ANCHOR, &hello()),
            Err(IndexError::MissingRecentBlock)
        );
    }
}
