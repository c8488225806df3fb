//! Reading progress tracking.
//!
//! The progress file lists books being read, one per line:
//!
//! ```text
//! James Joyce, Ulysses, 212of730
//! Le Guin\, Ursula, The Dispossessed, 40of387
//! ```
//!
//! `\` escapes the next character, so author or title may contain commas.
//! Progress is shown on the reading index as a ten-cell bar, `I---*------I`,
//! inside the section that follows `<i>in progress</i><br>`:
//!
//! ```html
//! <div class="row" data-isbn10="0679722769" data-pagecount="730">
//! <div class="author">James Joyce, Ulysses</div>
//! <div class="progress">I--*-------I</div></div>
//! ```
//!
//! A sync adds rows for new books, rewrites rows whose bar position or page
//! count changed, and moves finished books (`NofM` with N ≥ M) out of the
//! section: into the year list under `<b>YEAR</b><br>`, out of the progress
//! file, and into the main index's "Recently read" line.

use crate::config::{self, ReadingConfig};
use crate::splice::Cursor;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CELLS: u8 = 10;

#[derive(Error, Debug)]
pub enum ReadingError {
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
    #[error("Line {line} of {path}: expected 'Author, Title, NofM'")]
    Malformed { path: PathBuf, line: usize },
    #[error("Duplicate books in {path}; remove them before syncing:\n{}", describe_duplicates(.duplicates))]
    Duplicates {
        path: PathBuf,
        duplicates: Vec<Duplicate>,
    },
    #[error("Could not find the 'in progress' section in {0}")]
    MissingSection(PathBuf),
    #[error("No <b>{year}</b><br> header in {path} to list finished books under")]
    MissingYear { year: i32, path: PathBuf },
}

/// One line of the progress file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingEntry {
    pub author: String,
    pub title: String,
    pub pages_read: u32,
    pub total_pages: u32,
    /// Bar position, 1 through 10.
    pub progress: u8,
    pub completed: bool,
    /// 1-based line number in the progress file.
    pub line: usize,
}

/// Same author and title on two lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Duplicate {
    pub author: String,
    pub title: String,
    pub lines: (usize, usize),
}

fn describe_duplicates(duplicates: &[Duplicate]) -> String {
    duplicates
        .iter()
        .map(|d| {
            format!(
                "  \"{}, {}\" appears on lines {} and {}",
                d.author, d.title, d.lines.0, d.lines.1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A book row found in the in-progress section of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub author: String,
    pub title: String,
    pub progress: u8,
    pub page_count: Option<u32>,
    /// ISBN-10 with hyphens removed, empty if unknown.
    pub isbn10: String,
    /// Byte range of the whole row within the index.
    pub span: Range<usize>,
}

/// Outcome of a reading sync.
#[derive(Debug, Clone, Default)]
pub struct ReadingReport {
    pub added: usize,
    pub updated: usize,
    pub completed: usize,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

// ============================================================================
// Progress file
// ============================================================================

/// Split a line on unescaped commas, trimming each field.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        fields.push(current.trim().to_string());
    }
    fields
}

fn digit_run(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// First `NofM` in `text`.
pub fn parse_pages(text: &str) -> Option<(u32, u32)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let read_end = i + digit_run(&text[i..]);
        let rest = &text[read_end..];
        if let Some(after) = rest.strip_prefix("of") {
            let total_len = digit_run(after);
            if total_len > 0 {
                let read = text[i..read_end].parse().ok()?;
                let total = after[..total_len].parse().ok()?;
                return Some((read, total));
            }
        }
        i = read_end;
    }
    None
}

/// Bar position for `read` of `total` pages: 1 for 0–10%, up to 10.
pub fn progress_bucket(read: u32, total: u32) -> u8 {
    if total == 0 {
        return 1;
    }
    let percent = f64::from(read) / f64::from(total) * 100.0;
    (percent / 10.0).ceil().clamp(1.0, f64::from(CELLS)) as u8
}

/// Parse one non-blank progress line.
pub fn parse_entry(text: &str, line: usize) -> Option<ReadingEntry> {
    let fields = split_fields(text);
    if fields.len() < 3 {
        return None;
    }
    let (entry_pages, completed, progress) = match parse_pages(&fields[2]) {
        Some((read, total)) => {
            let completed = read >= total;
            let progress = if completed { 1 } else { progress_bucket(read, total) };
            ((read, total), completed, progress)
        }
        None => ((0, 0), false, 1),
    };
    Some(ReadingEntry {
        author: fields[0].clone(),
        title: fields[1].clone(),
        pages_read: entry_pages.0,
        total_pages: entry_pages.1,
        progress,
        completed,
        line,
    })
}

/// Parse every non-blank line of the progress file.
pub fn parse_progress_file(content: &str, path: &Path) -> Result<Vec<ReadingEntry>, ReadingError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| {
            parse_entry(text, i + 1).ok_or_else(|| ReadingError::Malformed {
                path: path.to_path_buf(),
                line: i + 1,
            })
        })
        .collect()
}

pub fn find_duplicates(entries: &[ReadingEntry]) -> Vec<Duplicate> {
    let mut duplicates = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let first = entries[..i]
            .iter()
            .find(|e| e.author == entry.author && e.title == entry.title);
        if let Some(first) = first {
            duplicates.push(Duplicate {
                author: entry.author.clone(),
                title: entry.title.clone(),
                lines: (first.line, entry.line),
            });
        }
    }
    duplicates
}

// ============================================================================
// Index page
// ============================================================================

fn normalize_isbn(isbn: &str) -> String {
    isbn.replace('-', "")
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = attrs.find(&needle)? + needle.len();
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}

/// Bar position of `I--*-------I`, 0 if the bar is not well formed.
pub fn bar_position(bar: &str) -> u8 {
    let inner = bar
        .trim()
        .strip_prefix('I')
        .and_then(|b| b.strip_suffix('I'))
        .unwrap_or("");
    match inner.find('*') {
        Some(star) if inner.chars().filter(|&c| c == '*').count() == 1
            && inner.chars().all(|c| c == '-' || c == '*') =>
        {
            u8::try_from(star + 1).unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn progress_bar(position: u8) -> String {
    let cells: String = (1..=CELLS)
        .map(|i| if i == position { '*' } else { '-' })
        .collect();
    format!("I{cells}I")
}

/// Byte range of the in-progress section: after `anchor` up to the first
/// `<br><br>` or `</p>`.
pub fn in_progress_section(html: &str, anchor: &str) -> Option<Range<usize>> {
    let start = html.find(anchor)? + anchor.len();
    let rest = &html[start..];
    let end = [rest.find("<br><br>"), rest.find("</p>")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    Some(start..start + end)
}

/// Book rows within `section` of `html`.
pub fn parse_rows(html: &str, section: Range<usize>) -> Vec<BookRow> {
    const ROW_OPEN: &str = r#"<div class="row""#;
    let text = &html[..section.end];
    let mut rows = Vec::new();
    let mut cursor = Cursor::new(text, section.start);

    while let Some(row) = cursor.seek(ROW_OPEN) {
        let Some(parsed) = parse_row(text, row) else {
            break;
        };
        cursor = Cursor::new(text, parsed.1);
        if let Some(book) = parsed.0 {
            rows.push(book);
        }
    }
    rows
}

/// Parse the row starting at `row`; returns the book (if its author line
/// splits into author and title) and the row end.
fn parse_row(text: &str, row: Cursor<'_>) -> Option<(Option<BookRow>, usize)> {
    let tag_end = row.seek(">")?;
    let attrs = &text[row.pos()..tag_end.pos()];

    let author_open = tag_end.seek(r#"<div class="author">"#)?.eat(r#"<div class="author">"#)?;
    let author_close = author_open.seek("</div>")?;
    let progress_open = author_close
        .seek(r#"<div class="progress">"#)?
        .eat(r#"<div class="progress">"#)?;
    let progress_close = progress_open.seek("</div></div>")?;
    let end = progress_close.eat("</div></div>")?.pos();

    let author_title = text[author_open.pos()..author_close.pos()].trim();
    let bar = &text[progress_open.pos()..progress_close.pos()];

    let book = author_title.rfind(", ").map(|split| BookRow {
        author: author_title[..split].to_string(),
        title: author_title[split + 2..].to_string(),
        progress: bar_position(bar),
        page_count: attr_value(attrs, "data-pagecount").and_then(|v| v.parse().ok()),
        isbn10: attr_value(attrs, "data-isbn10")
            .map(normalize_isbn)
            .unwrap_or_default(),
        span: row.pos()..end,
    });
    Some((book, end))
}

fn isbn_attribute(isbn: &str) -> String {
    if isbn.is_empty() {
        String::new()
    } else {
        format!(" data-isbn10=\"{isbn}\"")
    }
}

fn render_row(entry: &ReadingEntry, isbn_attr: &str) -> String {
    format!(
        "<div class=\"row\"{isbn_attr} data-pagecount=\"{}\">\n<div class=\"author\">{}, {}</div>\n<div class=\"progress\">{}</div></div>",
        entry.total_pages,
        entry.author,
        entry.title,
        progress_bar(entry.progress)
    )
}

fn render_finished(entry: &ReadingEntry, isbn: &str) -> String {
    format!(
        "\t<span data-book{} data-pagecount=\"{}\">{}, {}</span><br>\n",
        isbn_attribute(isbn),
        entry.total_pages,
        entry.author,
        entry.title
    )
}

// ============================================================================
// Sync
// ============================================================================

/// What a sync will do, per book.
#[derive(Debug, Default)]
pub struct Changes<'a> {
    pub added: Vec<&'a ReadingEntry>,
    pub updated: Vec<(&'a ReadingEntry, &'a BookRow)>,
    pub completed: Vec<(&'a ReadingEntry, Option<&'a BookRow>)>,
}

pub fn plan_changes<'a>(entries: &'a [ReadingEntry], rows: &'a [BookRow]) -> Changes<'a> {
    let mut changes = Changes::default();
    for entry in entries {
        let existing = rows
            .iter()
            .find(|r| r.author == entry.author && r.title == entry.title);
        match existing {
            _ if entry.completed => changes.completed.push((entry, existing)),
            None => changes.added.push(entry),
            Some(row)
                if row.progress != entry.progress
                    || row.page_count != Some(entry.total_pages) =>
            {
                changes.updated.push((entry, row))
            }
            Some(_) => {}
        }
    }
    changes
}

/// `<b>YEAR</b><br>`, the heading finished books are listed under.
pub fn year_header(year: i32) -> String {
    format!("<b>{year}</b><br>")
}

/// Apply `changes` to the reading index.
///
/// Finished books stay in the in-progress section when the index has no
/// header for `year`.
pub fn apply_to_index(html: &str, anchor: &str, changes: &Changes, year: i32) -> String {
    let mut out = html.to_string();

    let header = year_header(year);
    if !changes.completed.is_empty() && !out.contains(&header) {
        tracing::warn!(year, "no year header in reading index; finished books left in place");
    } else {
        for (entry, row) in &changes.completed {
            let isbn = row.map(|r| r.isbn10.as_str()).unwrap_or("");
            if let Some(at) = out.find(&header) {
                out.insert_str(at + header.len(), &render_finished(entry, isbn));
            }
        }
        for row in changes.completed.iter().filter_map(|(_, row)| *row) {
            out = out.replacen(&html[row.span.clone()], "", 1);
        }
    }

    for (entry, row) in &changes.updated {
        let new_row = render_row(entry, &isbn_attribute(&row.isbn10));
        out = out.replacen(&html[row.span.clone()], &new_row, 1);
    }

    if !changes.added.is_empty()
        && let Some(section) = in_progress_section(&out, anchor)
    {
        let new_rows: String = changes
            .added
            .iter()
            .map(|entry| format!("{}\n", render_row(entry, " data-isbn10=\"\"")))
            .collect();
        out.insert_str(section.start, &new_rows);
    }

    out
}

/// Drop the lines of finished books from the progress file.
pub fn remove_finished_lines(content: &str, finished: &[usize]) -> String {
    let kept: Vec<&str> = content
        .lines()
        .enumerate()
        .filter(|(i, _)| !finished.contains(&(i + 1)))
        .map(|(_, line)| line)
        .collect();
    format!("{}\n", kept.join("\n").trim())
}

/// Put `text` into the italic "Recently read" slot after `anchor`.
pub fn set_recently_read(html: &str, anchor: &str, text: &str) -> Option<String> {
    let slot = Cursor::new(html, html.find(anchor)? + anchor.len())
        .skip_ws()
        .eat("<p>")?
        .skip_ws()
        .eat("<i>")?;
    let close = slot.seek("<")?;
    close.eat("</i><br>")?;
    Some(format!(
        "{}{}{}",
        &html[..slot.pos()],
        text,
        &html[close.pos()..]
    ))
}

fn read(path: &Path) -> Result<String, ReadingError> {
    fs::read_to_string(path).map_err(|source| ReadingError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, content: &str) -> Result<(), ReadingError> {
    fs::write(path, content).map_err(|source| ReadingError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Sync the progress file into the reading index.
pub fn sync_reading(
    config: &ReadingConfig,
    root: &Path,
    year: i32,
) -> Result<ReadingReport, ReadingError> {
    let progress_path = config::resolve_path(root, &config.progress_file);
    let index_path = config::resolve_path(root, &config.index);

    let progress = read(&progress_path)?;
    let entries = parse_progress_file(&progress, &progress_path)?;
    let duplicates = find_duplicates(&entries);
    if !duplicates.is_empty() {
        return Err(ReadingError::Duplicates {
            path: progress_path,
            duplicates,
        });
    }

    let index = read(&index_path)?;
    let section = in_progress_section(&index, &config.section_anchor)
        .ok_or_else(|| ReadingError::MissingSection(index_path.clone()))?;
    let rows = parse_rows(&index, section);
    let changes = plan_changes(&entries, &rows);
    if !changes.completed.is_empty() && !index.contains(&year_header(year)) {
        return Err(ReadingError::MissingYear {
            year,
            path: index_path,
        });
    }
    tracing::debug!(
        rows = rows.len(),
        added = changes.added.len(),
        updated = changes.updated.len(),
        completed = changes.completed.len(),
        "planned reading changes"
    );

    let new_index = apply_to_index(&index, &config.section_anchor, &changes, year);

    let mut main_update = None;
    if config.update_main_index
        && let Some((latest, _)) = changes.completed.last()
    {
        let main_path = config::resolve_path(root, &config.main_index);
        let main = read(&main_path)?;
        let text = format!("{}, {}", latest.author, latest.title);
        match set_recently_read(&main, &config.recent_anchor, &text) {
            Some(updated) if updated != main => main_update = Some((main_path, updated)),
            Some(_) => {}
            None => tracing::warn!(
                file = %main_path.display(),
                "Recently read line not found; main index left unchanged"
            ),
        }
    }

    let mut report = ReadingReport {
        added: changes.added.len(),
        updated: changes.updated.len(),
        completed: changes.completed.len(),
        written: Vec::new(),
    };

    if !changes.completed.is_empty() {
        let finished: Vec<usize> = changes.completed.iter().map(|(e, _)| e.line).collect();
        write(&progress_path, &remove_finished_lines(&progress, &finished))?;
        report.written.push(progress_path);
    }
    if new_index != index {
        write(&index_path, &new_index)?;
        report.written.push(index_path);
    }
    if let Some((path, updated)) = main_update {
        write(&path, &updated)?;
        report.written.push(path);
    }

    Ok(report)
}
