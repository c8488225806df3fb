//! CLI output formatting for all tools.
//!
//! Each tool has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects. Paths are shown relative to the site root when
//! they live under it.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Updated aiprojs.html
//!   arss: 4 images
//!   ulysquot: 2 images
//!   empty: 0 images
//! ```
//!
//! ## Post
//!
//! ```text
//! → Generated hello.html and updated wroteindex.html
//!   Main index: ../index.html
//! ```
//!
//! ## Reading
//!
//! ```text
//! Reading: 1 added, 1 updated, 1 completed
//!   Wrote readindex.html
//! ```
//!
//! Diagnostics (warnings, debug detail) go through `tracing` to stderr, not
//! through this module.

use crate::gallery::GalleryReport;
use crate::post::PublishReport;
use crate::reading::ReadingReport;
use std::path::Path;

/// `path` relative to `root`, or as given when outside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Gallery
// ============================================================================

pub fn format_gallery_report(report: &GalleryReport, root: &Path) -> Vec<String> {
    let file = display_path(&report.html_file, root);
    let mut lines = vec![if report.changed {
        format!("Updated {file}")
    } else {
        format!("{file} already up to date")
    }];

    lines.extend(
        report
            .counts
            .iter()
            .map(|(project, n)| format!("  {project}: {}", plural(*n, "image"))),
    );

    if !report.skipped_regions.is_empty() {
        lines.push(format!(
            "Skipped (anchor not found): {}",
            report.skipped_regions.join(", ")
        ));
    }
    if !report.missing_thumbnails.is_empty() {
        lines.push(format!(
            "No thumbnail in page for: {}",
            report.missing_thumbnails.join(", ")
        ));
    }
    lines
}

pub fn print_gallery_report(report: &GalleryReport, root: &Path) {
    for line in format_gallery_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Post
// ============================================================================

pub fn format_publish_report(report: &PublishReport, root: &Path) -> Vec<String> {
    let index = display_path(&report.index, root);
    let mut lines = vec![if report.index_updated {
        format!("→ Generated {} and updated {index}", report.filename)
    } else {
        format!(
            "→ Generated {} ({index} already links to it)",
            report.filename
        )
    }];
    if let Some(main) = &report.main_index {
        lines.push(format!("  Main index: {}", display_path(main, root)));
    }
    lines
}

pub fn print_publish_report(report: &PublishReport, root: &Path) {
    for line in format_publish_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Reading
// ============================================================================

pub fn format_reading_report(report: &ReadingReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Reading: {} added, {} updated, {} completed",
        report.added, report.updated, report.completed
    )];
    if report.written.is_empty() {
        lines.push("  Nothing to change".to_string());
    }
    lines.extend(
        report
            .written
            .iter()
            .map(|path| format!("  Wrote {}", display_path(path, root))),
    );
    lines
}

pub fn print_reading_report(report: &ReadingReport, root: &Path) {
    for line in format_reading_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
