//! Gallery page updates.
//!
//! The gallery page is hand-maintained HTML with two generated regions:
//!
//! - **projects**: one block per project (thumbnail, image-count badge, name,
//!   description), between `<hr>\n\n` and `<!-- Lightbox Modal -->`.
//! - **manifest**: the `projectImages` object the lightbox script reads,
//!   mapping each project to its ordered image paths.
//!
//! ## Variants
//!
//! The full update re-renders every project block from the description file;
//! projects without images get a "No images" placeholder. The thumbnail-only
//! update leaves hand-edited blocks alone and only touches each project's
//! thumbnail `src` and count badge. Both rewrite the manifest.
//!
//! ## Missing anchors
//!
//! A region whose anchors are not in the page is skipped with a warning and
//! listed in the report. In strict mode it fails the run before anything is
//! written.

use crate::config::{self, GalleryConfig};
use crate::describe::{self, ProjectDescription};
use crate::scan::{self, Catalog, ProjectImages, ScanError};
use crate::splice::{Cursor, Document, RegionSpec, SpliceError};
use maud::{Markup, PreEscaped, html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROJECTS_REGION: &str = "projects";
pub const MANIFEST_REGION: &str = "manifest";

const BADGE_OPEN: &str = r#"<div class="image-count">"#;
const PLACEHOLDER_STYLE: &str =
    "background: #f0f0f0; display: flex; align-items: center; justify-content: center;";

#[derive(Error, Debug)]
pub enum GalleryError {
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
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Splice(#[from] SpliceError),
    #[error("Anchor for region '{region}' not found in {path}")]
    MissingAnchor { region: String, path: PathBuf },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GalleryOptions {
    /// Only update thumbnails and badges, keep project blocks.
    pub thumbs_only: bool,
    /// Treat a missing anchor as an error.
    pub strict: bool,
}

/// Outcome of a gallery update.
#[derive(Debug, Clone)]
pub struct GalleryReport {
    pub html_file: PathBuf,
    /// Image count per project, in description order.
    pub counts: Vec<(String, usize)>,
    /// Regions left unchanged because their anchors were missing.
    pub skipped_regions: Vec<String>,
    /// Projects with images but no thumbnail in the page (thumbnail-only).
    pub missing_thumbnails: Vec<String>,
    /// Whether the page content changed.
    pub changed: bool,
}

/// What a gallery update would write, for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryPlan {
    pub projects: Vec<ProjectDescription>,
    pub catalog: Catalog,
}

// ============================================================================
// Rendering
// ============================================================================

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn image_src(prefix: &str, filename: &str) -> String {
    format!("{prefix}{filename}")
}

/// Click handler opening the lightbox on a project's first image.
pub fn lightbox_handler(project: &str) -> String {
    format!("openLightbox('{project}', 0)")
}

/// Single-quoted JavaScript string literal.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render one project block. `images` is `None` for a project without images.
pub fn render_project(
    project: &ProjectDescription,
    images: Option<&ProjectImages>,
    prefix: &str,
) -> Markup {
    let title = capitalize(&project.name);
    let thumbnail = images.and_then(|p| p.images.first().map(|first| (first, p.images.len())));

    html! {
        div.project {
            @if let Some((first, count)) = thumbnail {
                div.project-image onclick=(lightbox_handler(&project.name)) {
                    img src=(image_src(prefix, &first.filename)) alt=(title);
                    @if count > 1 {
                        div.image-count { (count) }
                    }
                }
            } @else {
                div.project-image style=(PLACEHOLDER_STYLE) {
                    span style="color: #999;" { "No images" }
                }
            }
            div.project-content {
                h2 { (project.name) }
                p { (PreEscaped(&project.description)) }
            }
        }
    }
}

/// Render the whole projects region: one commented block per project.
pub fn render_projects_region(
    descriptions: &[ProjectDescription],
    catalog: &Catalog,
    prefix: &str,
) -> String {
    let blocks: Vec<String> = descriptions
        .iter()
        .map(|project| {
            let markup = render_project(project, catalog.get(&project.name), prefix);
            format!(
                "\t<!-- {} Project -->\n\t{}\n",
                capitalize(&project.name),
                markup.into_string()
            )
        })
        .collect();
    // Trailing tab keeps the end anchor indented.
    format!("{}\t", blocks.join("\n"))
}

/// Render the body of the `projectImages` object.
pub fn render_manifest(catalog: &Catalog, prefix: &str) -> String {
    catalog
        .projects
        .iter()
        .map(|project| {
            let images = project
                .images
                .iter()
                .map(|image| js_string(&image_src(prefix, &image.filename)))
                .collect::<Vec<_>>()
                .join(",\n\t\t\t\t");
            format!(
                "\n\t\t\t{}: [\n\t\t\t\t{}\n\t\t\t]",
                js_string(&project.project),
                images
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Thumbnail-only edits
// ============================================================================

/// Project names of every lightbox click handler in `html`, in page order.
pub fn handler_projects(html: &str) -> Vec<String> {
    const OPEN: &str = "onclick=\"openLightbox('";
    let mut names: Vec<String> = Vec::new();
    let mut rest = html;
    while let Some(at) = rest.find(OPEN) {
        rest = &rest[at + OPEN.len()..];
        if let Some(end) = rest.find('\'') {
            let name = &rest[..end];
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Set (or add) an attribute on a single start tag.
fn set_attribute(tag: &str, name: &str, value: &str) -> String {
    let escaped = html! { (value) }.into_string();
    let needle = format!(" {name}=\"");
    if let Some(at) = tag.find(&needle) {
        let value_start = at + needle.len();
        if let Some(len) = tag[value_start..].find('"') {
            return format!(
                "{}{}{}",
                &tag[..value_start],
                escaped,
                &tag[value_start + len..]
            );
        }
    }
    let insert_at = tag.find(char::is_whitespace).unwrap_or(tag.len() - 1);
    format!(
        "{} {name}=\"{escaped}\"{}",
        &tag[..insert_at],
        &tag[insert_at..]
    )
}

/// Newline plus the indentation of the line `pos` sits on, or nothing when
/// `pos` is preceded by other content on its line.
fn line_break_indent(html: &str, pos: usize) -> String {
    let line_start = html[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let indent = &html[line_start..pos];
    if indent.chars().all(char::is_whitespace) {
        format!("\n{indent}")
    } else {
        String::new()
    }
}

/// Start of the line holding `pos` (its preceding newline included) when only
/// whitespace comes before `pos` on that line, else `pos`.
fn own_line_start(html: &str, pos: usize) -> usize {
    match html[..pos].rfind('\n') {
        Some(nl) if html[nl + 1..pos].chars().all(char::is_whitespace) => nl,
        _ => pos,
    }
}

/// Position of the `</div>` closing the element whose start tag contains
/// `from`, or the end of `html` when it is never closed.
fn element_end(html: &str, from: usize) -> usize {
    let Some(tag_end) = html[from..].find('>').map(|i| from + i + 1) else {
        return html.len();
    };
    let mut depth = 1usize;
    let mut pos = tag_end;
    loop {
        let open = html[pos..].find("<div").map(|i| pos + i);
        let close = html[pos..].find("</div>").map(|i| pos + i);
        match (open, close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos = o + "<div".len();
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return c;
                }
                pos = c + "</div>".len();
            }
            (_, None) => return html.len(),
        }
    }
}

/// Point a project's thumbnail at `src` and sync its count badge.
///
/// The badge is looked up anywhere inside the thumbnail element. It is
/// updated for `count > 1`, inserted after the `<img>` tag when missing, and
/// removed for a single image. Returns `None` when the page has no click
/// handler for the project.
pub fn update_thumbnail(html: &str, project: &str, src: &str, count: usize) -> Option<String> {
    let handler = format!("onclick=\"{}\"", lightbox_handler(project));
    let after_handler = html.find(&handler)? + handler.len();
    let block_end = element_end(html, after_handler);
    let img = after_handler + html[after_handler..block_end].find("<img")?;
    let img_end = img + html[img..].find('>')? + 1;
    let new_tag = set_attribute(&html[img..img_end], "src", src);
    let badge = format!("{BADGE_OPEN}{count}</div>");

    let existing = html[img_end..block_end].find(BADGE_OPEN).and_then(|at| {
        let start = img_end + at;
        let close = Cursor::new(html, start).seek("</div>")?;
        Some(start..close.pos() + "</div>".len())
    });

    let (edit, replacement) = match (existing, count > 1) {
        (Some(span), true) => (span, badge),
        (Some(span), false) => (own_line_start(html, span.start)..span.end, String::new()),
        (None, true) => (
            img_end..img_end,
            format!("{}{badge}", line_break_indent(html, img)),
        ),
        (None, false) => (img_end..img_end, String::new()),
    };

    Some(format!(
        "{}{}{}{}{}",
        &html[..img],
        new_tag,
        &html[img_end..edit.start],
        replacement,
        &html[edit.end..]
    ))
}

fn apply_thumbnails(
    region: &str,
    names: &[String],
    catalog: &Catalog,
    prefix: &str,
    missing: &mut Vec<String>,
) -> String {
    let mut current = region.to_string();
    for name in names {
        let Some(project) = catalog.get(name) else {
            continue;
        };
        let Some(first) = project.images.first() else {
            continue;
        };
        let src = image_src(prefix, &first.filename);
        match update_thumbnail(&current, name, &src, project.images.len()) {
            Some(updated) => current = updated,
            None => {
                tracing::warn!(project = %name, "no thumbnail for project in page; left unchanged");
                missing.push(name.clone());
            }
        }
    }
    current
}

// ============================================================================
// Update pipeline
// ============================================================================

fn region_specs(config: &GalleryConfig) -> [RegionSpec<'_>; 2] {
    [
        RegionSpec {
            name: PROJECTS_REGION,
            start: &config.anchors.projects_start,
            end: &config.anchors.projects_end,
        },
        RegionSpec {
            name: MANIFEST_REGION,
            start: &config.anchors.manifest_start,
            end: &config.anchors.manifest_end,
        },
    ]
}

fn read(path: &Path) -> Result<String, GalleryError> {
    fs::read_to_string(path).map_err(|source| GalleryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_descriptions(path: &Path) -> Result<Vec<ProjectDescription>, GalleryError> {
    describe::load_descriptions(path).map_err(|source| GalleryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Descriptions and images, without touching the page.
pub fn plan(config: &GalleryConfig, root: &Path) -> Result<GalleryPlan, GalleryError> {
    let projects = read_descriptions(&config::resolve_path(root, &config.description_file))?;
    let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    let catalog = scan::scan(
        &config::resolve_path(root, &config.images_dir),
        &names,
        config,
    )?;
    Ok(GalleryPlan { projects, catalog })
}

/// Update the gallery page in place.
pub fn update_gallery(
    config: &GalleryConfig,
    root: &Path,
    options: GalleryOptions,
) -> Result<GalleryReport, GalleryError> {
    let html_path = config::resolve_path(root, &config.html_file);
    let description_path = config::resolve_path(root, &config.description_file);
    let images_dir = config::resolve_path(root, &config.images_dir);
    let strict = options.strict || config.strict_anchors;
    let prefix = config.image_url_prefix.as_str();

    let html = read(&html_path)?;

    let descriptions = if options.thumbs_only && !description_path.exists() {
        tracing::debug!(
            path = %description_path.display(),
            "no description file; taking projects from the page"
        );
        None
    } else {
        Some(read_descriptions(&description_path)?)
    };
    let names: Vec<String> = match &descriptions {
        Some(projects) => projects.iter().map(|p| p.name.clone()).collect(),
        None => handler_projects(&html),
    };
    let catalog = scan::scan(&images_dir, &names, config)?;

    let mut doc = Document::parse(&html, &region_specs(config))?;
    let mut skipped_regions = Vec::new();
    for region in doc.missing() {
        if strict {
            return Err(GalleryError::MissingAnchor {
                region: region.clone(),
                path: html_path,
            });
        }
        tracing::warn!(
            region = %region,
            file = %html_path.display(),
            "anchor not found; region left unchanged"
        );
        skipped_regions.push(region.clone());
    }

    let mut missing_thumbnails = Vec::new();
    if let Some(current) = doc.region(PROJECTS_REGION).map(str::to_string) {
        let projects_html = match &descriptions {
            Some(projects) if !options.thumbs_only => {
                render_projects_region(projects, &catalog, prefix)
            }
            _ => apply_thumbnails(&current, &names, &catalog, prefix, &mut missing_thumbnails),
        };
        doc.replace(PROJECTS_REGION, projects_html)?;
    }
    if doc.has_region(MANIFEST_REGION) {
        doc.replace(MANIFEST_REGION, render_manifest(&catalog, prefix))?;
    }

    let output = doc.render();
    let changed = output != html;
    if changed {
        fs::write(&html_path, &output).map_err(|source| GalleryError::Write {
            path: html_path.clone(),
            source,
        })?;
    } else {
        tracing::debug!(file = %html_path.display(), "gallery page already up to date");
    }

    let counts = names
        .iter()
        .map(|name| (name.clone(), catalog.image_count(name)))
        .collect();

    Ok(GalleryReport {
        html_file: html_path,
        counts,
        skipped_regions,
        missing_thumbnails,
        changed,
    })
}
