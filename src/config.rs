//! Tool configuration.
//!
//! Every path and anchor the tools touch comes from `sitesmith.toml`. Stock
//! defaults match the layout of the site the tools were written for; a user
//! file overrides only the keys it names.
//!
//! ## Config File Location
//!
//! By default the file is looked up in the `--root` directory. All relative
//! paths inside it resolve against that same root:
//!
//! ```text
//! site/                        # --root
//! ├── sitesmith.toml           # Optional
//! ├── aiprojs.html             # gallery.html_file
//! ├── projdesc.md              # gallery.description_file
//! ├── images/                  # gallery.images_dir
//! ├── wroteindex.html          # post.index
//! ├── readindex.html           # reading.index
//! ├── readingprogress.md       # reading.progress_file
//! └── ../index.html            # post.main_index, reading.main_index
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! [gallery]
//! html_file = "projects/ai/aiprojs.html"
//!
//! [[gallery.continuations]]
//! project = "ulysquot"
//! marker = "C"
//! ```
//!
//! Arrays replace the stock value wholesale. Unknown keys are rejected to
//! catch typos early.

use crate::naming::ContinuationRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "sitesmith.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration for all tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub gallery: GalleryConfig,
    pub post: PostConfig,
    pub reading: ReadingConfig,
}

impl SiteConfig {
    /// Validate values that would otherwise make a tool silently match nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gallery.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "gallery.extensions must not be empty".into(),
            ));
        }
        let anchors = &self.gallery.anchors;
        for (key, value) in [
            ("projects_start", &anchors.projects_start),
            ("projects_end", &anchors.projects_end),
            ("manifest_start", &anchors.manifest_start),
            ("manifest_end", &anchors.manifest_end),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "gallery.anchors.{key} must not be empty"
                )));
            }
        }
        for rule in &self.gallery.continuations {
            let starts_numeric = rule
                .marker
                .chars()
                .next()
                .is_none_or(|c| c.is_ascii_digit() || c == '_');
            if starts_numeric {
                return Err(ConfigError::Validation(format!(
                    "gallery.continuations marker for '{}' must be non-empty and not start with a digit or '_'",
                    rule.project
                )));
            }
        }
        if self.post.recent_anchor.is_empty() {
            return Err(ConfigError::Validation(
                "post.recent_anchor must not be empty".into(),
            ));
        }
        if self.reading.section_anchor.is_empty() {
            return Err(ConfigError::Validation(
                "reading.section_anchor must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Gallery updater settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory holding the project images.
    pub images_dir: String,
    /// Gallery page edited in place.
    pub html_file: String,
    /// Heading-delimited project descriptions.
    pub description_file: String,
    /// Prefix put in front of every image filename in the page (`images/`).
    pub image_url_prefix: String,
    /// Image extensions, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Fail instead of warning when a splice anchor is missing.
    pub strict_anchors: bool,
    pub anchors: AnchorConfig,
    /// Continuation series, one policy row each.
    pub continuations: Vec<ContinuationRule>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            images_dir: "images".to_string(),
            html_file: "aiprojs.html".to_string(),
            description_file: "projdesc.md".to_string(),
            image_url_prefix: "images/".to_string(),
            extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            strict_anchors: false,
            anchors: AnchorConfig::default(),
            continuations: vec![ContinuationRule {
                project: "ulysquot".to_string(),
                marker: "C".to_string(),
            }],
        }
    }
}

/// Literal markers delimiting the regions the gallery updater rewrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    pub projects_start: String,
    pub projects_end: String,
    pub manifest_start: String,
    pub manifest_end: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            projects_start: "<hr>\n\n".to_string(),
            projects_end: "<!-- Lightbox Modal -->".to_string(),
            manifest_start: "const projectImages = {".to_string(),
            manifest_end: "\n\t\t};".to_string(),
        }
    }
}

/// Post publisher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostConfig {
    /// Directory the generated post page is written to.
    pub output_dir: String,
    /// Per-section listing that gets one entry per post.
    pub index: String,
    /// Stylesheet linked from every post page.
    pub stylesheet: String,
    /// Whether to rewrite the "recently wrote" block of the main index.
    pub update_main_index: bool,
    pub main_index: String,
    /// Prefix for post links in the main index (the section's directory).
    pub main_index_href_prefix: String,
    /// Marker preceding the "recently wrote" block.
    pub recent_anchor: String,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            index: "wroteindex.html".to_string(),
            stylesheet: "../stylesheets/teostyle.css".to_string(),
            update_main_index: true,
            main_index: "../index.html".to_string(),
            main_index_href_prefix: "wrote/".to_string(),
            recent_anchor:
                r#"<a class="no-underline" href="wrote/wroteindex.html"><b>Recently wrote"#
                    .to_string(),
        }
    }
}

/// Reading tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingConfig {
    /// Plain-text list of books in progress.
    pub progress_file: String,
    /// Reading index page.
    pub index: String,
    /// Marker opening the in-progress section of the index.
    pub section_anchor: String,
    /// Whether to rewrite the "recently read" line of the main index.
    pub update_main_index: bool,
    pub main_index: String,
    /// Marker preceding the "recently read" line.
    pub recent_anchor: String,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            progress_file: "readingprogress.md".to_string(),
            index: "readindex.html".to_string(),
            section_anchor: "<i>in progress</i><br>".to_string(),
            update_main_index: true,
            main_index: "../index.html".to_string(),
            recent_anchor:
                r#"<a class="no-underline" href="read/readindex.html"><b>Recently read ></b></a><br>"#
                    .to_string(),
        }
    }
}

/// Resolve a configured path against the root directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(root: &Path, configured: &str) -> PathBuf {
    root.join(configured)
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value, `None` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for a run.
///
/// An explicitly given file must exist; the default `<root>/sitesmith.toml`
/// is optional and falls back to stock defaults.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&root.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `sitesmith.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitesmith configuration
# =======================
# All settings are optional. Values shown are the defaults.
# Relative paths resolve against the --root directory (default: current dir).
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Gallery updater (`sitesmith gallery`)
# ---------------------------------------------------------------------------
[gallery]
images_dir = "images"
html_file = "aiprojs.html"
description_file = "projdesc.md"

# Prefix for image paths written into the page and the image manifest.
image_url_prefix = "images/"

# Only files with these extensions (case-insensitive) are gallery images.
extensions = ["png", "jpg", "jpeg", "gif", "webp"]

# When an anchor below is missing the region is left alone and a warning is
# logged. Set to true to fail the run instead.
strict_anchors = false

# Region markers. The tool replaces the text strictly between each pair.
[gallery.anchors]
projects_start = "<hr>\n\n"
projects_end = "<!-- Lightbox Modal -->"
manifest_start = "const projectImages = {"
manifest_end = "\n\t\t};"

# Continuation series: `<project><marker>N` files sort after every
# `<project>N` / `<project>_N` file. Add one entry per series.
[[gallery.continuations]]
project = "ulysquot"
marker = "C"

# ---------------------------------------------------------------------------
# Post publisher (`sitesmith post FILE`)
# ---------------------------------------------------------------------------
[post]
output_dir = "."
index = "wroteindex.html"
stylesheet = "../stylesheets/teostyle.css"

# Replace the "Recently wrote" block of the main index with the new post.
update_main_index = true
main_index = "../index.html"
main_index_href_prefix = "wrote/"
recent_anchor = '<a class="no-underline" href="wrote/wroteindex.html"><b>Recently wrote'

# ---------------------------------------------------------------------------
# Reading tracker (`sitesmith reading`)
# ---------------------------------------------------------------------------
[reading]
progress_file = "readingprogress.md"
index = "readindex.html"
section_anchor = "<i>in progress</i><br>"
update_main_index = true
main_index = "../index.html"
recent_anchor = '<a class="no-underline" href="read/readindex.html"><b>Recently read ></b></a><br>'
"##
}
