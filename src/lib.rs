//! # Sitesmith
//!
//! Maintenance tools for a small hand-written static site. The pages are
//! plain HTML that a person edits by hand; sitesmith only rewrites the parts
//! it owns and leaves every other byte alone.
//!
//! # Tools
//!
//! ```text
//! gallery   images/ + projdesc.md  →  aiprojs.html    (project blocks, image manifest)
//! post      hello.md               →  hello.html      (+ wroteindex.html, index.html)
//! reading   readingprogress.md     →  readindex.html  (+ index.html)
//! ```
//!
//! Every tool re-derives its output from the current state of the
//! filesystem, so running it twice is the same as running it once.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Gallery page update: project blocks, thumbnails, `projectImages` manifest |
//! | [`scan`] | Lists the images directory and groups image files by project |
//! | [`naming`] | Image filename grammar and the sort key that orders a project's images |
//! | [`describe`] | Project description file parsing (`# name` + body) |
//! | [`post`] | Post parsing, page rendering with Maud, publishing |
//! | [`index`] | Dated link entries: insertion into listings, "Recently wrote" block |
//! | [`reading`] | Reading progress sync into the reading index |
//! | [`splice`] | Anchor-delimited region editing shared by all tools |
//! | [`config`] | `sitesmith.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for each tool's report |
//!
//! # Design Decisions
//!
//! ## Anchors, Not Templates
//!
//! Pages are never regenerated from a template. Each edit is located by a
//! literal anchor string (`<hr>\n\n`, `<!-- Lightbox Modal -->`, a `<p>` line)
//! and the document is split into opaque text and named regions, see
//! [`splice::Document`]. Anchors are configuration: a page whose markup
//! drifts only needs a config change.
//!
//! ## Compute, Then Write
//!
//! Each tool reads its inputs, computes every edit in memory, and writes only
//! when all edits succeeded. A missing anchor in a file being edited fails the
//! run with nothing written. The gallery is the one exception: a missing
//! region is skipped with a warning unless `--strict` is given.
//!
//! ## Ordering Is a Policy Table
//!
//! Image order within a project comes from the filename alone. The filename
//! pattern selects a tier (sequenced, continuation, unordered) and a number;
//! see [`naming::sort_key`]. Directory enumeration order never leaks into the
//! output.

pub mod config;
pub mod describe;
pub mod gallery;
pub mod index;
pub mod naming;
pub mod output;
pub mod post;
pub mod reading;
pub mod scan;
pub mod splice;

#[cfg(test)]
pub(crate) mod test_helpers;
