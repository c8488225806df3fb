//! Filename grammar for gallery images.
//!
//! An image belongs to a project when its filename starts with the project
//! name. Whatever follows that prefix decides where the image sits within the
//! project. Parsing happens in three steps: classify the remainder against a
//! policy table, extract the numeric key, and attach the tier.
//!
//! ## Tiers
//!
//! | Tier | Remainder after prefix | Key |
//! |------|------------------------|-----|
//! | [`Tier::Sequenced`] | `_N`, `_N.M` (`arss_1.1_title.png`) or `N` (`ulysquot00001.png`) | `N` or `N.M` as `f64` |
//! | [`Tier::Continuation`] | `<marker>N` for a configured [`ContinuationRule`] (`ulysquotC00001.png`) | `N` |
//! | [`Tier::Unordered`] | anything else (`arss-cover.png`) | `0` |
//!
//! Within a tier images order by key, then by filename. Keys are floats, so
//! `arss_1.10` and `arss_1.1` share a key and fall back to filename order.
//!
//! ## Continuation rules
//!
//! Some projects continue a numbered series under a second scheme that shares
//! the project prefix: `ulysquotC00001.png` follows `ulysquot00042.png`. A
//! rule names the project and the marker text; every rule adds one row to the
//! policy table, so a new series only needs a config entry.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ordering class of an image within its project. Declaration order is sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Sequenced,
    Continuation,
    Unordered,
}

/// A second numbered series within a project, e.g. `ulysquot` + `C`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinuationRule {
    /// Project name the rule applies to (exact, case-sensitive).
    pub project: String,
    /// Text between the project prefix and the series number.
    pub marker: String,
}

/// Composite sort key derived from an image filename.
#[derive(Debug, Clone, Serialize)]
pub struct SortKey {
    pub tier: Tier,
    pub sequence: f64,
    pub filename: String,
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| self.sequence.total_cmp(&other.sequence))
            .then_with(|| self.filename.cmp(&other.filename))
    }
}

/// Shape of the text following the project prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pattern<'a> {
    /// `_N` or `_N.M`
    Underscored,
    /// `N` directly after the prefix
    Bare,
    /// `<marker>N`
    Marked(&'a str),
}

impl Pattern<'_> {
    fn extract(self, rest: &str) -> Option<f64> {
        match self {
            Pattern::Underscored => leading_number(rest.strip_prefix('_')?, true),
            Pattern::Bare => leading_number(rest, false),
            Pattern::Marked(marker) => leading_number(rest.strip_prefix(marker)?, false),
        }
    }
}

/// Policy table for one project: first matching row wins.
fn policy<'a>(project: &str, rules: &'a [ContinuationRule]) -> Vec<(Pattern<'a>, Tier)> {
    let mut table = vec![
        (Pattern::Underscored, Tier::Sequenced),
        (Pattern::Bare, Tier::Sequenced),
    ];
    table.extend(
        rules
            .iter()
            .filter(|rule| rule.project == project)
            .map(|rule| (Pattern::Marked(rule.marker.as_str()), Tier::Continuation)),
    );
    table
}

/// Derive the sort key of `filename` within `project`.
///
/// - `("arss_1.1_title.png", "arss")` → Sequenced, 1.1
/// - `("ulysquot00003.png", "ulysquot")` → Sequenced, 3.0
/// - `("ulysquotC00001.png", "ulysquot")` with a `C` rule → Continuation, 1.0
/// - `("arss-cover.png", "arss")` → Unordered, 0.0
pub fn sort_key(filename: &str, project: &str, rules: &[ContinuationRule]) -> SortKey {
    let classified = filename.strip_prefix(project).and_then(|rest| {
        policy(project, rules)
            .into_iter()
            .find_map(|(pattern, tier)| pattern.extract(rest).map(|n| (tier, n)))
    });
    let (tier, sequence) = classified.unwrap_or((Tier::Unordered, 0.0));
    SortKey {
        tier,
        sequence,
        filename: filename.to_string(),
    }
}

/// Parse the run of ASCII digits at the start of `s`, optionally followed by
/// `.` and at least one more digit when `fraction` is set.
fn leading_number(s: &str, fraction: bool) -> Option<f64> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let mut end = digits;
    if fraction && s.as_bytes().get(digits) == Some(&b'.') {
        let decimals = s[digits + 1..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if decimals > 0 {
            end = digits + 1 + decimals;
        }
    }
    s[..end].parse().ok()
}

/// Whether `filename` carries one of the allowed extensions (case-insensitive).
pub fn has_image_extension(filename: &str, extensions: &[String]) -> bool {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}
