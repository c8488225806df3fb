//! Anchor-delimited editing of existing HTML files.
//!
//! Hand-maintained pages are never re-rendered as a whole. Instead a page is
//! cut into segments: opaque text, and named regions that sit strictly
//! between a start anchor and the first end anchor after it. Tools replace
//! region contents and serialise the segments back; every byte outside a
//! replaced region comes out exactly as it went in.
//!
//! ```text
//! ...<hr>\n\n│ projects region │<!-- Lightbox Modal -->...
//!   anchor   └── replaced ─────┘   anchor
//! ```
//!
//! [`Cursor`] covers the smaller case of matching a short fixed sequence of
//! literals and whitespace at a known position.

use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SpliceError {
    #[error("Region '{0}' not found in document")]
    MissingRegion(String),
    #[error("Regions '{0}' and '{1}' overlap")]
    Overlap(String, String),
}

/// Where to find one named region.
#[derive(Debug, Clone, Copy)]
pub struct RegionSpec<'a> {
    pub name: &'a str,
    pub start: &'a str,
    pub end: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Region { name: String, content: String },
}

/// A document split into opaque text and named, replaceable regions.
#[derive(Debug, Clone)]
pub struct Document {
    segments: Vec<Segment>,
    missing: Vec<String>,
}

/// Byte range of the text strictly between `start` and the first `end` after it.
pub fn find_region(text: &str, start: &str, end: &str) -> Option<Range<usize>> {
    let open = text.find(start)? + start.len();
    let close = open + text[open..].find(end)?;
    Some(open..close)
}

impl Document {
    /// Split `source` into segments using the first match of each spec.
    ///
    /// Specs whose anchors are absent are recorded in [`Document::missing`].
    pub fn parse(source: &str, specs: &[RegionSpec]) -> Result<Self, SpliceError> {
        let mut found: Vec<(Range<usize>, &str)> = Vec::new();
        let mut missing = Vec::new();
        for spec in specs {
            match find_region(source, spec.start, spec.end) {
                Some(range) => found.push((range, spec.name)),
                None => missing.push(spec.name.to_string()),
            }
        }
        found.sort_by_key(|(range, _)| range.start);

        for pair in found.windows(2) {
            let (first, first_name) = &pair[0];
            let (second, second_name) = &pair[1];
            if second.start < first.end {
                return Err(SpliceError::Overlap(
                    first_name.to_string(),
                    second_name.to_string(),
                ));
            }
        }

        let mut segments = Vec::with_capacity(found.len() * 2 + 1);
        let mut cursor = 0;
        for (range, name) in found {
            segments.push(Segment::Text(source[cursor..range.start].to_string()));
            segments.push(Segment::Region {
                name: name.to_string(),
                content: source[range.clone()].to_string(),
            });
            cursor = range.end;
        }
        segments.push(Segment::Text(source[cursor..].to_string()));

        Ok(Self { segments, missing })
    }

    /// Names of specs whose anchors were not found.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.region(name).is_some()
    }

    /// Current content of a region.
    pub fn region(&self, name: &str) -> Option<&str> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Region { name: n, content } if n == name => Some(content.as_str()),
            _ => None,
        })
    }

    /// Replace the content of a region.
    pub fn replace(&mut self, name: &str, new_content: String) -> Result<(), SpliceError> {
        for segment in &mut self.segments {
            if let Segment::Region { name: n, content } = segment
                && n == name
            {
                *content = new_content;
                return Ok(());
            }
        }
        Err(SpliceError::MissingRegion(name.to_string()))
    }

    /// Serialise the segments back into a single string.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Region { content, .. } => content.as_str(),
            })
            .collect()
    }
}

/// Position-tracking matcher for short literal sequences.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Skip any whitespace, including newlines.
    pub fn skip_ws(mut self) -> Self {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
        self
    }

    /// Consume `literal` if the cursor is at it.
    pub fn eat(mut self, literal: &str) -> Option<Self> {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            Some(self)
        } else {
            None
        }
    }

    /// Consume the first of `literals` the cursor is at.
    pub fn eat_any(self, literals: &[&str]) -> Option<Self> {
        literals.iter().find_map(|lit| self.eat(lit))
    }

    /// Move to the start of the next occurrence of `literal`.
    pub fn seek(mut self, literal: &str) -> Option<Self> {
        self.pos += self.rest().find(literal)?;
        Some(self)
    }
}
