//! Source text, spans and line/column mapping.
//!
//! ## Purpose
//! Everything in the syntax layer speaks in byte offsets into UTF-8 text.
//! This module owns the conversions from those offsets into the line/column
//! positions that editors and reports want.
//!
//! ## Invariants
//! - A `TextSpan` never extends past the text it was taken from.
//! - Line indices are built at most once per `SourceText`.
//! - Columns count characters, not bytes.

use std::fmt;

use once_cell::sync::OnceCell;
use serde::Serialize;
use sha2::{Digest, Sha256};

// ============================================================================
// SPANS AND POSITIONS
// ============================================================================

/// A half-open byte range `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn from_bounds(start: usize, end: usize) -> Self {
        debug_assert!(end >= start, "span end precedes start");
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True when `other` lies entirely within this span. Empty spans sitting
    /// on the end boundary count as contained.
    pub fn contains(&self, other: TextSpan) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

/// Zero-based line and character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct LinePosition {
    pub line: usize,
    pub character: usize,
}

impl LinePosition {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct LinePositionSpan {
    pub start: LinePosition,
    pub end: LinePosition,
}

/// A resolved location: file path, byte span and line/column span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub path: String,
    pub span: TextSpan,
    pub line_span: LinePositionSpan,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.line_span.start)
        } else {
            write!(f, "{}:{}", self.path, self.line_span.start)
        }
    }
}

// ============================================================================
// LINES
// ============================================================================

/// One physical line. `end` excludes the line break, `end_including_break`
/// includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLine {
    pub start: usize,
    pub end: usize,
    pub end_including_break: usize,
}

impl TextLine {
    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.start, self.end)
    }

    pub fn break_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.end, self.end_including_break)
    }

    pub fn has_break(&self) -> bool {
        self.end_including_break > self.end
    }
}

/// Splits `text` into lines. Recognised breaks are `\r\n`, `\n` and a lone
/// `\r`. A trailing break does not open an extra empty line.
pub fn split_lines(text: &str) -> Vec<TextLine> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(TextLine {
                    start,
                    end: i,
                    end_including_break: i + 1,
                });
                i += 1;
                start = i;
            }
            b'\r' => {
                let brk = if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                lines.push(TextLine {
                    start,
                    end: i,
                    end_including_break: i + brk,
                });
                i += brk;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(TextLine {
            start,
            end: bytes.len(),
            end_including_break: bytes.len(),
        });
    }
    lines
}

// ============================================================================
// SOURCE TEXT
// ============================================================================

/// Immutable document text with a lazily built line index.
#[derive(Debug)]
pub struct SourceText {
    text: String,
    line_starts: OnceCell<Vec<usize>>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            line_starts: OnceCell::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn slice(&self, span: TextSpan) -> Option<&str> {
        self.text.get(span.as_range())
    }

    pub fn lines(&self) -> Vec<TextLine> {
        split_lines(&self.text)
    }

    /// SHA-256 of the UTF-8 bytes.
    pub fn checksum(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.text.as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    fn line_starts(&self) -> &[usize] {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0];
            starts.extend(split_lines(&self.text).iter().map(|l| l.end_including_break));
            // A text ending in a break has a final empty line; one that doesn't
            // would otherwise get a duplicate start at `len`.
            if !self.text.is_empty() && !ends_with_break(&self.text) {
                starts.pop();
            }
            starts.dedup();
            starts
        })
    }

    pub fn line_count(&self) -> usize {
        self.line_starts().len()
    }

    /// Maps a byte offset to a line/character position. Offsets past the end
    /// clamp to the end; offsets inside a multi-byte character round down.
    pub fn position_of(&self, offset: usize) -> LinePosition {
        let offset = offset.min(self.text.len());
        let starts = self.line_starts();
        let line = match starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = starts[line];
        let mut end = offset;
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        let character = self.text[line_start..end].chars().count();
        LinePosition::new(line, character)
    }

    pub fn line_position_span(&self, span: TextSpan) -> LinePositionSpan {
        LinePositionSpan {
            start: self.position_of(span.start),
            end: self.position_of(span.end()),
        }
    }
}

impl From<String> for SourceText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SourceText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn ends_with_break(text: &str) -> bool {
    text.ends_with('\n') || text.ends_with('\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_mixed_line_breaks() {
        let lines = split_lines("a\r\nb\nc\rd");
        let spans: Vec<_> = lines.iter().map(|l| (l.start, l.end, l.end_including_break)).collect();
        assert_eq!(spans, vec![(0, 1, 3), (3, 4, 5), (5, 6, 7), (7, 8, 8)]);
    }

    #[test]
    fn positions_count_characters() {
        let text = SourceText::new("Fonctionnalité: é\nx");
        assert_eq!(text.position_of(0), LinePosition::new(0, 0));
        let x = text.as_str().find('x').unwrap_or_default();
        assert_eq!(text.position_of(x), LinePosition::new(1, 0));
        let colon = text.as_str().find(':').unwrap_or_default();
        assert_eq!(text.position_of(colon), LinePosition::new(0, 14));
    }

    #[test]
    fn trailing_break_opens_final_line() {
        let text = SourceText::new("a\n");
        assert_eq!(text.line_count(), 2);
        assert_eq!(text.position_of(2), LinePosition::new(1, 0));
    }

    #[test]
    fn checksum_is_stable() {
        assert_eq!(SourceText::new("x").checksum(), SourceText::new("x").checksum());
        assert_ne!(SourceText::new("x").checksum(), SourceText::new("y").checksum());
    }
}
