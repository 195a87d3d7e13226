//! Splits a table row into bars, cells and trailing trivia.

use std::ops::Range;

/// One lexeme of a row, as a byte range within the row text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowLexeme {
    Bar(Range<usize>),
    Whitespace(Range<usize>),
    /// Cell text with surrounding whitespace removed. May be empty.
    Cell(Range<usize>),
    /// Text after the last bar that is not a comment.
    UnterminatedCell(Range<usize>),
    Comment(Range<usize>),
}

fn is_space(c: char) -> bool {
    c.is_whitespace()
}

/// Lexes `row`, which must start with `|`. The lexemes cover `row` exactly.
///
/// A backslash escapes the character after it, so `\|` never ends a cell.
/// After the last bar, text starting with `#` is a comment; anything else is
/// an unterminated cell.
pub(crate) fn lex_row(row: &str) -> Vec<RowLexeme> {
    let mut out = Vec::new();
    let bytes = row.as_bytes();
    let mut pos = 0;
    debug_assert!(row.starts_with('|'));
    while pos < row.len() {
        // A bar.
        out.push(RowLexeme::Bar(pos..pos + 1));
        pos += 1;

        // The cell that follows, up to the next unescaped bar.
        let mut end = None;
        let mut i = pos;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'|' => {
                    end = Some(i);
                    break;
                }
                _ => i += 1,
            }
        }
        let terminated = end.is_some();
        let cell_end = end.unwrap_or(row.len());
        let raw = &row[pos..cell_end];
        let lead = raw.len() - raw.trim_start_matches(is_space).len();
        let trimmed = raw.trim_matches(is_space);
        let content = pos + lead..pos + lead + trimmed.len();

        if lead > 0 {
            out.push(RowLexeme::Whitespace(pos..pos + lead));
        }
        if terminated {
            out.push(RowLexeme::Cell(content.clone()));
        } else if trimmed.starts_with('#') {
            out.push(RowLexeme::Comment(content.clone()));
        } else if !trimmed.is_empty() {
            out.push(RowLexeme::UnterminatedCell(content.clone()));
        }
        if content.end < cell_end && !trimmed.is_empty() {
            out.push(RowLexeme::Whitespace(content.end..cell_end));
        }
        pos = cell_end;
    }
    out
}
