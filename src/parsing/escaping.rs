//! Literal escaping rules.
//!
//! Table cells escape `|`, `\` and newline with a backslash. Doc strings only
//! escape their own delimiter. Any other backslash sequence is kept verbatim.

/// Escaping used inside data-table cells.
pub struct TableLiteralEscaping;

impl TableLiteralEscaping {
    /// Turns a cell value into source text.
    pub fn escape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '|' => out.push_str("\\|"),
                '\n' => out.push_str("\\n"),
                _ => out.push(c),
            }
        }
        out
    }

    /// Turns cell source text into its value.
    pub fn unescape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('|') => out.push('|'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        out
    }
}

/// Replaces an escaped doc-string delimiter (`\"\"\"` or `` \`\`\` ``) with
/// the delimiter itself.
pub(crate) fn unescape_doc_string_line(line: &str, delimiter: &str) -> String {
    let escaped: String = delimiter.chars().flat_map(|c| ['\\', c]).collect();
    line.replace(&escaped, delimiter)
}
