//! Feature-text parsing.
//!
//! ## Purpose
//! Produces the green tree behind [`crate::syntax::GherkinSyntaxTree`]. The
//! parser never fails on content: malformed lines become diagnostics on the
//! tree. The only error is an options culture with no dialect.
//!
//! ## Modules
//! - `matcher`: what kind of line is this, given the active dialect.
//! - `table_lexer`: bars, cells and comments of a table row.
//! - `escaping`: cell and doc-string escape rules.
//! - `parser`: the grammar and token assembly.

mod escaping;
mod matcher;
mod parser;
mod table_lexer;

use serde::{Deserialize, Serialize};

use crate::dialect::DEFAULT_LANGUAGE;

pub use escaping::TableLiteralEscaping;
pub(crate) use parser::parse;

/// Parser settings. Passed explicitly; nothing is read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Language tag used until a `# language:` directive says otherwise.
    pub culture: String,
    /// Stop reporting after the first error. The rest of the input is kept
    /// as trivia on the end-of-file token.
    pub stop_at_first_error: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            culture: DEFAULT_LANGUAGE.to_string(),
            stop_at_first_error: false,
        }
    }
}

impl ParseOptions {
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    pub fn with_stop_at_first_error(mut self, stop: bool) -> Self {
        self.stop_at_first_error = stop;
        self
    }
}
