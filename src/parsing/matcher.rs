//! Line classification.
//!
//! The parser asks the matcher what a line *is* before deciding where it
//! belongs. Classification is keyword-driven and depends on the active
//! dialect, so the matcher is rebuilt when a `# language:` directive switches
//! dialects.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::Dialect;
use crate::syntax::{StepKeywordType, SyntaxKind};

static LANGUAGE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\s*language\s*:\s*([a-zA-Z0-9_\-]+)\s*$").expect("static pattern")
});

/// Doc-string delimiters, longest-match irrelevant since they share no prefix.
pub(crate) const DOC_STRING_DELIMITERS: [&str; 2] = ["\"\"\"", "```"];

/// Indentation characters. A byte-order mark counts so a BOM-prefixed first
/// line still classifies.
pub(crate) fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum HeaderKind {
    Feature,
    Rule,
    Background,
    Scenario,
    ScenarioOutline,
    Examples,
}

impl HeaderKind {
    pub(crate) fn keyword_kind(self) -> SyntaxKind {
        match self {
            HeaderKind::Feature => SyntaxKind::FeatureKeyword,
            HeaderKind::Rule => SyntaxKind::RuleKeyword,
            HeaderKind::Background => SyntaxKind::BackgroundKeyword,
            HeaderKind::Scenario => SyntaxKind::ScenarioKeyword,
            HeaderKind::ScenarioOutline => SyntaxKind::ScenarioOutlineKeyword,
            HeaderKind::Examples => SyntaxKind::ExamplesKeyword,
        }
    }

    /// Whether tags may precede this header.
    pub(crate) fn is_taggable(self) -> bool {
        !matches!(self, HeaderKind::Background)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineToken {
    Empty,
    Comment,
    Language(String),
    TagLine,
    Header {
        kind: HeaderKind,
        /// Byte length of the keyword, without the colon.
        keyword_len: usize,
        has_colon: bool,
    },
    Step {
        /// Byte length of the keyword with trailing space removed.
        keyword_len: usize,
        keyword_type: StepKeywordType,
    },
    DocStringSeparator {
        delimiter: &'static str,
    },
    TableRow,
    Other,
}

impl LineToken {
    pub(crate) fn is_trivia(&self) -> bool {
        matches!(self, LineToken::Empty | LineToken::Comment | LineToken::Language(_))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TokenMatcher {
    dialect: Arc<Dialect>,
    headers: Vec<(String, HeaderKind)>,
    steps: Vec<(String, StepKeywordType)>,
}

impl TokenMatcher {
    pub(crate) fn new(dialect: Arc<Dialect>) -> Self {
        let groups: [(&[String], HeaderKind); 6] = [
            (dialect.feature_keywords(), HeaderKind::Feature),
            (dialect.rule_keywords(), HeaderKind::Rule),
            (dialect.background_keywords(), HeaderKind::Background),
            (dialect.scenario_keywords(), HeaderKind::Scenario),
            (dialect.scenario_outline_keywords(), HeaderKind::ScenarioOutline),
            (dialect.examples_keywords(), HeaderKind::Examples),
        ];
        let mut headers: Vec<(String, HeaderKind)> = groups
            .iter()
            .flat_map(|(words, kind)| words.iter().map(move |w| (w.clone(), *kind)))
            .collect();
        headers.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let steps = dialect
            .step_keywords()
            .into_iter()
            .map(|k| (k.to_string(), dialect.step_keyword_type(k)))
            .collect();

        Self {
            dialect,
            headers,
            steps,
        }
    }

    pub(crate) fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    /// Classifies a line. `content` is the line with indentation and line
    /// break removed; trailing whitespace is still present.
    pub(crate) fn classify(&self, content: &str) -> LineToken {
        let trimmed = content.trim_end_matches(is_space);
        if trimmed.is_empty() {
            return LineToken::Empty;
        }
        if trimmed.starts_with('#') {
            if let Some(caps) = LANGUAGE_DIRECTIVE.captures(trimmed) {
                return LineToken::Language(caps[1].to_string());
            }
            return LineToken::Comment;
        }
        if trimmed.starts_with('@') {
            return LineToken::TagLine;
        }

        let header = self.match_header(trimmed);
        if let Some(token @ LineToken::Header { has_colon: true, .. }) = &header {
            return token.clone();
        }
        if let Some(step) = self.match_step(trimmed) {
            return step;
        }
        if let Some(delimiter) = DOC_STRING_DELIMITERS
            .into_iter()
            .find(|d| trimmed.starts_with(*d))
        {
            return LineToken::DocStringSeparator { delimiter };
        }
        if trimmed.starts_with('|') {
            return LineToken::TableRow;
        }
        header.unwrap_or(LineToken::Other)
    }

    fn match_header(&self, line: &str) -> Option<LineToken> {
        let mut fallback = None;
        for (keyword, kind) in &self.headers {
            let Some(rest) = line.strip_prefix(keyword.as_str()) else {
                continue;
            };
            if rest.starts_with(':') {
                return Some(LineToken::Header {
                    kind: *kind,
                    keyword_len: keyword.len(),
                    has_colon: true,
                });
            }
            if fallback.is_none() && rest.chars().next().map_or(true, is_space) {
                fallback = Some(LineToken::Header {
                    kind: *kind,
                    keyword_len: keyword.len(),
                    has_colon: false,
                });
            }
        }
        fallback
    }

    fn match_step(&self, line: &str) -> Option<LineToken> {
        self.steps.iter().find_map(|(keyword, keyword_type)| {
            let bare = keyword.trim_end();
            let hit = line.starts_with(keyword.as_str()) || (line == bare && !bare.is_empty());
            hit.then(|| LineToken::Step {
                keyword_len: bare.len(),
                keyword_type: *keyword_type,
            })
        })
    }
}
