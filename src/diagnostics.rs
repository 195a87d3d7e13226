//! Crate-level error type.
//!
//! # Overview
//!
//! Grammar problems in feature files are *not* errors: they are data attached
//! to the syntax tree (see [`crate::syntax::Diagnostic`]). `GherkinError` covers
//! what remains: unresolvable languages, unreadable files, bad configuration,
//! and invalid step definitions. All variants render through `miette`.
//!
//! # Error Construction Macros
//!
//! - `err_msg!(Language, "Language not supported: {}", tag)` for message-only errors.
//! - `err_ctx!(Config, "Unknown key", src, span)` when a source and span are known.
//! - `err_ctx!(Config, "Unknown key", src, span, help)` to attach help text.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::text::TextSpan;

pub type SourceArc = Arc<NamedSource<String>>;

/// Classification of `GherkinError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// No dialect for the requested language or any of its fallbacks
    Language,
    /// Reading input files
    Io,
    /// Configuration files and command-line settings
    Config,
    /// Step definitions, patterns and parameter types
    Binding,
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Language => "Language",
            ErrorType::Io => "Io",
            ErrorType::Config => "Config",
            ErrorType::Binding => "Binding",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<TextSpan>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: TextSpan) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum GherkinError {
    #[error("Language error: {message}")]
    Language {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Binding error: {message}")]
    Binding {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl GherkinError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            GherkinError::Language { message, ctx, .. }
            | GherkinError::Io { message, ctx, .. }
            | GherkinError::Config { message, ctx, .. }
            | GherkinError::Binding { message, ctx, .. }
            | GherkinError::Internal { message, ctx, .. } => (message, ctx),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            GherkinError::Language { .. } => ErrorType::Language,
            GherkinError::Io { .. } => ErrorType::Io,
            GherkinError::Config { .. } => ErrorType::Config,
            GherkinError::Binding { .. } => ErrorType::Binding,
            GherkinError::Internal { .. } => ErrorType::Internal,
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// Attaches an underlying error as the `source()` of this one.
    pub fn with_source_error<E>(mut self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let boxed: Option<Box<dyn std::error::Error + Send + Sync + 'static>> = Some(Box::new(err));
        match &mut self {
            GherkinError::Language { source, .. }
            | GherkinError::Io { source, .. }
            | GherkinError::Config { source, .. }
            | GherkinError::Binding { source, .. }
            | GherkinError::Internal { source, .. } => *source = boxed,
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let help = Some(help.into());
        match &mut self {
            GherkinError::Language { ctx, .. }
            | GherkinError::Io { ctx, .. }
            | GherkinError::Config { ctx, .. }
            | GherkinError::Binding { ctx, .. }
            | GherkinError::Internal { ctx, .. } => ctx.help = help,
        }
        self
    }
}

impl Diagnostic for GherkinError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::Language => "gherkin::language",
            ErrorType::Io => "gherkin::io",
            ErrorType::Config => "gherkin::config",
            ErrorType::Binding => "gherkin::binding",
            ErrorType::Internal => "gherkin::internal",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        let span = ctx.span?;
        // Zero-width spans still get a caret, kept inside the source.
        let (start, len) = match &ctx.source {
            Some(source) => {
                let end = source.inner().len();
                let start = span.start.min(end.saturating_sub(1));
                (start, span.length.max(1).min(end - start))
            }
            None => (span.start, span.length.max(1)),
        };
        let label = LabeledSpan::new(Some(message.to_string()), start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

pub fn to_error_source(name: impl AsRef<str>, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(name.as_ref(), source.as_ref().to_string()))
}

/// Constructs a `GherkinError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::GherkinError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::GherkinError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a `GherkinError` variant carrying a source and span, and
/// optionally help text.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::GherkinError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            )
            .with_help(format!("{}", $help)),
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::GherkinError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

impl From<std::io::Error> for GherkinError {
    fn from(err: std::io::Error) -> Self {
        err_msg!(Io, err.to_string()).with_source_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_matches_variant() {
        let err = err_msg!(Language, "Language not supported: {}", "xx");
        assert_eq!(err.error_type(), ErrorType::Language);
        assert_eq!(err.to_string(), "Language error: Language not supported: xx");
    }

    #[test]
    fn attached_errors_are_the_source() {
        use std::error::Error as _;
        let plain = err_msg!(Config, "no cause");
        assert!(plain.source().is_none());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = err_msg!(Io, "cannot read x").with_source_error(io);
        assert_eq!(err.source().map(|e| e.to_string()), Some("gone".to_string()));
    }

    #[test]
    fn context_errors_label_their_span() {
        let src = to_error_source("cfg.json", "{ \"x\": 1 }");
        let err = err_ctx!(Config, "unknown field", &src, TextSpan::new(2, 3), "remove it");
        let labels: Vec<_> = err.labels().map(|l| l.collect()).unwrap_or_default();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 2);
        assert_eq!(err.help().map(|h| h.to_string()), Some("remove it".to_string()));
    }
}
