//! Diagnostics carried by the syntax tree.
//!
//! Diagnostics are stored on internal nodes as a descriptor plus message
//! arguments. They become [`Diagnostic`] values, with a resolved location,
//! only when someone asks for them.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::text::{Location, TextSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Static description of one kind of problem. `message_format` uses `{0}`,
/// `{1}`, ... placeholders.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub message_format: &'static str,
    pub severity: Severity,
}

impl DiagnosticDescriptor {
    pub fn format_message(&self, arguments: &[String]) -> String {
        let mut message = self.message_format.to_string();
        for (i, arg) in arguments.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }
}

// === Catalogue ===

pub static UNEXPECTED_LINE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1001",
    title: "Unexpected line",
    message_format: "Unexpected '{0}'; expected {1}",
    severity: Severity::Error,
};

pub static MISSING_COLON: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1002",
    title: "Missing colon",
    message_format: "Expected ':' after '{0}'",
    severity: Severity::Error,
};

pub static UNTERMINATED_DOC_STRING: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1003",
    title: "Unterminated doc string",
    message_format: "Doc string opened with '{0}' is never closed",
    severity: Severity::Error,
};

pub static INCONSISTENT_CELL_COUNT: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1004",
    title: "Inconsistent cell count",
    message_format: "Row has {0} cells but the table's first row has {1}",
    severity: Severity::Error,
};

pub static UNTERMINATED_TABLE_ROW: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1005",
    title: "Unterminated table row",
    message_format: "Table row must end with '|'",
    severity: Severity::Error,
};

pub static UNKNOWN_LANGUAGE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1006",
    title: "Unknown language",
    message_format: "Language not supported: {0}",
    severity: Severity::Error,
};

pub static DANGLING_TAGS: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "GH1007",
    title: "Dangling tags",
    message_format: "Tags must be followed by {0}",
    severity: Severity::Error,
};

/// Descriptor + arguments as stored on an internal node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct InternalDiagnostic {
    descriptor: &'static DiagnosticDescriptor,
    arguments: Arc<[String]>,
}

impl InternalDiagnostic {
    pub(crate) fn new(descriptor: &'static DiagnosticDescriptor, arguments: Vec<String>) -> Self {
        Self {
            descriptor,
            arguments: arguments.into(),
        }
    }

    pub(crate) fn descriptor(&self) -> &'static DiagnosticDescriptor {
        self.descriptor
    }

    pub(crate) fn message(&self) -> String {
        self.descriptor.format_message(&self.arguments)
    }
}

/// A materialised diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(skip)]
    descriptor: &'static DiagnosticDescriptor,
    id: &'static str,
    severity: Severity,
    message: String,
    span: TextSpan,
    location: Option<Location>,
}

impl Diagnostic {
    pub(crate) fn materialize(
        internal: &InternalDiagnostic,
        span: TextSpan,
        location: Option<Location>,
    ) -> Self {
        let descriptor = internal.descriptor();
        Self {
            descriptor,
            id: descriptor.id,
            severity: descriptor.severity,
            message: internal.message(),
            span,
            location,
        }
    }

    pub fn descriptor(&self) -> &'static DiagnosticDescriptor {
        self.descriptor
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> TextSpan {
        self.span
    }

    /// `None` when the diagnostic sits on a node that is not part of a tree.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{} {}: {}", self.severity, self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_arguments() {
        let diag = InternalDiagnostic::new(
            &INCONSISTENT_CELL_COUNT,
            vec!["3".to_string(), "2".to_string()],
        );
        assert_eq!(diag.message(), "Row has 3 cells but the table's first row has 2");
    }
}
