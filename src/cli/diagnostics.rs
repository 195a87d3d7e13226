//! Presentation of syntax diagnostics through miette.
//!
//! Tree diagnostics are plain data. `SyntaxDiagnosticReport` pairs one with
//! the named source it points into so miette can draw the snippet.

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceCode};
use thiserror::Error;

use crate::diagnostics::{to_error_source, SourceArc};
use crate::syntax::{Diagnostic, GherkinSyntaxTree, Severity};
use crate::text::TextSpan;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct SyntaxDiagnosticReport {
    id: &'static str,
    title: &'static str,
    message: String,
    severity: Severity,
    span: TextSpan,
    source_code: SourceArc,
}

impl SyntaxDiagnosticReport {
    pub fn new(diagnostic: &Diagnostic, source: SourceArc) -> Self {
        Self {
            id: diagnostic.id(),
            title: diagnostic.descriptor().title,
            message: diagnostic.message().to_string(),
            severity: diagnostic.severity(),
            span: diagnostic.span(),
            source_code: source,
        }
    }

    /// One report per diagnostic of `tree`, in document order.
    pub fn for_tree(tree: &GherkinSyntaxTree) -> Vec<Self> {
        let source = to_error_source(tree.file_path(), tree.text().as_str());
        tree.diagnostics()
            .map(|d| Self::new(&d, SourceArc::clone(&source)))
            .collect()
    }
}

impl MietteDiagnostic for SyntaxDiagnosticReport {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.id))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Info => miette::Severity::Advice,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.source_code.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        // Missing tokens are zero-width; give miette something to point at,
        // without running past the end of the source.
        let len = self.source_code.inner().len();
        let start = self.span.start.min(len.saturating_sub(1));
        let length = self.span.length.max(1).min(len - start);
        let label = LabeledSpan::new(Some(self.title.to_string()), start, length);
        Some(Box::new(std::iter::once(label)))
    }
}
