//! The public syntax tree.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::diagnostic::{Diagnostic, Severity};
use super::green::RawNode;
use super::node::{SyntaxNode, SyntaxToken, SyntaxTrivia};
use super::typed::GherkinDocumentSyntax;
use crate::parsing::{self, ParseOptions};
use crate::text::{Location, SourceText, TextSpan};
use crate::GherkinError;

/// Shared state behind a tree and all red nodes created from it. Holds only
/// green data, so red nodes can point here without forming cycles.
pub(crate) struct TreeData {
    root: RawNode,
    path: String,
    options: ParseOptions,
    text: OnceCell<Arc<SourceText>>,
}

impl TreeData {
    /// The source text, rebuilt from the green root when the tree was parsed
    /// from a plain string.
    pub(crate) fn source_text(&self) -> Arc<SourceText> {
        Arc::clone(
            self.text
                .get_or_init(|| Arc::new(SourceText::new(self.root.to_full_string()))),
        )
    }

    pub(crate) fn location(&self, span: TextSpan) -> Location {
        Location {
            path: self.path.clone(),
            span,
            line_span: self.source_text().line_position_span(span),
        }
    }
}

/// A parsed feature file.
///
/// Always complete: malformed input yields a tree with diagnostics attached,
/// and `to_string()` reproduces the input byte for byte.
#[derive(Clone)]
pub struct GherkinSyntaxTree {
    data: Arc<TreeData>,
    root: SyntaxNode,
}

impl GherkinSyntaxTree {
    /// Parses `text`. Fails only when the culture in `options` names a
    /// language with no dialect and no fallback.
    pub fn parse_text(
        text: &str,
        options: &ParseOptions,
        path: impl Into<String>,
    ) -> Result<Self, GherkinError> {
        let path = path.into();
        let root = parsing::parse(text, options, &path)?;
        Ok(Self::from_raw(root, options.clone(), path, None))
    }

    /// Parses a pre-built `SourceText`, which the tree keeps for location
    /// lookups.
    pub fn parse_source(
        text: Arc<SourceText>,
        options: &ParseOptions,
        path: impl Into<String>,
    ) -> Result<Self, GherkinError> {
        let path = path.into();
        let root = parsing::parse(text.as_str(), options, &path)?;
        Ok(Self::from_raw(root, options.clone(), path, Some(text)))
    }

    pub(crate) fn from_raw(
        root: RawNode,
        options: ParseOptions,
        path: String,
        text: Option<Arc<SourceText>>,
    ) -> Self {
        let cell = OnceCell::new();
        if let Some(text) = text {
            let _ = cell.set(text);
        }
        let data = Arc::new(TreeData {
            root: root.clone(),
            path,
            options,
            text: cell,
        });
        let root = SyntaxNode::new_root(root, Some(Arc::clone(&data)));
        Self { data, root }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn document(&self) -> Option<GherkinDocumentSyntax> {
        GherkinDocumentSyntax::cast(self.root.clone())
    }

    pub fn options(&self) -> &ParseOptions {
        &self.data.options
    }

    pub fn file_path(&self) -> &str {
        &self.data.path
    }

    pub fn text(&self) -> Arc<SourceText> {
        self.data.source_text()
    }

    /// Every diagnostic in the tree, in document order.
    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.root.diagnostics()
    }

    pub fn node_diagnostics<'a>(&self, node: &'a SyntaxNode) -> impl Iterator<Item = Diagnostic> + 'a {
        node.diagnostics()
    }

    pub fn token_diagnostics<'a>(&self, token: &'a SyntaxToken) -> impl Iterator<Item = Diagnostic> + 'a {
        token.diagnostics()
    }

    pub fn trivia_diagnostics<'a>(&self, trivia: &'a SyntaxTrivia) -> impl Iterator<Item = Diagnostic> + 'a {
        trivia.diagnostics()
    }

    pub fn has_errors(&self) -> bool {
        self.root.contains_diagnostics()
            && self.diagnostics().any(|d| d.severity() == Severity::Error)
    }

    pub fn location(&self, span: TextSpan) -> Location {
        self.data.location(span)
    }
}

impl fmt::Display for GherkinSyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root.to_full_string())
    }
}

impl fmt::Debug for GherkinSyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GherkinSyntaxTree")
            .field("path", &self.data.path)
            .field("language", &self.data.options.culture)
            .field("root", &self.root)
            .finish()
    }
}
