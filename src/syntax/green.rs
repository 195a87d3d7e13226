//! Internal (green) syntax nodes.
//!
//! ## Purpose
//! Position-independent, immutable building blocks of a syntax tree. A green
//! node knows its kind, its width and its children; it never knows its parent
//! or its absolute offset, so the same node can appear in several trees.
//!
//! ## Invariants
//! - `width` of a node is the sum of its children's widths.
//! - `width` of a token is leading trivia + text + trailing trivia.
//! - `contains_diagnostics` is set when the node or any descendant carries a
//!   diagnostic.
//! - Nothing here is mutated after construction; "edits" build new nodes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use super::diagnostic::InternalDiagnostic;
use super::kind::SyntaxKind;
use crate::text::TextSpan;

#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct RawNode(Arc<RawNodeData>);

#[derive(Clone, PartialEq, Eq, Hash)]
struct RawNodeData {
    kind: SyntaxKind,
    width: usize,
    contains_diagnostics: bool,
    is_missing: bool,
    diagnostics: Arc<[InternalDiagnostic]>,
    body: RawBody,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum RawBody {
    /// Structured nodes and lists. Absent optional children are `None`.
    Node(Arc<[Option<RawNode>]>),
    Token {
        text: Box<str>,
        value: Option<Box<str>>,
        leading: Option<RawNode>,
        trailing: Option<RawNode>,
    },
    Trivia(Box<str>),
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl RawNode {
    fn build(kind: SyntaxKind, is_missing: bool, body: RawBody) -> Self {
        let (width, child_diagnostics) = match &body {
            RawBody::Node(slots) => slots.iter().flatten().fold((0, false), |(w, d), c| {
                (w + c.width(), d || c.contains_diagnostics())
            }),
            RawBody::Token {
                text,
                leading,
                trailing,
                ..
            } => {
                let trivia = [leading, trailing];
                let width = text.len() + trivia.iter().copied().flatten().map(RawNode::width).sum::<usize>();
                let diags = trivia.iter().copied().flatten().any(RawNode::contains_diagnostics);
                (width, diags)
            }
            RawBody::Trivia(text) => (text.len(), false),
        };
        RawNode(Arc::new(RawNodeData {
            kind,
            width,
            contains_diagnostics: child_diagnostics,
            is_missing,
            diagnostics: Arc::from(Vec::new()),
            body,
        }))
    }

    pub(crate) fn trivia(kind: SyntaxKind, text: &str) -> Self {
        debug_assert!(kind.is_trivia());
        Self::build(kind, false, RawBody::Trivia(text.into()))
    }

    pub(crate) fn token(
        kind: SyntaxKind,
        text: &str,
        leading: Option<RawNode>,
        trailing: Option<RawNode>,
    ) -> Self {
        Self::token_with_value(kind, text, None, leading, trailing)
    }

    /// A token whose semantic value differs from its source text, such as an
    /// escaped table cell.
    pub(crate) fn token_with_value(
        kind: SyntaxKind,
        text: &str,
        value: Option<String>,
        leading: Option<RawNode>,
        trailing: Option<RawNode>,
    ) -> Self {
        debug_assert!(kind.is_token());
        Self::build(
            kind,
            false,
            RawBody::Token {
                text: text.into(),
                value: value.map(String::into_boxed_str),
                leading,
                trailing,
            },
        )
    }

    /// A zero-width token standing in for one the source omitted.
    pub(crate) fn missing_token(
        kind: SyntaxKind,
        leading: Option<RawNode>,
        trailing: Option<RawNode>,
    ) -> Self {
        Self::build(
            kind,
            true,
            RawBody::Token {
                text: "".into(),
                value: None,
                leading,
                trailing,
            },
        )
    }

    pub(crate) fn node(kind: SyntaxKind, slots: Vec<Option<RawNode>>) -> Self {
        debug_assert!(kind.is_node());
        Self::build(kind, false, RawBody::Node(slots.into()))
    }

    /// A `List` node, or `None` for an empty list.
    pub(crate) fn list(items: Vec<RawNode>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let slots: Vec<Option<RawNode>> = items.into_iter().map(Some).collect();
        Some(Self::build(SyntaxKind::List, false, RawBody::Node(slots.into())))
    }

    /// Returns a copy of this node carrying `diagnostics` in addition to any
    /// it already has.
    pub(crate) fn with_diagnostics(&self, diagnostics: Vec<InternalDiagnostic>) -> Self {
        if diagnostics.is_empty() {
            return self.clone();
        }
        let mut data = (*self.0).clone();
        let mut all: Vec<InternalDiagnostic> = data.diagnostics.iter().cloned().collect();
        all.extend(diagnostics);
        data.diagnostics = all.into();
        data.contains_diagnostics = true;
        RawNode(Arc::new(data))
    }

    pub(crate) fn with_diagnostic(&self, diagnostic: InternalDiagnostic) -> Self {
        self.with_diagnostics(vec![diagnostic])
    }

    /// Copy of a token with new trailing trivia.
    pub(crate) fn with_trailing(&self, trailing: Option<RawNode>) -> Self {
        match &self.0.body {
            RawBody::Token {
                text,
                value,
                leading,
                ..
            } => {
                let body = RawBody::Token {
                    text: text.clone(),
                    value: value.clone(),
                    leading: leading.clone(),
                    trailing,
                };
                let rebuilt = Self::build(self.kind(), self.is_missing(), body);
                rebuilt.with_diagnostics(self.diagnostics().to_vec())
            }
            _ => self.clone(),
        }
    }
}

// ============================================================================
// ACCESSORS
// ============================================================================

impl RawNode {
    pub(crate) fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub(crate) fn width(&self) -> usize {
        self.0.width
    }

    pub(crate) fn contains_diagnostics(&self) -> bool {
        self.0.contains_diagnostics
    }

    pub(crate) fn is_missing(&self) -> bool {
        self.0.is_missing
    }

    pub(crate) fn diagnostics(&self) -> &[InternalDiagnostic] {
        &self.0.diagnostics
    }

    pub(crate) fn is_token(&self) -> bool {
        matches!(self.0.body, RawBody::Token { .. })
    }

    pub(crate) fn is_trivia(&self) -> bool {
        matches!(self.0.body, RawBody::Trivia(_))
    }

    pub(crate) fn ptr_eq(&self, other: &RawNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn slots(&self) -> &[Option<RawNode>] {
        match &self.0.body {
            RawBody::Node(slots) => &slots[..],
            _ => &[],
        }
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&RawNode> {
        self.slots().get(index).and_then(Option::as_ref)
    }

    /// Core text of a token or trivia; empty for nodes.
    pub(crate) fn text(&self) -> &str {
        match &self.0.body {
            RawBody::Token { text, .. } => &**text,
            RawBody::Trivia(text) => &**text,
            RawBody::Node(_) => "",
        }
    }

    /// Semantic value of a token: unescaped text where that differs.
    pub(crate) fn value(&self) -> &str {
        match &self.0.body {
            RawBody::Token {
                value: Some(value), ..
            } => &**value,
            _ => self.text(),
        }
    }

    pub(crate) fn leading(&self) -> Option<&RawNode> {
        match &self.0.body {
            RawBody::Token { leading, .. } => leading.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn trailing(&self) -> Option<&RawNode> {
        match &self.0.body {
            RawBody::Token { trailing, .. } => trailing.as_ref(),
            _ => None,
        }
    }

    /// Trivia items of a leading/trailing trivia slot, flattening the list.
    pub(crate) fn trivia_items(slot: Option<&RawNode>) -> Vec<RawNode> {
        match slot {
            None => Vec::new(),
            Some(n) if n.is_trivia() => vec![n.clone()],
            Some(n) => n.slots().iter().flatten().cloned().collect(),
        }
    }

    pub(crate) fn first_token(&self) -> Option<&RawNode> {
        if self.is_token() {
            return Some(self);
        }
        self.slots().iter().flatten().find_map(RawNode::first_token)
    }

    pub(crate) fn last_token(&self) -> Option<&RawNode> {
        if self.is_token() {
            return Some(self);
        }
        self.slots().iter().rev().flatten().find_map(RawNode::last_token)
    }

    /// Width of the leading trivia in front of this node's first token.
    pub(crate) fn leading_trivia_width(&self) -> usize {
        if self.is_trivia() {
            return 0;
        }
        self.first_token()
            .and_then(RawNode::leading)
            .map_or(0, RawNode::width)
    }

    pub(crate) fn trailing_trivia_width(&self) -> usize {
        if self.is_trivia() {
            return 0;
        }
        self.last_token()
            .and_then(RawNode::trailing)
            .map_or(0, RawNode::width)
    }

    /// Span without outer trivia, given the node's absolute position.
    pub(crate) fn span_at(&self, position: usize) -> TextSpan {
        let lead = self.leading_trivia_width();
        let trail = self.trailing_trivia_width();
        let start = position + lead;
        TextSpan::new(start, self.width().saturating_sub(lead + trail))
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match &self.0.body {
            RawBody::Node(slots) => slots.iter().flatten().for_each(|c| c.write_to(out)),
            RawBody::Token {
                text,
                leading,
                trailing,
                ..
            } => {
                if let Some(l) = leading {
                    l.write_to(out);
                }
                out.push_str(text);
                if let Some(t) = trailing {
                    t.write_to(out);
                }
            }
            RawBody::Trivia(text) => out.push_str(text),
        }
    }

    pub(crate) fn to_full_string(&self) -> String {
        let mut out = String::with_capacity(self.width());
        self.write_to(&mut out);
        out
    }
}

impl fmt::Debug for RawNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            RawBody::Node(slots) => f.debug_tuple(&format!("{:?}", self.kind())).field(slots).finish(),
            RawBody::Token { .. } if self.is_missing() => write!(f, "{:?}(missing)", self.kind()),
            RawBody::Token { text, .. } | RawBody::Trivia(text) => {
                write!(f, "{:?}({:?})", self.kind(), text)
            }
        }
    }
}

// ============================================================================
// DIAGNOSTIC WALK
// ============================================================================

enum WalkItem {
    Element(RawNode, usize),
    /// The core of a token, between its leading and trailing trivia.
    TokenCore(RawNode, usize),
}

/// Lazy, restartable enumeration of diagnostics below a node, in document
/// order. Subtrees without diagnostics are skipped without being visited.
pub(crate) struct DiagnosticWalk {
    stack: Vec<WalkItem>,
    pending: VecDeque<(InternalDiagnostic, TextSpan)>,
}

impl DiagnosticWalk {
    pub(crate) fn new(root: RawNode, position: usize) -> Self {
        Self {
            stack: vec![WalkItem::Element(root, position)],
            pending: VecDeque::new(),
        }
    }

    fn emit(&mut self, node: &RawNode, span: TextSpan) {
        self.pending
            .extend(node.diagnostics().iter().map(|d| (d.clone(), span)));
    }

    fn step(&mut self, item: WalkItem) {
        match item {
            WalkItem::TokenCore(token, position) => {
                let span = TextSpan::new(position, token.text().len());
                self.emit(&token, span);
            }
            WalkItem::Element(node, position) => {
                if !node.contains_diagnostics() {
                    return;
                }
                if node.is_trivia() {
                    self.emit(&node, TextSpan::new(position, node.width()));
                } else if node.is_token() {
                    let lead = node.leading().map_or(0, RawNode::width);
                    let core = position + lead;
                    if let Some(trailing) = node.trailing() {
                        let at = core + node.text().len();
                        self.stack.push(WalkItem::Element(trailing.clone(), at));
                    }
                    self.stack.push(WalkItem::TokenCore(node.clone(), core));
                    if let Some(leading) = node.leading() {
                        self.stack.push(WalkItem::Element(leading.clone(), position));
                    }
                } else {
                    self.emit(&node, node.span_at(position));
                    let mut offset = position;
                    let mut children = Vec::new();
                    for child in node.slots().iter().flatten() {
                        children.push(WalkItem::Element(child.clone(), offset));
                        offset += child.width();
                    }
                    self.stack.extend(children.into_iter().rev());
                }
            }
        }
    }
}

impl Iterator for DiagnosticWalk {
    type Item = (InternalDiagnostic, TextSpan);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Some(next);
            }
            let item = self.stack.pop()?;
            self.step(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::diagnostic::{MISSING_COLON, UNEXPECTED_LINE};

    fn ws(text: &str) -> RawNode {
        RawNode::trivia(SyntaxKind::WhitespaceTrivia, text)
    }

    fn d1() -> InternalDiagnostic {
        InternalDiagnostic::new(&UNEXPECTED_LINE, vec!["a".into(), "b".into()])
    }

    fn d2() -> InternalDiagnostic {
        InternalDiagnostic::new(&MISSING_COLON, vec!["Feature".into()])
    }

    fn assert_width_invariant(node: &RawNode) {
        if node.is_token() {
            let trivia: usize = [node.leading(), node.trailing()]
                .into_iter()
                .flatten()
                .map(RawNode::width)
                .sum();
            assert_eq!(node.width(), node.text().len() + trivia);
        } else if !node.is_trivia() {
            let sum: usize = node.slots().iter().flatten().map(RawNode::width).sum();
            assert_eq!(node.width(), sum, "{:?}", node.kind());
            node.slots().iter().flatten().for_each(assert_width_invariant);
        }
    }

    fn sample() -> RawNode {
        let keyword = RawNode::token(SyntaxKind::FeatureKeyword, "Feature", None, None)
            .with_diagnostic(d2());
        let colon = RawNode::token(
            SyntaxKind::ColonToken,
            ":",
            None,
            Some(ws(" ").with_diagnostic(d1())),
        )
        .with_diagnostic(d2());
        let name = RawNode::token(SyntaxKind::NameToken, "Guess the word", None, None);
        RawNode::node(
            SyntaxKind::Feature,
            vec![None, Some(keyword), Some(colon), Some(name), None, None, None],
        )
        .with_diagnostics(vec![d1(), d2()])
    }

    #[test]
    fn widths_add_up() {
        let feature = sample();
        assert_eq!(feature.width(), "Feature: Guess the word".len());
        assert_width_invariant(&feature);
    }

    #[test]
    fn diagnostics_come_out_in_document_order() {
        let found: Vec<_> = DiagnosticWalk::new(sample(), 0)
            .map(|(d, span)| (d.descriptor().id, span.start, span.length))
            .collect();
        assert_eq!(
            found,
            vec![
                ("GH1001", 0, 23),
                ("GH1002", 0, 23),
                ("GH1002", 0, 7),
                ("GH1002", 7, 1),
                ("GH1001", 8, 1),
            ]
        );
    }

    #[test]
    fn clean_subtrees_are_skipped() {
        let clean = RawNode::token(SyntaxKind::NameToken, "x", Some(ws(" ")), None);
        assert!(!clean.contains_diagnostics());
        assert_eq!(DiagnosticWalk::new(clean, 0).count(), 0);
    }

    #[test]
    fn missing_tokens_have_no_width() {
        let colon = RawNode::missing_token(SyntaxKind::ColonToken, None, Some(ws(" ")));
        assert!(colon.is_missing());
        assert_eq!(colon.width(), 1);
        assert_eq!(colon.text(), "");
    }

    #[test]
    fn with_trailing_keeps_diagnostics() {
        let tok = RawNode::token(SyntaxKind::NameToken, "x", None, None).with_diagnostic(d1());
        let rebuilt = tok.with_trailing(Some(ws("  ")));
        assert_eq!(rebuilt.width(), 3);
        assert_eq!(rebuilt.diagnostics().len(), 1);
        assert!(rebuilt.contains_diagnostics());
    }
}
