//! Red facades over green nodes.
//!
//! A red node pairs a green node with its absolute position and its parent.
//! Red nodes are created on demand while walking and dropped afterwards; the
//! parent link points upward only, so no reference cycles exist.

use std::fmt;
use std::sync::Arc;

use super::diagnostic::Diagnostic;
use super::green::{DiagnosticWalk, RawNode};
use super::kind::SyntaxKind;
use super::tree::TreeData;
use crate::text::TextSpan;

// ============================================================================
// NODES
// ============================================================================

#[derive(Clone)]
pub struct SyntaxNode(Arc<NodeData>);

struct NodeData {
    raw: RawNode,
    position: usize,
    parent: Option<SyntaxNode>,
    index: usize,
    tree: Option<Arc<TreeData>>,
}

impl SyntaxNode {
    pub(crate) fn new_root(raw: RawNode, tree: Option<Arc<TreeData>>) -> Self {
        SyntaxNode(Arc::new(NodeData {
            raw,
            position: 0,
            parent: None,
            index: 0,
            tree,
        }))
    }

    fn new_child(parent: &SyntaxNode, raw: RawNode, position: usize, index: usize) -> Self {
        SyntaxNode(Arc::new(NodeData {
            raw,
            position,
            parent: Some(parent.clone()),
            index,
            tree: parent.0.tree.clone(),
        }))
    }

    pub(crate) fn raw(&self) -> &RawNode {
        &self.0.raw
    }

    pub(crate) fn tree_data(&self) -> Option<&Arc<TreeData>> {
        self.0.tree.as_ref()
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.raw.kind()
    }

    pub fn position(&self) -> usize {
        self.0.position
    }

    /// Span including leading and trailing trivia.
    pub fn full_span(&self) -> TextSpan {
        TextSpan::new(self.0.position, self.0.raw.width())
    }

    /// Span excluding the first token's leading and the last token's trailing
    /// trivia.
    pub fn span(&self) -> TextSpan {
        self.0.raw.span_at(self.0.position)
    }

    pub fn parent(&self) -> Option<&SyntaxNode> {
        self.0.parent.as_ref()
    }

    /// Slot index of this node within its parent.
    pub fn index_in_parent(&self) -> usize {
        self.0.index
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> {
        std::iter::successors(self.parent().cloned(), |n| n.parent().cloned())
    }

    pub fn slot_count(&self) -> usize {
        self.0.raw.slots().len()
    }

    /// The element in slot `index`, or `None` for an absent optional child.
    pub fn slot(&self, index: usize) -> Option<SyntaxElement> {
        let slots = self.0.raw.slots();
        let raw = slots.get(index)?.as_ref()?;
        let offset: usize = slots[..index].iter().flatten().map(RawNode::width).sum();
        Some(self.element(raw.clone(), self.0.position + offset, index))
    }

    pub(crate) fn slot_node(&self, index: usize) -> Option<SyntaxNode> {
        self.slot(index).and_then(SyntaxElement::into_node)
    }

    pub(crate) fn slot_token(&self, index: usize) -> Option<SyntaxToken> {
        self.slot(index).and_then(SyntaxElement::into_token)
    }

    fn element(&self, raw: RawNode, position: usize, index: usize) -> SyntaxElement {
        if raw.is_token() {
            SyntaxElement::Token(SyntaxToken {
                parent: Some(self.clone()),
                raw,
                position,
                index,
            })
        } else {
            SyntaxElement::Node(SyntaxNode::new_child(self, raw, position, index))
        }
    }

    /// Present children in source order.
    pub fn children(&self) -> Vec<SyntaxElement> {
        let mut offset = self.0.position;
        let mut out = Vec::new();
        for (index, slot) in self.0.raw.slots().iter().enumerate() {
            if let Some(raw) = slot {
                out.push(self.element(raw.clone(), offset, index));
                offset += raw.width();
            }
        }
        out
    }

    pub fn child_nodes(&self) -> Vec<SyntaxNode> {
        self.children()
            .into_iter()
            .filter_map(SyntaxElement::into_node)
            .collect()
    }

    pub fn child_tokens(&self) -> Vec<SyntaxToken> {
        self.children()
            .into_iter()
            .filter_map(SyntaxElement::into_token)
            .collect()
    }

    /// All nodes below this one, depth first, this node excluded.
    pub fn descendants(&self) -> Vec<SyntaxNode> {
        let mut out = Vec::new();
        let mut stack: Vec<SyntaxNode> = self.child_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.child_nodes().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Every token below this node in source order, missing tokens included.
    pub fn descendant_tokens(&self) -> Vec<SyntaxToken> {
        let mut out = Vec::new();
        let mut stack: Vec<SyntaxElement> = self.children().into_iter().rev().collect();
        while let Some(element) = stack.pop() {
            match element {
                SyntaxElement::Token(token) => out.push(token),
                SyntaxElement::Node(node) => stack.extend(node.children().into_iter().rev()),
            }
        }
        out
    }

    pub fn first_token(&self) -> Option<SyntaxToken> {
        self.descendant_tokens().into_iter().next()
    }

    pub fn last_token(&self) -> Option<SyntaxToken> {
        self.descendant_tokens().into_iter().last()
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.0.raw.contains_diagnostics()
    }

    /// Diagnostics at or below this node, in document order. The walk is lazy;
    /// dropping the iterator abandons it.
    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        let tree = self.0.tree.clone();
        DiagnosticWalk::new(self.0.raw.clone(), self.0.position)
            .map(move |(diag, span)| materialize(&diag, span, tree.as_deref()))
    }

    /// Exact source text of this node, trivia included.
    pub fn to_full_string(&self) -> String {
        self.0.raw.to_full_string()
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.raw.ptr_eq(&other.0.raw) && self.0.position == other.0.position
    }
}

impl Eq for SyntaxNode {}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.full_span())
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_full_string())
    }
}

fn materialize(
    diag: &super::diagnostic::InternalDiagnostic,
    span: TextSpan,
    tree: Option<&TreeData>,
) -> Diagnostic {
    Diagnostic::materialize(diag, span, tree.map(|t| t.location(span)))
}

// ============================================================================
// ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            SyntaxElement::Node(n) => n.kind(),
            SyntaxElement::Token(t) => t.kind(),
        }
    }

    pub fn full_span(&self) -> TextSpan {
        match self {
            SyntaxElement::Node(n) => n.full_span(),
            SyntaxElement::Token(t) => t.full_span(),
        }
    }

    pub fn into_node(self) -> Option<SyntaxNode> {
        match self {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<SyntaxToken> {
        match self {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        }
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Clone)]
pub struct SyntaxToken {
    parent: Option<SyntaxNode>,
    raw: RawNode,
    position: usize,
    index: usize,
}

impl SyntaxToken {
    pub fn kind(&self) -> SyntaxKind {
        self.raw.kind()
    }

    pub fn parent(&self) -> Option<&SyntaxNode> {
        self.parent.as_ref()
    }

    pub fn index_in_parent(&self) -> usize {
        self.index
    }

    /// Source text of the token itself, without trivia.
    pub fn text(&self) -> &str {
        self.raw.text()
    }

    /// Semantic value: table cells unescaped, doc-string delimiters
    /// unescaped; otherwise identical to `text`.
    pub fn value(&self) -> &str {
        self.raw.value()
    }

    pub fn is_missing(&self) -> bool {
        self.raw.is_missing()
    }

    pub fn full_span(&self) -> TextSpan {
        TextSpan::new(self.position, self.raw.width())
    }

    pub fn span(&self) -> TextSpan {
        let lead = self.raw.leading().map_or(0, RawNode::width);
        TextSpan::new(self.position + lead, self.raw.text().len())
    }

    fn trivia_at(&self, slot: Option<&RawNode>, mut position: usize) -> Vec<SyntaxTrivia> {
        RawNode::trivia_items(slot)
            .into_iter()
            .map(|raw| {
                let at = position;
                position += raw.width();
                SyntaxTrivia {
                    token: self.clone(),
                    raw,
                    position: at,
                }
            })
            .collect()
    }

    pub fn leading_trivia(&self) -> Vec<SyntaxTrivia> {
        self.trivia_at(self.raw.leading(), self.position)
    }

    pub fn trailing_trivia(&self) -> Vec<SyntaxTrivia> {
        let at = self.span().end();
        self.trivia_at(self.raw.trailing(), at)
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.raw.contains_diagnostics()
    }

    /// Diagnostics on this token and its trivia, in document order.
    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        let tree = self.tree_data().cloned();
        DiagnosticWalk::new(self.raw.clone(), self.position)
            .map(move |(diag, span)| materialize(&diag, span, tree.as_deref()))
    }

    fn tree_data(&self) -> Option<&Arc<TreeData>> {
        self.parent.as_ref().and_then(SyntaxNode::tree_data)
    }

    pub fn to_full_string(&self) -> String {
        self.raw.to_full_string()
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        self.raw.ptr_eq(&other.raw) && self.position == other.position
    }
}

impl Eq for SyntaxToken {}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "{:?}@{} (missing)", self.kind(), self.span())
        } else {
            write!(f, "{:?}@{} {:?}", self.kind(), self.span(), self.text())
        }
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// ============================================================================
// TRIVIA
// ============================================================================

#[derive(Clone)]
pub struct SyntaxTrivia {
    token: SyntaxToken,
    raw: RawNode,
    position: usize,
}

impl SyntaxTrivia {
    pub fn kind(&self) -> SyntaxKind {
        self.raw.kind()
    }

    pub fn text(&self) -> &str {
        self.raw.text()
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.position, self.raw.width())
    }

    /// The token this trivia is attached to.
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.raw.contains_diagnostics()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        let tree = self.token.tree_data().cloned();
        DiagnosticWalk::new(self.raw.clone(), self.position)
            .map(move |(diag, span)| materialize(&diag, span, tree.as_deref()))
    }
}

impl PartialEq for SyntaxTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.raw.ptr_eq(&other.raw) && self.position == other.position
    }
}

impl Eq for SyntaxTrivia {}

impl fmt::Debug for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{} {:?}", self.kind(), self.span(), self.text())
    }
}
