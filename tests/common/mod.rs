//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use gherkin_bind::parsing::ParseOptions;
use gherkin_bind::syntax::{GherkinSyntaxTree, SyntaxElement, SyntaxNode};

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

/// Parses English text with default options.
pub fn parse(text: &str) -> GherkinSyntaxTree {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, options: &ParseOptions) -> GherkinSyntaxTree {
    GherkinSyntaxTree::parse_text(text, options, "test.feature").unwrap()
}

/// Diagnostic ids in the order the tree reports them.
pub fn diagnostic_ids(tree: &GherkinSyntaxTree) -> Vec<&'static str> {
    tree.diagnostics().map(|d| d.id()).collect()
}

/// Checks that every node's full span is exactly covered by its children.
pub fn assert_widths_add_up(node: &SyntaxNode) {
    let children = node.children();
    if children.is_empty() {
        return;
    }
    let total: usize = children.iter().map(|c| c.full_span().length).sum();
    assert_eq!(
        total,
        node.full_span().length,
        "children of {:?} do not cover it",
        node
    );
    for child in children {
        if let SyntaxElement::Node(child) = child {
            assert_widths_add_up(&child);
        }
    }
}
