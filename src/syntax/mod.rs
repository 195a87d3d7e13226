//! Lossless Gherkin syntax trees.
//!
//! ## Purpose
//! A feature file parses into a tree that keeps every byte of the input:
//! whitespace, comments and line breaks hang off tokens as trivia, and
//! anything the grammar could not place is kept as skipped-tokens trivia with
//! a diagnostic attached.
//!
//! ## Design Principles
//! - Green nodes (`green`) are immutable, position-free and shared.
//! - Red nodes (`node`) are cheap facades that add position and parent, built
//!   on demand and thrown away.
//! - Diagnostics are data on green nodes, found by a walk that skips clean
//!   subtrees.

pub(crate) mod diagnostic;
pub(crate) mod green;
mod kind;
mod node;
mod tree;
mod typed;

pub use diagnostic::{
    Diagnostic, DiagnosticDescriptor, Severity, DANGLING_TAGS, INCONSISTENT_CELL_COUNT,
    MISSING_COLON, UNEXPECTED_LINE, UNKNOWN_LANGUAGE, UNTERMINATED_DOC_STRING,
    UNTERMINATED_TABLE_ROW,
};
pub use kind::{StepKeywordType, SyntaxKind};
pub use node::{SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia};
pub use tree::GherkinSyntaxTree;
pub use typed::{
    BackgroundSyntax, DataTableSyntax, DescriptionSyntax, DocStringSyntax, ExamplesSyntax,
    FeatureChild, FeatureSyntax, GherkinDocumentSyntax, RuleSyntax, ScenarioSyntax,
    StepArgument, StepSyntax, TableRowSyntax, TagsSyntax,
};

pub(crate) use typed::slots;
