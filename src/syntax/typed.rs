//! Typed views over `SyntaxNode`s.
//!
//! Each wrapper checks the node kind once in `cast` and then exposes the
//! node's slots by name. Slot layouts are fixed per kind and shared with the
//! parser through the `slots` module.

use super::kind::{StepKeywordType, SyntaxKind};
use super::node::{SyntaxElement, SyntaxNode, SyntaxToken};

/// Slot indices per node kind.
pub(crate) mod slots {
    pub mod document {
        pub const FEATURE: usize = 0;
        pub const END_OF_FILE: usize = 1;
        pub const COUNT: usize = 2;
    }

    /// Shared by Feature and Rule.
    pub mod feature {
        pub const TAGS: usize = 0;
        pub const KEYWORD: usize = 1;
        pub const COLON: usize = 2;
        pub const NAME: usize = 3;
        pub const DESCRIPTION: usize = 4;
        pub const BACKGROUND: usize = 5;
        pub const CHILDREN: usize = 6;
        pub const COUNT: usize = 7;
    }

    pub mod background {
        pub const KEYWORD: usize = 0;
        pub const COLON: usize = 1;
        pub const NAME: usize = 2;
        pub const DESCRIPTION: usize = 3;
        pub const STEPS: usize = 4;
        pub const COUNT: usize = 5;
    }

    pub mod scenario {
        pub const TAGS: usize = 0;
        pub const KEYWORD: usize = 1;
        pub const COLON: usize = 2;
        pub const NAME: usize = 3;
        pub const DESCRIPTION: usize = 4;
        pub const STEPS: usize = 5;
        pub const EXAMPLES: usize = 6;
        pub const COUNT: usize = 7;
    }

    pub mod examples {
        pub const TAGS: usize = 0;
        pub const KEYWORD: usize = 1;
        pub const COLON: usize = 2;
        pub const NAME: usize = 3;
        pub const DESCRIPTION: usize = 4;
        pub const TABLE: usize = 5;
        pub const COUNT: usize = 6;
    }

    pub mod step {
        pub const KEYWORD: usize = 0;
        pub const TEXT: usize = 1;
        pub const ARGUMENT: usize = 2;
        pub const COUNT: usize = 3;
    }

    pub mod doc_string {
        pub const OPEN: usize = 0;
        pub const MEDIA_TYPE: usize = 1;
        pub const CONTENT: usize = 2;
        pub const CLOSE: usize = 3;
        pub const COUNT: usize = 4;
    }

    /// Tags, Description, DataTable and TableRow wrap a single list.
    pub const LIST: usize = 0;
}

macro_rules! syntax_node {
    ($(#[$meta:meta])* $name:ident => $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                matches!(node.kind(), $(SyntaxKind::$kind)|+).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn list_items(node: &SyntaxNode, slot: usize) -> Vec<SyntaxElement> {
    node.slot_node(slot).map(|l| l.children()).unwrap_or_default()
}

fn list_nodes<T>(node: &SyntaxNode, slot: usize, cast: fn(SyntaxNode) -> Option<T>) -> Vec<T> {
    list_items(node, slot)
        .into_iter()
        .filter_map(SyntaxElement::into_node)
        .filter_map(cast)
        .collect()
}

fn list_tokens(node: &SyntaxNode, slot: usize, kind: SyntaxKind) -> Vec<SyntaxToken> {
    list_items(node, slot)
        .into_iter()
        .filter_map(SyntaxElement::into_token)
        .filter(|t| t.kind() == kind)
        .collect()
}

fn token_value(node: &SyntaxNode, slot: usize) -> Option<String> {
    node.slot_token(slot).map(|t| t.value().to_string())
}

// ============================================================================
// DOCUMENT
// ============================================================================

syntax_node!(
    /// Root of every tree.
    GherkinDocumentSyntax => GherkinDocument
);

impl GherkinDocumentSyntax {
    pub fn feature(&self) -> Option<FeatureSyntax> {
        self.0.slot_node(slots::document::FEATURE).and_then(FeatureSyntax::cast)
    }

    pub fn end_of_file(&self) -> Option<SyntaxToken> {
        self.0.slot_token(slots::document::END_OF_FILE)
    }
}

// ============================================================================
// FEATURE AND RULE
// ============================================================================

syntax_node!(FeatureSyntax => Feature);
syntax_node!(RuleSyntax => Rule);

/// A scenario or a rule, in the order they appear under a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureChild {
    Scenario(ScenarioSyntax),
    Rule(RuleSyntax),
}

macro_rules! header_accessors {
    ($layout:ident) => {
        pub fn keyword(&self) -> Option<SyntaxToken> {
            self.0.slot_token(slots::$layout::KEYWORD)
        }

        pub fn colon(&self) -> Option<SyntaxToken> {
            self.0.slot_token(slots::$layout::COLON)
        }

        pub fn name(&self) -> Option<String> {
            token_value(&self.0, slots::$layout::NAME)
        }

        pub fn description(&self) -> Option<DescriptionSyntax> {
            self.0
                .slot_node(slots::$layout::DESCRIPTION)
                .and_then(DescriptionSyntax::cast)
        }
    };
}

macro_rules! tag_accessors {
    ($layout:ident) => {
        pub fn tags(&self) -> Option<TagsSyntax> {
            self.0.slot_node(slots::$layout::TAGS).and_then(TagsSyntax::cast)
        }

        /// Tag names including the `@`.
        pub fn tag_names(&self) -> Vec<String> {
            self.tags().map(|t| t.names()).unwrap_or_default()
        }
    };
}

impl FeatureSyntax {
    header_accessors!(feature);
    tag_accessors!(feature);

    pub fn background(&self) -> Option<BackgroundSyntax> {
        self.0
            .slot_node(slots::feature::BACKGROUND)
            .and_then(BackgroundSyntax::cast)
    }

    pub fn children(&self) -> Vec<FeatureChild> {
        list_items(&self.0, slots::feature::CHILDREN)
            .into_iter()
            .filter_map(SyntaxElement::into_node)
            .filter_map(|n| match n.kind() {
                SyntaxKind::Scenario => ScenarioSyntax::cast(n).map(FeatureChild::Scenario),
                SyntaxKind::Rule => RuleSyntax::cast(n).map(FeatureChild::Rule),
                _ => None,
            })
            .collect()
    }

    /// Scenarios directly under the feature, rules excluded.
    pub fn scenarios(&self) -> Vec<ScenarioSyntax> {
        list_nodes(&self.0, slots::feature::CHILDREN, ScenarioSyntax::cast)
    }

    pub fn rules(&self) -> Vec<RuleSyntax> {
        list_nodes(&self.0, slots::feature::CHILDREN, RuleSyntax::cast)
    }
}

impl RuleSyntax {
    header_accessors!(feature);
    tag_accessors!(feature);

    pub fn background(&self) -> Option<BackgroundSyntax> {
        self.0
            .slot_node(slots::feature::BACKGROUND)
            .and_then(BackgroundSyntax::cast)
    }

    pub fn scenarios(&self) -> Vec<ScenarioSyntax> {
        list_nodes(&self.0, slots::feature::CHILDREN, ScenarioSyntax::cast)
    }
}

// ============================================================================
// BACKGROUND, SCENARIO, EXAMPLES
// ============================================================================

syntax_node!(BackgroundSyntax => Background);

impl BackgroundSyntax {
    header_accessors!(background);

    pub fn steps(&self) -> Vec<StepSyntax> {
        list_nodes(&self.0, slots::background::STEPS, StepSyntax::cast)
    }
}

syntax_node!(
    /// A Scenario or a Scenario Outline.
    ScenarioSyntax => Scenario
);

impl ScenarioSyntax {
    header_accessors!(scenario);
    tag_accessors!(scenario);

    pub fn is_outline(&self) -> bool {
        self.keyword()
            .map_or(false, |k| k.kind() == SyntaxKind::ScenarioOutlineKeyword)
    }

    pub fn steps(&self) -> Vec<StepSyntax> {
        list_nodes(&self.0, slots::scenario::STEPS, StepSyntax::cast)
    }

    pub fn examples(&self) -> Vec<ExamplesSyntax> {
        list_nodes(&self.0, slots::scenario::EXAMPLES, ExamplesSyntax::cast)
    }
}

syntax_node!(ExamplesSyntax => Examples);

impl ExamplesSyntax {
    header_accessors!(examples);
    tag_accessors!(examples);

    pub fn table(&self) -> Option<DataTableSyntax> {
        self.0
            .slot_node(slots::examples::TABLE)
            .and_then(DataTableSyntax::cast)
    }
}

// ============================================================================
// STEPS AND ARGUMENTS
// ============================================================================

syntax_node!(StepSyntax => Step);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    DataTable(DataTableSyntax),
    DocString(DocStringSyntax),
}

impl StepSyntax {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        self.0.slot_token(slots::step::KEYWORD)
    }

    /// Keyword type as written; conjunctions are not resolved here.
    pub fn keyword_type(&self) -> StepKeywordType {
        self.keyword()
            .and_then(|k| StepKeywordType::from_syntax_kind(k.kind()))
            .unwrap_or(StepKeywordType::Unknown)
    }

    /// Keyword text including the space that separates it from the step text,
    /// as it appears in the dialect table (`"Given "`).
    pub fn keyword_text(&self) -> String {
        let Some(keyword) = self.keyword() else {
            return String::new();
        };
        let spaced = keyword
            .trailing_trivia()
            .first()
            .map_or(false, |t| t.kind() == SyntaxKind::WhitespaceTrivia);
        if spaced {
            format!("{} ", keyword.text())
        } else {
            keyword.text().to_string()
        }
    }

    pub fn text(&self) -> String {
        token_value(&self.0, slots::step::TEXT).unwrap_or_default()
    }

    pub fn argument(&self) -> Option<StepArgument> {
        let node = self.0.slot_node(slots::step::ARGUMENT)?;
        match node.kind() {
            SyntaxKind::DataTable => DataTableSyntax::cast(node).map(StepArgument::DataTable),
            SyntaxKind::DocString => DocStringSyntax::cast(node).map(StepArgument::DocString),
            _ => None,
        }
    }
}

syntax_node!(DataTableSyntax => DataTable);

impl DataTableSyntax {
    pub fn rows(&self) -> Vec<TableRowSyntax> {
        list_nodes(&self.0, slots::LIST, TableRowSyntax::cast)
    }

    /// Unescaped cell values, row by row.
    pub fn values(&self) -> Vec<Vec<String>> {
        self.rows().iter().map(TableRowSyntax::values).collect()
    }
}

syntax_node!(TableRowSyntax => TableRow);

impl TableRowSyntax {
    pub fn cells(&self) -> Vec<SyntaxToken> {
        list_tokens(&self.0, slots::LIST, SyntaxKind::TableLiteralToken)
    }

    pub fn values(&self) -> Vec<String> {
        self.cells().iter().map(|c| c.value().to_string()).collect()
    }
}

syntax_node!(DocStringSyntax => DocString);

impl DocStringSyntax {
    pub fn open_delimiter(&self) -> Option<SyntaxToken> {
        self.0.slot_token(slots::doc_string::OPEN)
    }

    pub fn close_delimiter(&self) -> Option<SyntaxToken> {
        self.0.slot_token(slots::doc_string::CLOSE)
    }

    pub fn media_type(&self) -> Option<String> {
        token_value(&self.0, slots::doc_string::MEDIA_TYPE)
    }

    /// Content lines joined with `\n`, indentation and escapes resolved.
    pub fn content(&self) -> String {
        list_tokens(
            &self.0,
            slots::doc_string::CONTENT,
            SyntaxKind::DocStringContentToken,
        )
        .iter()
        .map(SyntaxToken::value)
        .collect::<Vec<_>>()
        .join("\n")
    }
}

// ============================================================================
// TAGS AND DESCRIPTIONS
// ============================================================================

syntax_node!(TagsSyntax => Tags);

impl TagsSyntax {
    pub fn tags(&self) -> Vec<SyntaxToken> {
        list_tokens(&self.0, slots::LIST, SyntaxKind::TagToken)
    }

    pub fn names(&self) -> Vec<String> {
        self.tags().iter().map(|t| t.text().to_string()).collect()
    }
}

syntax_node!(DescriptionSyntax => Description);

impl DescriptionSyntax {
    pub fn lines(&self) -> Vec<SyntaxToken> {
        list_tokens(&self.0, slots::LIST, SyntaxKind::DescriptionTextToken)
    }

    pub fn text(&self) -> String {
        self.lines()
            .iter()
            .map(|t| t.text().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
