use serde::Serialize;

/// Kind tag shared by trivia, tokens and nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SyntaxKind {
    // Trivia
    WhitespaceTrivia,
    EndOfLineTrivia,
    CommentTrivia,
    LanguageDirectiveTrivia,
    SkippedTokensTrivia,

    // Keywords
    FeatureKeyword,
    RuleKeyword,
    BackgroundKeyword,
    ScenarioKeyword,
    ScenarioOutlineKeyword,
    ExamplesKeyword,
    ContextStepKeyword,
    ActionStepKeyword,
    OutcomeStepKeyword,
    ConjunctionStepKeyword,
    WildcardStepKeyword,

    // Punctuation and text
    ColonToken,
    VerticalBarToken,
    TagToken,
    NameToken,
    DescriptionTextToken,
    StepTextToken,
    TableLiteralToken,
    DocStringDelimiterToken,
    DocStringMediaTypeToken,
    DocStringContentToken,
    EndOfFileToken,

    // Nodes
    GherkinDocument,
    Feature,
    Rule,
    Background,
    Scenario,
    Examples,
    Step,
    Tags,
    Description,
    DataTable,
    TableRow,
    DocString,
    List,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WhitespaceTrivia
                | SyntaxKind::EndOfLineTrivia
                | SyntaxKind::CommentTrivia
                | SyntaxKind::LanguageDirectiveTrivia
                | SyntaxKind::SkippedTokensTrivia
        )
    }

    pub fn is_keyword(self) -> bool {
        (SyntaxKind::FeatureKeyword as u16..=SyntaxKind::WildcardStepKeyword as u16)
            .contains(&(self as u16))
    }

    pub fn is_step_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::ContextStepKeyword
                | SyntaxKind::ActionStepKeyword
                | SyntaxKind::OutcomeStepKeyword
                | SyntaxKind::ConjunctionStepKeyword
                | SyntaxKind::WildcardStepKeyword
        )
    }

    pub fn is_token(self) -> bool {
        (SyntaxKind::FeatureKeyword as u16..=SyntaxKind::EndOfFileToken as u16)
            .contains(&(self as u16))
    }

    pub fn is_node(self) -> bool {
        !self.is_trivia() && !self.is_token()
    }

    /// Step keyword token kind for a classified keyword.
    pub fn for_step_keyword(kind: StepKeywordType) -> SyntaxKind {
        match kind {
            StepKeywordType::Context => SyntaxKind::ContextStepKeyword,
            StepKeywordType::Action => SyntaxKind::ActionStepKeyword,
            StepKeywordType::Outcome => SyntaxKind::OutcomeStepKeyword,
            StepKeywordType::Conjunction => SyntaxKind::ConjunctionStepKeyword,
            StepKeywordType::Unknown => SyntaxKind::WildcardStepKeyword,
        }
    }
}

/// Gherkin's classification of a step keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepKeywordType {
    /// Given
    Context,
    /// When
    Action,
    /// Then
    Outcome,
    /// And, But
    Conjunction,
    /// `*` and spellings shared between Given/When/Then
    Unknown,
}

impl StepKeywordType {
    pub fn from_syntax_kind(kind: SyntaxKind) -> Option<Self> {
        match kind {
            SyntaxKind::ContextStepKeyword => Some(StepKeywordType::Context),
            SyntaxKind::ActionStepKeyword => Some(StepKeywordType::Action),
            SyntaxKind::OutcomeStepKeyword => Some(StepKeywordType::Outcome),
            SyntaxKind::ConjunctionStepKeyword => Some(StepKeywordType::Conjunction),
            SyntaxKind::WildcardStepKeyword => Some(StepKeywordType::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepKeywordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepKeywordType::Context => "Context",
            StepKeywordType::Action => "Action",
            StepKeywordType::Outcome => "Outcome",
            StepKeywordType::Conjunction => "Conjunction",
            StepKeywordType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}
