//! Binding records: what discovery hands us, and what the registry keeps.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::cucumber_expression::CucumberExpression;
use super::parameter_types::{ArgumentValue, MatchedArgument};
use crate::config::load_structured;
use crate::syntax::StepKeywordType;
use crate::GherkinError;

// ============================================================================
// METHODS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// The user method a binding calls. Identity of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BindingMethod {
    pub assembly: String,
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<BindingParameter>,
    #[serde(default)]
    pub is_async: bool,
}

impl BindingMethod {
    pub fn new(
        assembly: impl Into<String>,
        declaring_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            assembly: assembly.into(),
            declaring_type: declaring_type.into(),
            name: name.into(),
            parameters: Vec::new(),
            is_async: false,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(BindingParameter {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }
}

/// `Assembly:Namespace.Type.Method(Int32, String)`.
impl fmt::Display for BindingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<&str> = self.parameters.iter().map(|p| p.type_name.as_str()).collect();
        write!(
            f,
            "{}:{}.{}({})",
            self.assembly,
            self.declaring_type,
            self.name,
            parameters.join(", ")
        )
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

/// Keyword a step definition is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepDefinitionType {
    #[serde(alias = "given")]
    Given,
    #[serde(alias = "when")]
    When,
    #[serde(alias = "then")]
    Then,
    /// Matches any step keyword.
    #[serde(alias = "any", alias = "StepDefinition")]
    Any,
}

impl StepDefinitionType {
    /// Whether a step with the given resolved keyword type may bind here.
    /// Steps whose type could not be resolved (`*`, a leading `And`) are
    /// compatible with every keyword.
    pub fn accepts(self, step: StepKeywordType) -> bool {
        match (self, step) {
            (StepDefinitionType::Any, _) => true,
            (_, StepKeywordType::Unknown | StepKeywordType::Conjunction) => true,
            (StepDefinitionType::Given, StepKeywordType::Context) => true,
            (StepDefinitionType::When, StepKeywordType::Action) => true,
            (StepDefinitionType::Then, StepKeywordType::Outcome) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepDefinitionType::Given => "Given",
            StepDefinitionType::When => "When",
            StepDefinitionType::Then => "Then",
            StepDefinitionType::Any => "StepDefinition",
        }
    }

    /// The declaration keyword that suits a step of this type.
    pub fn for_step(step: StepKeywordType) -> Self {
        match step {
            StepKeywordType::Context => StepDefinitionType::Given,
            StepKeywordType::Action => StepDefinitionType::When,
            StepKeywordType::Outcome => StepDefinitionType::Then,
            StepKeywordType::Conjunction | StepKeywordType::Unknown => StepDefinitionType::Any,
        }
    }
}

impl fmt::Display for StepDefinitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionType {
    CucumberExpression,
    RegularExpression,
    /// No text was given; the pattern comes from the method name.
    MethodName,
}

impl fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpressionType::CucumberExpression => "cucumber-expression",
            ExpressionType::RegularExpression => "regex",
            ExpressionType::MethodName => "method-name",
        })
    }
}

/// A step definition as reported by binding discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StepDefinitionDeclaration {
    pub keyword: StepDefinitionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub method: BindingMethod,
    /// Forces the syntax instead of classifying the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_type: Option<ExpressionType>,
}

impl StepDefinitionDeclaration {
    pub fn new(keyword: StepDefinitionType, text: Option<&str>, method: BindingMethod) -> Self {
        Self {
            keyword,
            text: text.map(str::to_string),
            method,
            expression_type: None,
        }
    }
}

// ============================================================================
// HOOKS AND TRANSFORMATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookType {
    BeforeTestRun,
    AfterTestRun,
    BeforeFeature,
    AfterFeature,
    BeforeScenario,
    AfterScenario,
    BeforeScenarioBlock,
    AfterScenarioBlock,
    BeforeStep,
    AfterStep,
}

fn default_hook_order() -> i32 {
    10_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HookBinding {
    pub hook_type: HookType,
    pub method: BindingMethod,
    /// Lower runs first.
    #[serde(default = "default_hook_order")]
    pub order: i32,
}

fn default_true() -> bool {
    true
}

/// A user conversion, usable as a `{name}` parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StepArgumentTransformation {
    pub name: String,
    #[serde(default)]
    pub regex: Option<String>,
    pub method: BindingMethod,
    #[serde(default = "default_true")]
    pub use_for_snippets: bool,
}

/// Everything discovery found, as read from a bindings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BindingSet {
    #[serde(default)]
    pub step_definitions: Vec<StepDefinitionDeclaration>,
    #[serde(default)]
    pub hooks: Vec<HookBinding>,
    #[serde(default)]
    pub transformations: Vec<StepArgumentTransformation>,
}

impl BindingSet {
    /// Reads a `.json`, `.yaml` or `.yml` bindings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GherkinError> {
        load_structured(path.as_ref())
    }
}

// ============================================================================
// COMPILED BINDINGS
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) enum StepPattern {
    Cucumber(CucumberExpression),
    Regex(Regex),
}

/// A validated, compiled step definition.
#[derive(Debug, Clone)]
pub struct StepDefinitionBinding {
    keyword: StepDefinitionType,
    source_text: String,
    expression_type: ExpressionType,
    method: BindingMethod,
    pattern: StepPattern,
}

impl StepDefinitionBinding {
    pub(crate) fn new(
        keyword: StepDefinitionType,
        source_text: String,
        expression_type: ExpressionType,
        method: BindingMethod,
        pattern: StepPattern,
    ) -> Self {
        Self {
            keyword,
            source_text,
            expression_type,
            method,
            pattern,
        }
    }

    pub fn keyword(&self) -> StepDefinitionType {
        self.keyword
    }

    /// The declared text, or the method name for method-name bindings.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn expression_type(&self) -> ExpressionType {
        self.expression_type
    }

    pub fn method(&self) -> &BindingMethod {
        &self.method
    }

    /// The anchored regex the step text is matched against.
    pub fn regex(&self) -> &Regex {
        match &self.pattern {
            StepPattern::Cucumber(expression) => expression.regex(),
            StepPattern::Regex(regex) => regex,
        }
    }

    /// Matches `text` against the pattern. Regex captures are returned as
    /// text; Cucumber Expression parameters are converted.
    pub fn match_text(&self, text: &str) -> Option<Vec<MatchedArgument>> {
        match &self.pattern {
            StepPattern::Cucumber(expression) => expression.match_text(text),
            StepPattern::Regex(regex) => {
                let captures = regex.captures(text)?;
                Some(
                    captures
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| MatchedArgument {
                            text: m.as_str().to_string(),
                            start: m.start(),
                            value: ArgumentValue::Text(m.as_str().to_string()),
                        })
                        .collect(),
                )
            }
        }
    }
}

impl fmt::Display for StepDefinitionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}({:?})] {}", self.keyword, self.source_text, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_text_lists_parameter_types() {
        let method = BindingMethod::new("Steps", "My.Steps", "GivenCukes")
            .with_parameter("count", "Int32")
            .with_parameter("name", "String");
        assert_eq!(method.to_string(), "Steps:My.Steps.GivenCukes(Int32, String)");
    }

    #[test]
    fn keyword_compatibility() {
        use StepKeywordType::*;
        assert!(StepDefinitionType::Given.accepts(Context));
        assert!(!StepDefinitionType::Given.accepts(Action));
        assert!(StepDefinitionType::Then.accepts(Unknown));
        assert!(StepDefinitionType::Any.accepts(Outcome));
    }

    #[test]
    fn declarations_deserialize_from_yaml() {
        let yaml = r#"
stepDefinitions:
  - keyword: Given
    text: "I have {int} cukes"
    method:
      assembly: Steps
      declaringType: CukeSteps
      name: GivenCukes
      parameters:
        - { name: count, type: Int32 }
hooks:
  - hookType: BeforeScenario
    method: { assembly: Steps, declaringType: Hooks, name: Reset }
"#;
        let set: BindingSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.step_definitions.len(), 1);
        assert_eq!(set.step_definitions[0].keyword, StepDefinitionType::Given);
        assert_eq!(set.hooks[0].order, 10_000);
    }
}
