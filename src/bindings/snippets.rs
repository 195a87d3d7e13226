//! Step definition skeletons for undefined steps.
//!
//! The step text is turned into a Cucumber Expression: quoted text becomes
//! `{string}`, decimals `{float}`, integers `{int}`, and everything else is
//! kept literally with Cucumber Expression specials escaped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::binding::{BindingMethod, StepDefinitionDeclaration, StepDefinitionType};
use super::matcher::StepInstance;
use crate::{err_msg, GherkinError};

static ARGUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<string>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')|(?P<float>-?\d+\.\d+)|(?P<int>-?\d+)"#,
    )
    .expect("static pattern")
});

const SNIPPET_ASSEMBLY: &str = "Steps";
const SNIPPET_TYPE: &str = "StepDefinitions";

fn escape_expression(text: &str, out: &mut String) {
    for c in text.chars() {
        if matches!(c, '(' | ')' | '{' | '}' | '/' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// A suggested expression and the parameter types it introduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSnippet {
    pub keyword: StepDefinitionType,
    pub expression: String,
    /// .NET type names, in order: `Int32`, `Double`, `String`.
    pub parameter_types: Vec<&'static str>,
    /// Literal words of the step, for the method name.
    words: Vec<String>,
}

impl StepSnippet {
    pub fn for_step(step: &StepInstance) -> Self {
        let text = step.text.as_str();
        let mut expression = String::new();
        let mut parameter_types = Vec::new();
        let mut literal = String::new();
        let mut last = 0;
        for captures in ARGUMENT.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if !is_bounded(text, whole.start(), whole.end()) {
                continue;
            }
            let (placeholder, type_name) = if captures.name("string").is_some() {
                ("{string}", "String")
            } else if captures.name("float").is_some() {
                ("{float}", "Double")
            } else {
                ("{int}", "Int32")
            };
            let before = &text[last..whole.start()];
            escape_expression(before, &mut expression);
            literal.push_str(before);
            literal.push(' ');
            expression.push_str(placeholder);
            parameter_types.push(type_name);
            last = whole.end();
        }
        escape_expression(&text[last..], &mut expression);
        literal.push_str(&text[last..]);

        Self {
            keyword: StepDefinitionType::for_step(step.keyword_type),
            expression,
            parameter_types,
            words: literal
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// `GivenIHaveCukes` for `Given I have 5 cukes`.
    pub fn method_name(&self) -> String {
        let mut name = match self.keyword {
            StepDefinitionType::Any => String::from("Step"),
            keyword => keyword.as_str().to_string(),
        };
        for word in &self.words {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                name.extend(first.to_uppercase());
                name.push_str(chars.as_str());
            }
        }
        name
    }

    pub fn declaration(&self) -> StepDefinitionDeclaration {
        let method = self.parameter_types.iter().enumerate().fold(
            BindingMethod::new(SNIPPET_ASSEMBLY, SNIPPET_TYPE, self.method_name()),
            |method, (i, type_name)| method.with_parameter(format!("p{i}"), *type_name),
        );
        StepDefinitionDeclaration::new(self.keyword, Some(self.expression.as_str()), method)
    }

    /// The skeleton as a bindings-file entry.
    pub fn render(&self) -> Result<String, GherkinError> {
        serde_yaml::to_string(&vec![self.declaration()])
            .map_err(|e| err_msg!(Internal, "cannot render snippet: {}", e).with_source_error(e))
    }
}
