//! Cucumber Expressions.
//!
//! Supported syntax:
//! - `{name}`: a parameter of a registered type, `{}` for any text
//! - `(text)`: optional text
//! - `a/b/c`: alternative words, bounded by whitespace
//! - `\`: escapes the next character
//!
//! An expression compiles to an anchored regex. Each parameter becomes a
//! named group so user regexes with groups of their own do not shift the
//! argument positions.

use std::fmt;

use regex::Regex;
use thiserror::Error;

use super::parameter_types::{MatchedArgument, ParameterType, ParameterTypeRegistry};
use crate::GherkinError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("missing '}}' for the parameter starting at position {0}")]
    UnterminatedParameter(usize),
    #[error("missing ')' for the optional starting at position {0}")]
    UnterminatedOptional(usize),
    #[error("unexpected '{1}' at position {0}")]
    Unexpected(usize, char),
    #[error("an optional may not contain a parameter type (position {0})")]
    ParameterInOptional(usize),
    #[error("optionals may not be nested (position {0})")]
    NestedOptional(usize),
    #[error("an optional must contain some text (position {0})")]
    EmptyOptional(usize),
    #[error("an alternative may not be empty (position {0})")]
    EmptyAlternative(usize),
    #[error("an alternative may not contain a parameter type (position {0})")]
    ParameterInAlternative(usize),
    #[error("invalid parameter type name '{0}'")]
    InvalidParameterName(String),
    #[error("undefined parameter type '{0}'")]
    UndefinedParameterType(String),
    #[error("invalid regular expression: {0}")]
    Regex(String),
}

impl From<ExpressionError> for GherkinError {
    fn from(err: ExpressionError) -> Self {
        crate::err_msg!(Binding, err.to_string()).with_source_error(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Optional(String),
    Alternation(Vec<Vec<Node>>),
    Parameter(String),
}

fn push_text(nodes: &mut Vec<Node>, c: char) {
    match nodes.last_mut() {
        Some(Node::Text(text)) => text.push(c),
        _ => nodes.push(Node::Text(c.to_string())),
    }
}

const RESERVED_IN_NAME: &[char] = &['{', '(', ')', '\\', '/'];

struct ExpressionParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExpressionParser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<Vec<Node>, ExpressionError> {
        let mut nodes = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                push_text(&mut nodes, c);
                self.pos += 1;
                continue;
            }
            let start = self.pos;
            let mut alternatives = self.word()?;
            if alternatives.len() == 1 {
                for node in alternatives.remove(0) {
                    match node {
                        Node::Text(text) => text.chars().for_each(|c| push_text(&mut nodes, c)),
                        other => nodes.push(other),
                    }
                }
            } else {
                check_alternatives(&alternatives, start)?;
                nodes.push(Node::Alternation(alternatives));
            }
        }
        Ok(nodes)
    }

    /// A whitespace-bounded run, split on `/`.
    fn word(&mut self) -> Result<Vec<Vec<Node>>, ExpressionError> {
        let mut alternatives = vec![Vec::new()];
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            let current = alternatives.last_mut().ok_or(ExpressionError::EmptyAlternative(self.pos))?;
            match c {
                '\\' => {
                    let escaped = self.escaped();
                    push_text(current, escaped);
                }
                '/' => {
                    self.pos += 1;
                    alternatives.push(Vec::new());
                }
                '(' => {
                    let optional = self.optional()?;
                    current.push(optional);
                }
                '{' => {
                    let parameter = self.parameter()?;
                    current.push(parameter);
                }
                ')' | '}' => return Err(ExpressionError::Unexpected(self.pos, c)),
                _ => {
                    push_text(current, c);
                    self.pos += 1;
                }
            }
        }
        Ok(alternatives)
    }

    /// Consumes `\x` and returns `x`. A trailing backslash stands for itself.
    fn escaped(&mut self) -> char {
        self.pos += 1;
        match self.peek() {
            Some(c) => {
                self.pos += 1;
                c
            }
            None => '\\',
        }
    }

    fn optional(&mut self) -> Result<Node, ExpressionError> {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(ExpressionError::UnterminatedOptional(start)),
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('(') => return Err(ExpressionError::NestedOptional(self.pos)),
                Some('{') => return Err(ExpressionError::ParameterInOptional(self.pos)),
                Some('\\') => {
                    let escaped = self.escaped();
                    text.push(escaped);
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        if text.is_empty() {
            return Err(ExpressionError::EmptyOptional(start));
        }
        Ok(Node::Optional(text))
    }

    fn parameter(&mut self) -> Result<Node, ExpressionError> {
        let start = self.pos;
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(ExpressionError::UnterminatedParameter(start)),
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }
        if name.contains(RESERVED_IN_NAME) || name.chars().any(char::is_whitespace) {
            return Err(ExpressionError::InvalidParameterName(name));
        }
        Ok(Node::Parameter(name))
    }
}

fn check_alternatives(alternatives: &[Vec<Node>], start: usize) -> Result<(), ExpressionError> {
    for alternative in alternatives {
        if alternative.iter().any(|n| matches!(n, Node::Parameter(_))) {
            return Err(ExpressionError::ParameterInAlternative(start));
        }
        if !alternative.iter().any(|n| matches!(n, Node::Text(_))) {
            return Err(ExpressionError::EmptyAlternative(start));
        }
    }
    Ok(())
}

/// A compiled Cucumber Expression.
#[derive(Debug, Clone)]
pub struct CucumberExpression {
    source: String,
    regex: Regex,
    parameters: Vec<ParameterType>,
}

impl CucumberExpression {
    pub fn new(source: &str, registry: &ParameterTypeRegistry) -> Result<Self, ExpressionError> {
        let nodes = ExpressionParser::new(source).parse()?;
        let mut parameters = Vec::new();
        let mut pattern = String::from("^");
        for node in &nodes {
            write_node(node, registry, &mut parameters, &mut pattern)?;
        }
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|e| ExpressionError::Regex(e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            regex,
            parameters,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn parameter_types(&self) -> &[ParameterType] {
        &self.parameters
    }

    /// Matches the whole of `text`, converting each parameter.
    pub fn match_text(&self, text: &str) -> Option<Vec<MatchedArgument>> {
        let captures = self.regex.captures(text)?;
        let arguments = self
            .parameters
            .iter()
            .enumerate()
            .filter_map(|(index, parameter)| {
                let m = captures.name(&group_name(index))?;
                Some(MatchedArgument {
                    text: m.as_str().to_string(),
                    start: m.start(),
                    value: parameter.convert(m.as_str()),
                })
            })
            .collect();
        Some(arguments)
    }
}

impl fmt::Display for CucumberExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn group_name(index: usize) -> String {
    format!("p{index}")
}

fn write_node(
    node: &Node,
    registry: &ParameterTypeRegistry,
    parameters: &mut Vec<ParameterType>,
    out: &mut String,
) -> Result<(), ExpressionError> {
    match node {
        Node::Text(text) => out.push_str(&regex::escape(text)),
        Node::Optional(text) => {
            out.push_str("(?:");
            out.push_str(&regex::escape(text));
            out.push_str(")?");
        }
        Node::Alternation(alternatives) => {
            out.push_str("(?:");
            for (i, alternative) in alternatives.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                for inner in alternative {
                    write_node(inner, registry, parameters, out)?;
                }
            }
            out.push(')');
        }
        Node::Parameter(name) => {
            let parameter = registry
                .lookup(name)
                .ok_or_else(|| ExpressionError::UndefinedParameterType(name.clone()))?;
            out.push_str(&format!("(?P<{}>{})", group_name(parameters.len()), parameter.pattern()));
            parameters.push(parameter.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::parameter_types::ArgumentValue;

    fn compile(source: &str) -> Result<CucumberExpression, ExpressionError> {
        CucumberExpression::new(source, &ParameterTypeRegistry::new())
    }

    #[test]
    fn literal_text_is_escaped() {
        let expression = compile("it costs $5.00?").unwrap();
        assert!(expression.match_text("it costs $5.00?").is_some());
        assert!(expression.match_text("it costs $5x00?").is_none());
    }

    #[test]
    fn optional_and_alternation() {
        let expression = compile("I have {int} cucumber(s) in my belly/stomach").unwrap();
        let args = expression.match_text("I have 1 cucumber in my stomach").unwrap();
        assert_eq!(args[0].value, ArgumentValue::Int(1));
        assert!(expression.match_text("I have 4 cucumbers in my belly").is_some());
        assert!(expression.match_text("I have 4 cucumbers in my head").is_none());
    }

    #[test]
    fn escaped_specials_are_literal() {
        let expression = compile(r"a \{b\} \(c\) d\/e").unwrap();
        assert!(expression.match_text("a {b} (c) d/e").is_some());
    }

    #[test]
    fn parameter_errors() {
        assert_eq!(compile("a {int").unwrap_err(), ExpressionError::UnterminatedParameter(2));
        assert_eq!(
            compile("a {nope}").unwrap_err(),
            ExpressionError::UndefinedParameterType("nope".to_string())
        );
        assert_eq!(compile("a ({int})").unwrap_err(), ExpressionError::ParameterInOptional(3));
        assert_eq!(compile("a b/{int}").unwrap_err(), ExpressionError::ParameterInAlternative(2));
        assert_eq!(compile("a /b").unwrap_err(), ExpressionError::EmptyAlternative(2));
        assert_eq!(compile("a ()").unwrap_err(), ExpressionError::EmptyOptional(2));
        assert_eq!(compile("a )").unwrap_err(), ExpressionError::Unexpected(2, ')'));
    }

    #[test]
    fn group_inside_custom_regex_does_not_shift_arguments() {
        let mut registry = ParameterTypeRegistry::new();
        registry
            .define(ParameterType::new(
                "color",
                vec!["(red|blue)".to_string()],
                crate::bindings::parameter_types::ParameterKind::Custom,
            ))
            .unwrap();
        let expression = CucumberExpression::new("{color} and {int}", &registry).unwrap();
        let args = expression.match_text("red and 3").unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].value, ArgumentValue::Int(3));
        assert_eq!(args[1].start, 8);
    }
}
