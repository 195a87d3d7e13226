//! Parameter types for Cucumber Expressions.
//!
//! A parameter type names a regex (`{int}` → `-?\d+`) and a conversion from
//! matched text to an [`ArgumentValue`]. Built-in types are always present;
//! step argument transformations add user types by name.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::binding::{BindingMethod, StepArgumentTransformation};
use crate::{err_msg, GherkinError};

const INT_REGEX: &str = r"-?\d+";
const FLOAT_REGEX: &str = r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?";
const WORD_REGEX: &str = r"[^\s]+";
const STRING_REGEX: &str = r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#;
const MATCH_ALL_REGEX: &str = r".*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterKind {
    Int,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Decimal,
    Word,
    String,
    /// `{}`: any text.
    Anonymous,
    /// Defined by a step argument transformation.
    Custom,
}

/// A converted step argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ArgumentValue {
    Int(i32),
    Long(i64),
    Short(i16),
    Byte(u8),
    Float(f32),
    Double(f64),
    Decimal(f64),
    Word(String),
    String(String),
    /// Unconverted text: regex captures, `{}` and values that failed to
    /// convert.
    Text(String),
    Custom { type_name: String, text: String },
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Int(v) => write!(f, "{v}"),
            ArgumentValue::Long(v) => write!(f, "{v}"),
            ArgumentValue::Short(v) => write!(f, "{v}"),
            ArgumentValue::Byte(v) => write!(f, "{v}"),
            ArgumentValue::Float(v) => write!(f, "{v}"),
            ArgumentValue::Double(v) | ArgumentValue::Decimal(v) => write!(f, "{v}"),
            ArgumentValue::Word(s) | ArgumentValue::String(s) | ArgumentValue::Text(s) => {
                write!(f, "{s:?}")
            }
            ArgumentValue::Custom { type_name, text } => write!(f, "{type_name}({text:?})"),
        }
    }
}

/// One captured argument of a matched step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedArgument {
    pub text: String,
    /// Byte offset of the capture within the step text.
    pub start: usize,
    pub value: ArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterType {
    name: String,
    regexps: Vec<String>,
    kind: ParameterKind,
    use_for_snippets: bool,
    transformer: Option<BindingMethod>,
}

impl ParameterType {
    pub fn new(name: impl Into<String>, regexps: Vec<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            regexps,
            kind,
            use_for_snippets: true,
            transformer: None,
        }
    }

    pub fn from_transformation(transformation: &StepArgumentTransformation) -> Self {
        Self {
            name: transformation.name.clone(),
            regexps: vec![transformation
                .regex
                .clone()
                .unwrap_or_else(|| MATCH_ALL_REGEX.to_string())],
            kind: ParameterKind::Custom,
            use_for_snippets: transformation.use_for_snippets,
            transformer: Some(transformation.method.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn use_for_snippets(&self) -> bool {
        self.use_for_snippets
    }

    pub fn transformer(&self) -> Option<&BindingMethod> {
        self.transformer.as_ref()
    }

    /// The regex body used inside a capture group. Alternatives are wrapped
    /// in non-capturing groups so the group count stays one per parameter.
    pub fn pattern(&self) -> String {
        match self.regexps.as_slice() {
            [single] => single.clone(),
            many => many
                .iter()
                .map(|r| format!("(?:{r})"))
                .collect::<Vec<_>>()
                .join("|"),
        }
    }

    /// Converts matched text. Text that does not fit the target type (an
    /// `{int}` that overflows, say) falls back to `Text`.
    pub fn convert(&self, text: &str) -> ArgumentValue {
        let fallback = || ArgumentValue::Text(text.to_string());
        match self.kind {
            ParameterKind::Int => text.parse().map(ArgumentValue::Int).unwrap_or_else(|_| fallback()),
            ParameterKind::Long => text.parse().map(ArgumentValue::Long).unwrap_or_else(|_| fallback()),
            ParameterKind::Short => text.parse().map(ArgumentValue::Short).unwrap_or_else(|_| fallback()),
            ParameterKind::Byte => text.parse().map(ArgumentValue::Byte).unwrap_or_else(|_| fallback()),
            ParameterKind::Float => text.parse().map(ArgumentValue::Float).unwrap_or_else(|_| fallback()),
            ParameterKind::Double => text.parse().map(ArgumentValue::Double).unwrap_or_else(|_| fallback()),
            ParameterKind::Decimal => text.parse().map(ArgumentValue::Decimal).unwrap_or_else(|_| fallback()),
            ParameterKind::Word => ArgumentValue::Word(text.to_string()),
            ParameterKind::String => ArgumentValue::String(unquote(text)),
            ParameterKind::Anonymous => fallback(),
            ParameterKind::Custom => ArgumentValue::Custom {
                type_name: self.name.clone(),
                text: text.to_string(),
            },
        }
    }
}

/// Strips the surrounding quotes of a `{string}` match and resolves escaped
/// quotes.
fn unquote(text: &str) -> String {
    let mut chars = text.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) if text.len() >= 2 && text.ends_with(q) => q,
        _ => return text.to_string(),
    };
    let inner = &text[1..text.len() - 1];
    inner.replace(&format!("\\{quote}"), &quote.to_string())
}

/// All parameter types known to a registry, by name.
#[derive(Debug, Clone)]
pub struct ParameterTypeRegistry {
    types: BTreeMap<String, ParameterType>,
}

impl Default for ParameterTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterTypeRegistry {
    /// A registry with the built-in types and their .NET-style aliases.
    pub fn new() -> Self {
        let builtins: [(&str, &str, ParameterKind, bool); 18] = [
            ("int", INT_REGEX, ParameterKind::Int, true),
            ("long", INT_REGEX, ParameterKind::Long, true),
            ("short", INT_REGEX, ParameterKind::Short, true),
            ("byte", INT_REGEX, ParameterKind::Byte, true),
            ("float", FLOAT_REGEX, ParameterKind::Float, true),
            ("double", FLOAT_REGEX, ParameterKind::Double, true),
            ("decimal", FLOAT_REGEX, ParameterKind::Decimal, true),
            ("word", WORD_REGEX, ParameterKind::Word, false),
            ("string", STRING_REGEX, ParameterKind::String, true),
            ("", MATCH_ALL_REGEX, ParameterKind::Anonymous, false),
            ("Int32", INT_REGEX, ParameterKind::Int, false),
            ("Int64", INT_REGEX, ParameterKind::Long, false),
            ("Int16", INT_REGEX, ParameterKind::Short, false),
            ("Byte", INT_REGEX, ParameterKind::Byte, false),
            ("Single", FLOAT_REGEX, ParameterKind::Float, false),
            ("Double", FLOAT_REGEX, ParameterKind::Double, false),
            ("Decimal", FLOAT_REGEX, ParameterKind::Decimal, false),
            ("String", STRING_REGEX, ParameterKind::String, false),
        ];
        let types = builtins
            .into_iter()
            .map(|(name, regex, kind, snippets)| {
                let mut parameter = ParameterType::new(name, vec![regex.to_string()], kind);
                parameter.use_for_snippets = snippets;
                (name.to_string(), parameter)
            })
            .collect();
        Self { types }
    }

    /// Adds a type. Names are unique; redefining one is an error.
    pub fn define(&mut self, parameter: ParameterType) -> Result<(), GherkinError> {
        if self.types.contains_key(parameter.name()) {
            return Err(err_msg!(
                Binding,
                "There is already a parameter type with name {}",
                parameter.name()
            ));
        }
        self.types.insert(parameter.name.clone(), parameter);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ParameterType> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_builtins() {
        let registry = ParameterTypeRegistry::new();
        let int = registry.lookup("int").unwrap();
        assert_eq!(int.convert("-42"), ArgumentValue::Int(-42));
        assert_eq!(
            int.convert("99999999999"),
            ArgumentValue::Text("99999999999".to_string())
        );
        let string = registry.lookup("string").unwrap();
        assert_eq!(
            string.convert(r#""say \"hi\"""#),
            ArgumentValue::String(r#"say "hi""#.to_string())
        );
        assert_eq!(
            registry.lookup("").unwrap().convert("anything"),
            ArgumentValue::Text("anything".to_string())
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ParameterTypeRegistry::new();
        let again = ParameterType::new("int", vec![INT_REGEX.to_string()], ParameterKind::Int);
        let err = registry.define(again).unwrap_err();
        assert!(err.to_string().contains("already a parameter type with name int"));
    }

    #[test]
    fn alternatives_keep_one_group() {
        let parameter = ParameterType::new(
            "color",
            vec!["red".to_string(), "blue".to_string()],
            ParameterKind::Custom,
        );
        assert_eq!(parameter.pattern(), "(?:red)|(?:blue)");
    }
}
