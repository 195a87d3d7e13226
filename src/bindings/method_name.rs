//! Patterns for step definitions declared without text.
//!
//! The method name is the pattern: `Given_I_have_count_cukes(int count)` and
//! `GivenIHaveCountCukes(int count)` both match `I have 5 cukes`. A leading
//! keyword is dropped, words are split on `_` and case changes, and a word
//! naming a method parameter captures one argument.

use regex::{Regex, RegexBuilder};

use super::binding::BindingMethod;
use super::cucumber_expression::ExpressionError;

const KEYWORD_PREFIXES: &[&str] = &["Given", "When", "Then", "And", "But"];

/// Splits `GivenIHave_count_Cukes` into `["Given", "I", "Have", "count", "Cukes"]`.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = c.is_uppercase()
            && i > 0
            && match (chars.get(i - 1), chars.get(i + 1)) {
                (Some(prev), _) if prev.is_lowercase() || prev.is_ascii_digit() => true,
                (Some(prev), Some(next)) => prev.is_uppercase() && next.is_lowercase(),
                _ => false,
            };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Builds the case-insensitive, anchored regex for a method-name binding.
pub fn method_name_regex(method: &BindingMethod) -> Result<Regex, ExpressionError> {
    let mut words = split_words(&method.name);
    if words.len() > 1
        && KEYWORD_PREFIXES
            .iter()
            .any(|k| k.eq_ignore_ascii_case(&words[0]))
    {
        words.remove(0);
    }
    let parts: Vec<String> = words
        .iter()
        .map(|word| {
            let is_parameter = method
                .parameters
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(word));
            if is_parameter {
                "(.*?)".to_string()
            } else {
                regex::escape(word)
            }
        })
        .collect();
    let pattern = format!(r"^{}$", parts.join(r"\s+"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ExpressionError::Regex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_underscores_and_case() {
        assert_eq!(split_words("Given_I_have_cukes"), vec!["Given", "I", "have", "cukes"]);
        assert_eq!(split_words("WhenIPressAdd"), vec!["When", "I", "Press", "Add"]);
        assert_eq!(split_words("ThenTheHTTPStatusIs"), vec!["Then", "The", "HTTP", "Status", "Is"]);
    }

    #[test]
    fn parameters_capture() {
        let method = BindingMethod::new("Steps", "Steps", "Given_I_have_count_cukes")
            .with_parameter("count", "Int32");
        let regex = method_name_regex(&method).unwrap();
        let caps = regex.captures("I have 5 cukes").unwrap();
        assert_eq!(&caps[1], "5");
        assert!(regex.is_match("i HAVE 12 Cukes"));
        assert!(!regex.is_match("Given I have 5 cukes"));
    }
}
