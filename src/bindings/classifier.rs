//! Cucumber Expression vs. regular expression classification.
//!
//! Step text does not say which syntax it uses, so it is classified by a
//! fixed, ordered list of signals. The first signal that fires decides. The
//! order matters: `I have {count} cukes \d+` is a Cucumber Expression because
//! the placeholder check runs before the `\d+` check.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAMETER_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\w*\}").expect("static pattern"));
static COMMON_REGEX_CONSTRUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\([^\)]+[\*\+]\)|\.\*)").expect("static pattern"));
static EXTENDED_REGEX_CONSTRUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\\.|\\d\+)").expect("static pattern"));

/// Returns `true` when `text` should be read as a Cucumber Expression.
///
/// # Example
/// ```
/// use gherkin_bind::bindings::is_cucumber_expression;
/// assert!(is_cucumber_expression("I have {int} cukes"));
/// assert!(!is_cucumber_expression(r"I have (\d+) cukes"));
/// ```
pub fn is_cucumber_expression(text: &str) -> bool {
    if text.starts_with('^') || text.ends_with('$') {
        return false;
    }
    if PARAMETER_PLACEHOLDER.is_match(text) {
        return true;
    }
    if COMMON_REGEX_CONSTRUCT.is_match(text) {
        return false;
    }
    if EXTENDED_REGEX_CONSTRUCT.is_match(text) {
        return false;
    }
    true
}
