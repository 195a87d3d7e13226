//! Configuration file model.
//!
//! ```yaml
//! language:
//!   feature: de
//! parser:
//!   stopAtFirstError: true
//! bindings:
//!   missingOrPendingStepsOutcome: error
//! ```
//!
//! JSON or YAML, chosen by extension. The library core never reads this
//! itself; callers turn it into explicit options.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialect::DEFAULT_LANGUAGE;
use crate::parsing::ParseOptions;
use crate::text::TextSpan;
use crate::{err_ctx, err_msg, to_error_source, GherkinError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GherkinBindConfig {
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub bindings: BindingsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LanguageConfig {
    /// Default feature-file language.
    #[serde(default = "default_language")]
    pub feature: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            feature: default_language(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParserConfig {
    #[serde(default)]
    pub stop_at_first_error: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BindingsConfig {
    #[serde(default)]
    pub missing_or_pending_steps_outcome: MissingStepsOutcome,
}

/// How undefined steps count toward the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingStepsOutcome {
    #[default]
    Pending,
    Error,
    Ignore,
}

impl GherkinBindConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GherkinError> {
        let config: Self = load_structured(path.as_ref())?;
        debug!(path = %path.as_ref().display(), language = %config.language.feature, "loaded configuration");
        Ok(config)
    }

    pub fn to_parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_culture(self.language.feature.clone())
            .with_stop_at_first_error(self.parser.stop_at_first_error)
    }
}

/// Reads a JSON or YAML file into `T`. `.json` is JSON; `.yaml`, `.yml`
/// and anything else is YAML. Parse errors point at the offending position.
pub(crate) fn load_structured<T: DeserializeOwned>(path: &Path) -> Result<T, GherkinError> {
    let text = fs::read_to_string(path).map_err(|e| {
        err_msg!(Io, "cannot read {}: {}", path.display(), e).with_source_error(e)
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text).map_err(|e| {
            let span = json_error_span(&text, &e);
            invalid_file(path, &text, span, e)
        })
    } else {
        serde_yaml::from_str(&text).map_err(|e| {
            let span = e.location().map(|l| TextSpan::new(l.index(), 0));
            invalid_file(path, &text, span, e)
        })
    }
}

/// serde_json reports 1-based line and column; column 0 means no position.
fn json_error_span(text: &str, error: &serde_json::Error) -> Option<TextSpan> {
    if error.line() == 0 {
        return None;
    }
    let line_start: usize = text
        .split_inclusive('\n')
        .take(error.line() - 1)
        .map(str::len)
        .sum();
    let mut offset = (line_start + error.column().saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    Some(TextSpan::new(offset, 0))
}

fn invalid_file<E>(path: &Path, text: &str, span: Option<TextSpan>, error: E) -> GherkinError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = format!("invalid {}: {}", path.display(), error);
    let invalid = match span {
        Some(span) => err_ctx!(
            Config,
            message,
            &to_error_source(path.display().to_string(), text),
            span,
            "check key names and value types against the documented layout"
        ),
        None => err_msg!(Config, message),
    };
    invalid.with_source_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let config: GherkinBindConfig = serde_yaml::from_str("parser:\n  stopAtFirstError: true\n").unwrap();
        assert_eq!(config.language.feature, "en");
        assert!(config.parser.stop_at_first_error);
        assert_eq!(
            config.bindings.missing_or_pending_steps_outcome,
            MissingStepsOutcome::Pending
        );
        let options = config.to_parse_options();
        assert_eq!(options.culture, "en");
        assert!(options.stop_at_first_error);
    }

    #[test]
    fn json_errors_point_at_the_line_and_column() {
        let text = "{\n  \"languge\": {}\n}\n";
        let error = serde_json::from_str::<GherkinBindConfig>(text).unwrap_err();
        let span = json_error_span(text, &error).unwrap();
        assert_eq!(text[..span.start].lines().count(), 2);
        assert!(span.start > 2 && span.start <= text.find("{}").unwrap());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<GherkinBindConfig>(r#"{"languge": {"feature": "de"}}"#);
        assert!(err.is_err());
    }
}
