//! Localised Gherkin keyword tables.
//!
//! ## Purpose
//! Maps a language tag (`"en"`, `"fr-CA"`) to the keyword spellings used by
//! the token matcher. The table is embedded at build time from
//! `languages.json` and parsed once on first use.
//!
//! ## Invariants
//! - A resolved dialect is cached for the lifetime of the process and never
//!   invalidated.
//! - A dialect resolved through fallback reports the *requested* tag as its
//!   language but carries the fallback's keywords.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::diagnostics::SourceArc;
use crate::{err_ctx, err_msg};
use crate::syntax::StepKeywordType;
use crate::text::Location;
use crate::GherkinError;

pub const DEFAULT_LANGUAGE: &str = "en";

const LANGUAGES_JSON: &str = include_str!("languages.json");

// === Embedded table ===

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DialectDefinition {
    name: String,
    native: String,
    feature: Vec<String>,
    rule: Vec<String>,
    background: Vec<String>,
    scenario: Vec<String>,
    scenario_outline: Vec<String>,
    examples: Vec<String>,
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
    and: Vec<String>,
    but: Vec<String>,
}

static DEFINITIONS: Lazy<Result<BTreeMap<String, DialectDefinition>, String>> =
    Lazy::new(|| serde_json::from_str(LANGUAGES_JSON).map_err(|e| e.to_string()));

static CACHE: Lazy<RwLock<HashMap<String, Arc<Dialect>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn definitions() -> Result<&'static BTreeMap<String, DialectDefinition>, GherkinError> {
    DEFINITIONS
        .as_ref()
        .map_err(|e| err_msg!(Internal, "Embedded language table is invalid: {}", e))
}

// ============================================================================
// DIALECT
// ============================================================================

/// Keyword vocabulary for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialect {
    language: String,
    name: String,
    native_name: String,
    feature_keywords: Vec<String>,
    rule_keywords: Vec<String>,
    background_keywords: Vec<String>,
    scenario_keywords: Vec<String>,
    scenario_outline_keywords: Vec<String>,
    examples_keywords: Vec<String>,
    given_keywords: Vec<String>,
    when_keywords: Vec<String>,
    then_keywords: Vec<String>,
    and_keywords: Vec<String>,
    but_keywords: Vec<String>,
}

impl Dialect {
    fn from_definition(language: &str, def: &DialectDefinition) -> Self {
        Self {
            language: language.to_string(),
            name: def.name.clone(),
            native_name: def.native.clone(),
            feature_keywords: def.feature.clone(),
            rule_keywords: def.rule.clone(),
            background_keywords: def.background.clone(),
            scenario_keywords: def.scenario.clone(),
            scenario_outline_keywords: def.scenario_outline.clone(),
            examples_keywords: def.examples.clone(),
            given_keywords: def.given.clone(),
            when_keywords: def.when.clone(),
            then_keywords: def.then.clone(),
            and_keywords: def.and.clone(),
            but_keywords: def.but.clone(),
        }
    }

    /// Same keywords, different language tag.
    fn relabelled(&self, language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..self.clone()
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native_name(&self) -> &str {
        &self.native_name
    }

    pub fn feature_keywords(&self) -> &[String] {
        &self.feature_keywords
    }

    pub fn rule_keywords(&self) -> &[String] {
        &self.rule_keywords
    }

    pub fn background_keywords(&self) -> &[String] {
        &self.background_keywords
    }

    pub fn scenario_keywords(&self) -> &[String] {
        &self.scenario_keywords
    }

    pub fn scenario_outline_keywords(&self) -> &[String] {
        &self.scenario_outline_keywords
    }

    pub fn examples_keywords(&self) -> &[String] {
        &self.examples_keywords
    }

    pub fn given_keywords(&self) -> &[String] {
        &self.given_keywords
    }

    pub fn when_keywords(&self) -> &[String] {
        &self.when_keywords
    }

    pub fn then_keywords(&self) -> &[String] {
        &self.then_keywords
    }

    pub fn and_keywords(&self) -> &[String] {
        &self.and_keywords
    }

    pub fn but_keywords(&self) -> &[String] {
        &self.but_keywords
    }

    /// Every step keyword, each spelling once, longest first so that prefix
    /// matching picks `Gegeben seien ` over `Gegeben sei `.
    pub fn step_keywords(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self
            .given_keywords
            .iter()
            .chain(&self.when_keywords)
            .chain(&self.then_keywords)
            .chain(&self.and_keywords)
            .chain(&self.but_keywords)
            .map(String::as_str)
            .collect();
        all.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        all.dedup();
        all
    }

    /// Classifies a step keyword spelling. A spelling shared by several of
    /// Given/When/Then (such as `* `) is `Unknown`; And/But spellings are
    /// `Conjunction`.
    pub fn step_keyword_type(&self, keyword: &str) -> StepKeywordType {
        let has = |list: &[String]| list.iter().any(|k| k == keyword);
        let given = has(&self.given_keywords);
        let when = has(&self.when_keywords);
        let then = has(&self.then_keywords);
        let conjunction = has(&self.and_keywords) || has(&self.but_keywords);
        match (given, when, then) {
            (true, false, false) => StepKeywordType::Context,
            (false, true, false) => StepKeywordType::Action,
            (false, false, true) => StepKeywordType::Outcome,
            (false, false, false) if conjunction => StepKeywordType::Conjunction,
            _ => StepKeywordType::Unknown,
        }
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Resolves dialects by language tag, with region fallback.
#[derive(Debug, Clone)]
pub struct DialectProvider {
    default_language: String,
}

impl Default for DialectProvider {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl DialectProvider {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn default_dialect(&self) -> Result<Arc<Dialect>, GherkinError> {
        self.get_dialect(&self.default_language, None)
    }

    /// Languages present in the embedded table, sorted.
    pub fn available_languages(&self) -> Result<Vec<String>, GherkinError> {
        Ok(definitions()?.keys().cloned().collect())
    }

    /// Looks up `language`, falling back by stripping `-suffix` segments.
    ///
    /// `fr-CA` resolves to a dialect labelled `fr-CA` with the `fr` keywords.
    /// Fails when neither the tag nor any prefix is known; the error names the
    /// tag that was asked for.
    pub fn get_dialect(
        &self,
        language: &str,
        location: Option<&Location>,
    ) -> Result<Arc<Dialect>, GherkinError> {
        self.resolve(language)?
            .ok_or_else(|| no_such_language(language, location))
    }

    /// Like [`get_dialect`](Self::get_dialect) for a tag written in `source`.
    /// A failure labels the tag's span so the report can show the line.
    pub fn get_dialect_in(
        &self,
        language: &str,
        source: &SourceArc,
        location: &Location,
    ) -> Result<Arc<Dialect>, GherkinError> {
        self.resolve(language)?.ok_or_else(|| {
            err_ctx!(
                Language,
                format!("Language not supported: {} ({})", language, location),
                source,
                location.span,
                LANGUAGE_HELP
            )
        })
    }

    fn resolve(&self, language: &str) -> Result<Option<Arc<Dialect>>, GherkinError> {
        if let Some(hit) = read_cache(language) {
            trace!(language, "dialect cache hit");
            return Ok(Some(hit));
        }

        let resolved = match lookup(language)? {
            Some(dialect) => dialect,
            None => {
                let parent = match language.rfind('-') {
                    Some(cut) => self.resolve(&language[..cut])?,
                    None => None,
                };
                match parent {
                    Some(parent) => {
                        debug!(language, fallback = parent.language(), "dialect resolved through fallback");
                        parent.relabelled(language)
                    }
                    None => return Ok(None),
                }
            }
        };

        let mut cache = CACHE.write().unwrap_or_else(|e| e.into_inner());
        let entry = cache
            .entry(language.to_string())
            .or_insert_with(|| Arc::new(resolved));
        Ok(Some(Arc::clone(entry)))
    }
}

fn read_cache(language: &str) -> Option<Arc<Dialect>> {
    let cache = CACHE.read().unwrap_or_else(|e| e.into_inner());
    cache.get(language).cloned()
}

fn lookup(language: &str) -> Result<Option<Dialect>, GherkinError> {
    let defs = definitions()?;
    if let Some(def) = defs.get(language) {
        return Ok(Some(Dialect::from_definition(language, def)));
    }
    Ok(defs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(language))
        .map(|(_, def)| Dialect::from_definition(language, def)))
}

const LANGUAGE_HELP: &str = "use one of the languages listed by `gherkin-bind dialects`";

fn no_such_language(language: &str, location: Option<&Location>) -> GherkinError {
    let error = match location {
        Some(loc) => err_msg!(Language, "Language not supported: {} ({})", language, loc),
        None => err_msg!(Language, "Language not supported: {}", language),
    };
    error.with_help(LANGUAGE_HELP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses() {
        assert!(definitions().is_ok());
    }

    #[test]
    fn star_is_unknown_and_and_is_conjunction() {
        let en = DialectProvider::default().default_dialect().ok();
        let en = en.as_deref();
        assert_eq!(en.map(|d| d.step_keyword_type("* ")), Some(StepKeywordType::Unknown));
        assert_eq!(en.map(|d| d.step_keyword_type("And ")), Some(StepKeywordType::Conjunction));
        assert_eq!(en.map(|d| d.step_keyword_type("Given ")), Some(StepKeywordType::Context));
        assert_eq!(en.map(|d| d.step_keyword_type("Then ")), Some(StepKeywordType::Outcome));
    }

    #[test]
    fn step_keywords_are_longest_first() {
        let de = DialectProvider::default().get_dialect("de", None).ok();
        let keywords = de.as_deref().map(|d| d.step_keywords()).unwrap_or_default();
        let seien = keywords.iter().position(|k| *k == "Gegeben seien ");
        let sei = keywords.iter().position(|k| *k == "Gegeben sei ");
        assert!(seien < sei);
    }
}
