//! Step-to-binding matching.

use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use super::binding::StepDefinitionBinding;
use super::parameter_types::MatchedArgument;
use super::registry::StepDefinitionRegistry;
use crate::pickles::PickleStep;
use crate::syntax::StepKeywordType;

/// The step being matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInstance {
    /// Keyword as written, with its trailing space.
    pub keyword: String,
    /// Resolved type; conjunctions take the type of the step before them.
    pub keyword_type: StepKeywordType,
    pub text: String,
}

impl StepInstance {
    pub fn new(keyword: impl Into<String>, keyword_type: StepKeywordType, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            keyword_type,
            text: text.into(),
        }
    }

    /// `Given I have 5 cukes`.
    pub fn description(&self) -> String {
        let keyword = self.keyword.trim_end();
        if keyword.is_empty() {
            self.text.clone()
        } else {
            format!("{keyword} {}", self.text)
        }
    }
}

impl From<&PickleStep> for StepInstance {
    fn from(step: &PickleStep) -> Self {
        Self::new(step.keyword.clone(), step.keyword_type, step.text.clone())
    }
}

/// A binding that matched, with its arguments.
#[derive(Debug, Clone)]
pub struct BindingMatch {
    binding: Arc<StepDefinitionBinding>,
    arguments: Vec<MatchedArgument>,
}

impl BindingMatch {
    pub fn binding(&self) -> &StepDefinitionBinding {
        &self.binding
    }

    pub fn arguments(&self) -> &[MatchedArgument] {
        &self.arguments
    }
}

#[derive(Debug, Clone)]
pub enum MatchResult {
    Bound(BindingMatch),
    Undefined,
    /// Two or more bindings matched, in declaration order.
    Ambiguous(Vec<BindingMatch>),
}

impl MatchResult {
    pub fn is_bound(&self) -> bool {
        matches!(self, MatchResult::Bound(_))
    }

    /// Turns anything but a single match into an error describing `step`.
    pub fn into_result(self, step: &StepInstance) -> Result<BindingMatch, StepMatchError> {
        match self {
            MatchResult::Bound(found) => Ok(found),
            MatchResult::Undefined => Err(StepMatchError::Undefined {
                step: step.text.clone(),
            }),
            MatchResult::Ambiguous(candidates) => Err(StepMatchError::Ambiguous {
                step: step.description(),
                methods: candidates
                    .iter()
                    .map(|c| c.binding.method().to_string())
                    .collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepMatchError {
    #[error("No matching step definition found for step '{step}'")]
    Undefined { step: String },
    #[error("Ambiguous step definitions found for step '{step}': {}", .methods.join(", "))]
    Ambiguous { step: String, methods: Vec<String> },
}

impl StepDefinitionRegistry {
    /// Finds the bindings whose keyword accepts the step and whose pattern
    /// matches its whole text.
    pub fn match_step(&self, step: &StepInstance) -> MatchResult {
        let mut candidates: Vec<BindingMatch> = self
            .step_definitions()
            .iter()
            .filter(|binding| binding.keyword().accepts(step.keyword_type))
            .filter_map(|binding| {
                binding.match_text(&step.text).map(|arguments| BindingMatch {
                    binding: Arc::clone(binding),
                    arguments,
                })
            })
            .collect();

        let result = match candidates.len() {
            0 => MatchResult::Undefined,
            1 => MatchResult::Bound(candidates.remove(0)),
            _ => MatchResult::Ambiguous(candidates),
        };
        let outcome = match &result {
            MatchResult::Bound(_) => "bound",
            MatchResult::Undefined => "undefined",
            MatchResult::Ambiguous(_) => "ambiguous",
        };
        trace!(step = %step.description(), outcome, "matched step");
        result
    }
}
