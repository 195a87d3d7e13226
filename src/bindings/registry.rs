//! Step definition registry.
//!
//! `RegistryBuilder` collects declarations, validates and compiles them, and
//! produces an immutable [`StepDefinitionRegistry`]. Declarations that fail
//! validation are left out and reported; one bad binding never hides the
//! rest. Once built the registry is read-only and may be shared across
//! threads, or installed once as the process-wide registry.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{debug, warn};

use super::binding::{
    BindingSet, ExpressionType, HookBinding, HookType, StepArgumentTransformation,
    StepDefinitionBinding, StepDefinitionDeclaration, StepPattern,
};
use super::classifier::is_cucumber_expression;
use super::cucumber_expression::{CucumberExpression, ExpressionError};
use super::method_name::method_name_regex;
use super::parameter_types::{ParameterType, ParameterTypeRegistry};
use crate::syntax::Severity;
use crate::{err_msg, GherkinError};

static GLOBAL_REGISTRY: OnceCell<StepDefinitionRegistry> = OnceCell::new();

/// A problem found while building the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDiagnostic {
    pub severity: Severity,
    /// `Assembly:Type.Method(...)` of the offending binding.
    pub method: String,
    pub message: String,
}

impl fmt::Display for BindingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(
                f,
                "Invalid step definition! The step definition method '{}' is invalid: {}.",
                self.method, self.message
            ),
            _ => write!(f, "Step definition '{}': {}.", self.method, self.message),
        }
    }
}

/// Collects bindings before validation.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    step_definitions: Vec<StepDefinitionDeclaration>,
    hooks: Vec<HookBinding>,
    transformations: Vec<StepArgumentTransformation>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step_definition(&mut self, declaration: StepDefinitionDeclaration) -> &mut Self {
        self.step_definitions.push(declaration);
        self
    }

    pub fn add_hook(&mut self, hook: HookBinding) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn add_transformation(&mut self, transformation: StepArgumentTransformation) -> &mut Self {
        self.transformations.push(transformation);
        self
    }

    pub fn add_binding_set(&mut self, set: BindingSet) -> &mut Self {
        self.step_definitions.extend(set.step_definitions);
        self.hooks.extend(set.hooks);
        self.transformations.extend(set.transformations);
        self
    }

    /// Validates and compiles everything collected so far.
    pub fn build(self) -> RegistryBuild {
        let mut diagnostics = Vec::new();

        let mut parameter_types = ParameterTypeRegistry::new();
        for transformation in &self.transformations {
            if let Some(regex) = &transformation.regex {
                if let Err(e) = Regex::new(regex) {
                    diagnostics.push(error(&transformation.method.to_string(), e.to_string()));
                    continue;
                }
            }
            if let Err(e) = parameter_types.define(ParameterType::from_transformation(transformation)) {
                diagnostics.push(error(&transformation.method.to_string(), e.message().to_string()));
            }
        }

        let mut step_definitions = Vec::new();
        for declaration in self.step_definitions {
            match compile(declaration, &parameter_types, &mut diagnostics) {
                Some(binding) => step_definitions.push(Arc::new(binding)),
                None => continue,
            }
        }

        let mut hooks = self.hooks;
        // Stable sort keeps declaration order among equal orders.
        hooks.sort_by_key(|h| h.order);

        for diagnostic in &diagnostics {
            match diagnostic.severity {
                Severity::Error => warn!(method = %diagnostic.method, "{}", diagnostic.message),
                _ => debug!(method = %diagnostic.method, "{}", diagnostic.message),
            }
        }
        debug!(
            step_definitions = step_definitions.len(),
            hooks = hooks.len(),
            parameter_types = parameter_types.len(),
            "built step definition registry"
        );

        RegistryBuild {
            registry: StepDefinitionRegistry {
                step_definitions,
                hooks,
                transformations: self.transformations,
                parameter_types,
            },
            diagnostics,
        }
    }
}

fn error(method: &str, message: impl Into<String>) -> BindingDiagnostic {
    BindingDiagnostic {
        severity: Severity::Error,
        method: method.to_string(),
        message: message.into(),
    }
}

fn compile(
    declaration: StepDefinitionDeclaration,
    parameter_types: &ParameterTypeRegistry,
    diagnostics: &mut Vec<BindingDiagnostic>,
) -> Option<StepDefinitionBinding> {
    let method_text = declaration.method.to_string();
    let Some(text) = declaration.text else {
        return match method_name_regex(&declaration.method) {
            Ok(regex) => Some(StepDefinitionBinding::new(
                declaration.keyword,
                declaration.method.name.clone(),
                ExpressionType::MethodName,
                declaration.method,
                StepPattern::Regex(regex),
            )),
            Err(e) => {
                diagnostics.push(error(&method_text, e.to_string()));
                None
            }
        };
    };

    if text.trim().is_empty() {
        diagnostics.push(error(&method_text, "step definition text cannot be empty"));
        return None;
    }
    if text.trim() != text {
        diagnostics.push(BindingDiagnostic {
            severity: Severity::Warning,
            method: method_text.clone(),
            message: "step definition text has leading or trailing whitespace".to_string(),
        });
    }

    let expression_type = declaration.expression_type.unwrap_or_else(|| {
        if is_cucumber_expression(&text) {
            ExpressionType::CucumberExpression
        } else {
            ExpressionType::RegularExpression
        }
    });
    let pattern = match expression_type {
        ExpressionType::CucumberExpression => {
            CucumberExpression::new(&text, parameter_types).map(StepPattern::Cucumber)
        }
        ExpressionType::RegularExpression => anchored_regex(&text).map(StepPattern::Regex),
        ExpressionType::MethodName => method_name_regex(&declaration.method).map(StepPattern::Regex),
    };
    match pattern {
        Ok(pattern) => Some(StepDefinitionBinding::new(
            declaration.keyword,
            text,
            expression_type,
            declaration.method,
            pattern,
        )),
        Err(e) => {
            diagnostics.push(error(&method_text, e.to_string()));
            None
        }
    }
}

/// Step regexes must match the whole step text.
fn anchored_regex(text: &str) -> Result<Regex, ExpressionError> {
    let start = if text.starts_with('^') { "" } else { "^" };
    let end = if text.ends_with('$') { "" } else { "$" };
    Regex::new(&format!("{start}(?:{}){end}", strip_anchors(text)))
        .map_err(|e| ExpressionError::Regex(e.to_string()))
}

fn strip_anchors(text: &str) -> &str {
    let text = text.strip_prefix('^').unwrap_or(text);
    text.strip_suffix('$').unwrap_or(text)
}

/// The registry plus everything validation reported.
#[derive(Debug)]
pub struct RegistryBuild {
    pub registry: StepDefinitionRegistry,
    pub diagnostics: Vec<BindingDiagnostic>,
}

impl RegistryBuild {
    pub fn errors(&self) -> impl Iterator<Item = &BindingDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// The registry, or a binding error listing every invalid declaration.
    pub fn into_result(self) -> Result<StepDefinitionRegistry, GherkinError> {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        if errors.is_empty() {
            Ok(self.registry)
        } else {
            Err(err_msg!(Binding, "Binding error(s) found:\n{}", errors.join("\n")))
        }
    }
}

/// Validated bindings, ready for matching.
#[derive(Debug, Clone, Default)]
pub struct StepDefinitionRegistry {
    step_definitions: Vec<Arc<StepDefinitionBinding>>,
    hooks: Vec<HookBinding>,
    transformations: Vec<StepArgumentTransformation>,
    parameter_types: ParameterTypeRegistry,
}

impl StepDefinitionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Step definitions in declaration order.
    pub fn step_definitions(&self) -> &[Arc<StepDefinitionBinding>] {
        &self.step_definitions
    }

    /// Hooks of one type, lowest order first.
    pub fn hooks(&self, hook_type: HookType) -> impl Iterator<Item = &HookBinding> {
        self.hooks.iter().filter(move |h| h.hook_type == hook_type)
    }

    pub fn transformations(&self) -> &[StepArgumentTransformation] {
        &self.transformations
    }

    pub fn parameter_types(&self) -> &ParameterTypeRegistry {
        &self.parameter_types
    }

    pub fn len(&self) -> usize {
        self.step_definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_definitions.is_empty()
    }

    /// Installs this registry as the process-wide one. Only the first call
    /// succeeds.
    pub fn install_global(self) -> Result<&'static StepDefinitionRegistry, GherkinError> {
        GLOBAL_REGISTRY
            .set(self)
            .map_err(|_| err_msg!(Binding, "A step definition registry is already installed"))?;
        GLOBAL_REGISTRY
            .get()
            .ok_or_else(|| err_msg!(Internal, "global registry vanished after install"))
    }

    pub fn global() -> Option<&'static StepDefinitionRegistry> {
        GLOBAL_REGISTRY.get()
    }
}
