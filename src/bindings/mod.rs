//! Step definition bindings.
//!
//! ## Purpose
//! Connects steps to the user methods that implement them. Discovery (done
//! elsewhere) reports declarations; this module validates and compiles them
//! into a [`StepDefinitionRegistry`] and matches steps against it.
//!
//! ## Modules
//! - `binding`: declaration and compiled-binding records.
//! - `classifier`: Cucumber Expression or regex?
//! - `cucumber_expression`: expression parsing and compilation.
//! - `parameter_types`: `{int}`, `{string}`, ... and user transformations.
//! - `method_name`: patterns for bindings declared without text.
//! - `registry`: validation and the built registry.
//! - `matcher`: Bound, Undefined or Ambiguous.
//! - `snippets`: skeletons for undefined steps.

mod binding;
mod classifier;
mod cucumber_expression;
mod matcher;
mod method_name;
mod parameter_types;
mod registry;
mod snippets;

pub use binding::{
    BindingMethod, BindingParameter, BindingSet, ExpressionType, HookBinding, HookType,
    StepArgumentTransformation, StepDefinitionBinding, StepDefinitionDeclaration,
    StepDefinitionType,
};
pub use classifier::is_cucumber_expression;
pub use cucumber_expression::{CucumberExpression, ExpressionError};
pub use matcher::{BindingMatch, MatchResult, StepInstance, StepMatchError};
pub use method_name::method_name_regex;
pub use parameter_types::{
    ArgumentValue, MatchedArgument, ParameterKind, ParameterType, ParameterTypeRegistry,
};
pub use registry::{BindingDiagnostic, RegistryBuild, RegistryBuilder, StepDefinitionRegistry};
pub use snippets::StepSnippet;
