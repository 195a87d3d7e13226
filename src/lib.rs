//! gherkin-bind: a lossless Gherkin parser and step-definition binder.
//!
//! Feature files parse into a full-fidelity syntax tree
//! ([`syntax::GherkinSyntaxTree`]) that reproduces its input byte for byte and
//! carries grammar problems as diagnostics. Scenarios compile into pickles
//! ([`pickles::compile_pickles`]) whose steps are matched against a
//! [`bindings::StepDefinitionRegistry`].

pub use crate::diagnostics::{to_error_source, ErrorContext, ErrorType, GherkinError};

pub mod bindings;
pub mod cli;
pub mod config;
pub mod dialect;
pub mod diagnostics;
pub mod parsing;
pub mod pickles;
pub mod syntax;
pub mod text;
