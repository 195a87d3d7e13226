//! The gherkin-bind command-line interface.
//!
//! `execute` dispatches a parsed command and returns the process exit code;
//! the binary owns argument parsing, logging setup and `process::exit`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use walkdir::WalkDir;

use crate::bindings::{
    is_cucumber_expression, BindingSet, ExpressionType, MatchResult, RegistryBuilder,
    StepInstance, StepSnippet,
};
use crate::config::{GherkinBindConfig, MissingStepsOutcome};
use crate::dialect::DialectProvider;
use crate::parsing::ParseOptions;
use crate::pickles::compile_pickles;
use crate::syntax::GherkinSyntaxTree;
use crate::text::SourceText;
use crate::{err_msg, GherkinError};

pub mod args;
pub mod diagnostics;
pub mod output;

pub use args::{Command, GherkinBindArgs};
pub use diagnostics::SyntaxDiagnosticReport;

const FEATURE_EXTENSION: &str = "feature";

/// Runs `args.command`. Returns the exit code: 0 on success, 1 when the
/// command found problems, 2 when it could not run.
pub fn execute(args: GherkinBindArgs) -> i32 {
    match dispatch(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            2
        }
    }
}

fn dispatch(args: GherkinBindArgs) -> Result<i32, GherkinError> {
    let config = match &args.config {
        Some(path) => GherkinBindConfig::load(path)?,
        None => GherkinBindConfig::default(),
    };
    let mut options = config.to_parse_options();
    if let Some(language) = &args.language {
        options = options.with_culture(language.clone());
    }

    match args.command {
        Command::Check { path } => check(&path, &options),
        Command::Tree { file } => {
            let tree = parse_file(&file, &options)?;
            let mut stdout = StandardStream::stdout(ColorChoice::Auto);
            output::write_tree(&mut stdout, tree.root())?;
            Ok(0)
        }
        Command::Pickles { file, json } => {
            let tree = parse_file(&file, &options)?;
            let pickles = compile_pickles(&tree);
            if json {
                let text = serde_json::to_string_pretty(&pickles)
                    .map_err(|e| err_msg!(Internal, "cannot serialize pickles: {}", e))?;
                println!("{text}");
            } else {
                let mut stdout = StandardStream::stdout(ColorChoice::Auto);
                output::write_pickles(&mut stdout, &pickles)?;
            }
            Ok(0)
        }
        Command::Classify { patterns } => {
            let mut stdout = StandardStream::stdout(ColorChoice::Auto);
            for pattern in &patterns {
                let expression_type = if is_cucumber_expression(pattern) {
                    ExpressionType::CucumberExpression
                } else {
                    ExpressionType::RegularExpression
                };
                output::write_classification(&mut stdout, pattern, expression_type)?;
            }
            Ok(0)
        }
        Command::Match { feature, bindings } => {
            match_steps(&feature, &bindings, &options, config.bindings.missing_or_pending_steps_outcome)
        }
        Command::Dialects => {
            let provider = DialectProvider::new(options.culture.clone());
            for language in provider.available_languages()? {
                let dialect = provider.get_dialect(&language, None)?;
                println!("{language}\t{}\t{}", dialect.name(), dialect.native_name());
            }
            Ok(0)
        }
    }
}

// ============================================================================
// FILES
// ============================================================================

/// `path` itself when it is a file, otherwise every `.feature` file below
/// it, sorted.
pub fn discover_feature_files(path: &Path) -> Result<Vec<PathBuf>, GherkinError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| err_msg!(Io, "Failed to walk directory: {}", e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_feature = entry
            .path()
            .extension()
            .is_some_and(|e| e == FEATURE_EXTENSION);
        if is_feature {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn parse_file(path: &Path, options: &ParseOptions) -> Result<GherkinSyntaxTree, GherkinError> {
    let text = fs::read_to_string(path)
        .map_err(|e| err_msg!(Io, "cannot read {}: {}", path.display(), e).with_source_error(e))?;
    let source = Arc::new(SourceText::new(text));
    let checksum: String = source.checksum()[..8].iter().map(|b| format!("{b:02x}")).collect();
    debug!(path = %path.display(), bytes = source.len(), checksum, "read feature file");
    GherkinSyntaxTree::parse_source(source, options, path.display().to_string())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn check(path: &Path, options: &ParseOptions) -> Result<i32, GherkinError> {
    let files = discover_feature_files(path)?;
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut count = 0;
    for file in &files {
        let tree = parse_file(file, options)?;
        for diagnostic in tree.diagnostics() {
            output::write_diagnostic(&mut stdout, &diagnostic)?;
            count += 1;
        }
        for report in SyntaxDiagnosticReport::for_tree(&tree) {
            eprintln!("{:?}", miette::Report::new(report));
        }
    }
    output::write_check_summary(&mut stdout, files.len(), count)?;
    Ok(if count == 0 { 0 } else { 1 })
}

fn match_steps(
    feature: &Path,
    bindings: &Path,
    options: &ParseOptions,
    missing: MissingStepsOutcome,
) -> Result<i32, GherkinError> {
    let set = BindingSet::load(bindings)?;
    let mut builder = RegistryBuilder::new();
    builder.add_binding_set(set);
    let build = builder.build();
    for diagnostic in &build.diagnostics {
        eprintln!("{diagnostic}");
    }
    let invalid_bindings = build.has_errors();
    let registry = build.registry;

    let tree = parse_file(feature, options)?;
    let pickles = compile_pickles(&tree);
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let (mut bound, mut undefined, mut ambiguous) = (0, 0, 0);
    for pickle in &pickles {
        for step in &pickle.steps {
            let instance = StepInstance::from(step);
            let result = registry.match_step(&instance);
            match &result {
                MatchResult::Bound(_) => bound += 1,
                MatchResult::Undefined => undefined += 1,
                MatchResult::Ambiguous(_) => ambiguous += 1,
            }
            let is_undefined = matches!(result, MatchResult::Undefined);
            match result.into_result(&instance) {
                Ok(found) => output::write_bound(&mut stdout, &instance, &found)?,
                Err(error) => {
                    output::write_unbound(&mut stdout, &error)?;
                    if is_undefined {
                        let snippet = StepSnippet::for_step(&instance).render()?;
                        output::write_snippet(&mut stdout, &snippet)?;
                    }
                }
            }
        }
    }
    output::write_match_summary(&mut stdout, bound, undefined, ambiguous)?;
    debug!(bound, undefined, ambiguous, "matched feature steps");

    let failed = ambiguous > 0
        || invalid_bindings
        || (undefined > 0 && missing == MissingStepsOutcome::Error);
    Ok(if failed { 1 } else { 0 })
}
