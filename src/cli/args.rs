//! Command-line arguments and subcommands, declared with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "gherkin-bind",
    version,
    about = "Parse Gherkin feature files and bind their steps to step definitions."
)]
pub struct GherkinBindArgs {
    /// Configuration file (JSON or YAML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Default feature-file language; overrides the configuration.
    #[arg(long, global = true)]
    pub language: Option<String>,
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a feature file, or every `.feature` file under a directory, and
    /// report diagnostics.
    Check {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Print the syntax tree of a feature file.
    Tree {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the pickles compiled from a feature file.
    Pickles {
        #[arg(required = true)]
        file: PathBuf,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Tell whether each pattern is a Cucumber Expression or a regex.
    Classify {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Match every step of a feature file against a bindings file.
    Match {
        #[arg(required = true)]
        feature: PathBuf,
        /// Step definitions, hooks and transformations (JSON or YAML).
        #[arg(long, required = true)]
        bindings: PathBuf,
    },
    /// List the languages feature files may be written in.
    Dialects,
}
