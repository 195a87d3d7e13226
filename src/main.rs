use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gherkin_bind::cli::{self, GherkinBindArgs};

fn init_tracing(verbose: bool) {
    let default = if verbose { "gherkin_bind=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = GherkinBindArgs::parse();
    init_tracing(args.verbose);
    process::exit(cli::execute(args));
}
