//! Graft CLI - lay out git history as a commit graph.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod services;

use commands::{Cli, Commands};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "GRAFT_LOG";

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    output::set_quiet(cli.quiet);

    let result = match cli.command {
        Commands::Layout(args) => commands::layout::run(&args),
        Commands::Color(args) => commands::color::run(&args),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `GRAFT_LOG` or by the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
