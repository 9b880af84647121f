//! CLI command definitions and implementations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod color;
pub mod completions;
pub mod layout;
mod utils;

/// Graft - lay out git history as a commit graph.
#[derive(Debug, Parser)]
#[command(name = "graft", version)]
#[command(propagate_version = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging on stderr (`GRAFT_LOG` overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lay out the commit graph of the current repository.
    Layout(LayoutArgs),

    /// Show the color a branch name is drawn with.
    Color(ColorArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct LayoutArgs {
    /// Output the layout as JSON.
    #[arg(long)]
    pub json: bool,

    /// Lay out at most this many commits.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Commits read per page (defaults to `layout.page_size`).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: Option<u64>,

    /// Config file (defaults to `<git dir>/graft.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ColorArgs {
    /// Branch name, e.g. `feature/login` or `origin/main`.
    pub name: String,

    /// Output the color as JSON.
    #[arg(long)]
    pub json: bool,

    /// Extra remote name to strip from the branch name (repeatable).
    #[arg(long = "remote")]
    pub remotes: Vec<String>,

    /// Config file (defaults to `<git dir>/graft.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
}
