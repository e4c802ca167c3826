//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Chorus - load music-streaming event logs into a star schema
#[derive(Parser, Debug)]
#[command(name = "chorus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from chorus.yml (falls back to CHORUS_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the star schema tables
    Init,

    /// Drop and recreate the star schema tables
    Reset,

    /// Bulk-load raw source files into staging tables
    Stage,

    /// Transform sources and load the star schema
    Run(RunArgs),

    /// Run data-quality checks against the loaded tables
    Check(CheckArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Delete all existing facts before loading
    #[arg(long)]
    pub full_reload: bool,

    /// Override records per source batch
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stop on first failure
    #[arg(long)]
    pub fail_fast: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
