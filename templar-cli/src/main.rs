//! templar — synchronize a directory of templates with a template server.
//!
//! # Usage
//!
//! ```text
//! templar update <namespace> <directory> [--no-delete] [--server URL] [--token T]
//!                [--header NAME=VALUE]... [--timeout SECS] [--config PATH]
//! templar validate <directory> [--namespace NS]
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{update::UpdateArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templar",
    version,
    about = "Reconcile a namespace's templates on a template server with a local directory",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace a namespace's templates with the templates found in a directory.
    Update(UpdateArgs),

    /// Parse and validate a directory of templates without contacting the server.
    Validate(ValidateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Update(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
