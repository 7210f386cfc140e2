//! ginx: validate and render HTML template trees.
//!
//! # Usage
//!
//! ```text
//! ginx check <root> [--config FILE] [--ext EXT]... [--json]
//! ginx render <root> <name> [--data FILE] [--config FILE] [--ext EXT]...
//! ginx -v ...        # raise log verbosity (repeatable); RUST_LOG also works
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, render::RenderArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ginx",
    version,
    about = "Load, validate and render HTML template trees",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a template tree and list every registered template name.
    Check(CheckArgs),

    /// Render one template to stdout.
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(default);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Render(args) => args.run(),
    }
}
