//! # tessera CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tessera_cli::check::{run_check, CheckArgs};
use tessera_cli::load::{run_load, LoadArgs};
use tessera_cli::render::{run_render, RenderArgs};

/// Tessera — schema-typed loading and rendering.
///
/// Compiles schema descriptors, coerces raw documents through named types,
/// and renders documents through media type views.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Without it, `RUST_LOG` controls logging.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a descriptor and list its types and media types.
    Check(CheckArgs),

    /// Coerce and validate a document against a named type.
    Load(LoadArgs),

    /// Render a document through a media type view.
    Render(RenderArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::from_default_env(),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::Check(args) => run_check(args, &mut out),
        Commands::Load(args) => run_load(args, &mut out),
        Commands::Render(args) => run_render(args, &mut out),
    };

    match tessera_cli::finish(result, out.flush()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
