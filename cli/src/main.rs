#![deny(missing_docs)]

//! # Routedoc CLI
//!
//! Command Line Interface for building Swagger 2.0 documents out of route
//! manifests.
//!
//! Supported Commands:
//! - `build`: Manifest (YAML/JSON) -> validated Swagger document.
//!
//! Diagnostics go to stderr; `RUST_LOG` overrides the `-v` level.

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliResult;

mod build;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Swagger 2.0 documents from route manifests")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug).
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds and validates a document from a manifest.
    Build(build::BuildArgs),
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Build(args) => build::execute(args)?,
    }

    Ok(())
}
