use std::error::Error;
use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use serde::Serialize;
use syst_table::serde::to_canonical_json_bytes;
use tracing_subscriber::EnvFilter;

use commands::{
    run::{self, RunArgs},
    sources::{self, SourcesArgs},
    version::{self, VersionArgs},
};

mod commands;
mod config;
mod engine;
mod events;
mod hash;

#[derive(Parser, Debug)]
#[command(name = "syst-run", about = "Systematic momentum variations for jets and leptons")]
struct Cli {
    /// Log filter used when RUST_LOG is unset, e.g. `info` or `syst_jet=debug`.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct every event of an input file and write the variation matrices.
    Run(RunArgs),
    /// Print the uncertainty sources a configuration resolves to.
    Sources(SourcesArgs),
    /// Print version information.
    Version(VersionArgs),
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Sources(args) => sources::run(&args),
        Command::Version(args) => version::run(&args),
    }
}

pub(crate) fn write_json<T: Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    let bytes = to_canonical_json_bytes(value).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    fs::write(path, bytes)?;
    Ok(())
}
