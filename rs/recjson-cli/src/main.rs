//! recjson CLI
//!
//! Inspects C struct layouts and round-trips record files through them.
//!
//! # Commands
//!
//! - `check`: Validate layouts and summarize their types
//! - `order`: Print record types in dependency order
//! - `roundtrip`: Decode a record file, re-encode it and verify the result
//! - `run`: Execute every job of a TOML job file

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod config;

/// Schema-driven JSON tooling for fixed-layout records
#[derive(Parser)]
#[command(name = "recjson")]
#[command(version)]
#[command(about = "Schema-driven JSON tooling for fixed-layout records")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate layout files and summarize their record and enum types
    Check(commands::LayoutArgs),
    /// Print the record types reachable from the roots, dependencies first
    Order(commands::LayoutArgs),
    /// Decode a record file, encode it again and verify both decodes agree
    ///
    /// The re-encoded JSON is written to stdout.
    Roundtrip(commands::roundtrip::RoundtripArgs),
    /// Run all jobs of a TOML job file
    Run(commands::run::RunArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check(args) => commands::check::handle_check(args),
        Commands::Order(args) => commands::order::handle_order(args),
        Commands::Roundtrip(args) => commands::roundtrip::handle_roundtrip(args),
        Commands::Run(args) => commands::run::handle_run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
