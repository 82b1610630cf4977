//! cosmolink CLI - encode tables for the renderer and inspect the results
//!
//! Command-line interface for cosmolink operations.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use crate::IntNarrowing;

mod basic;

/// cosmolink - Arrow IPC bridge for interactive graph rendering
#[derive(Parser)]
#[command(name = "cosmolink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a CSV, JSON or Parquet table as an Arrow IPC stream
    Encode {
        /// Input file path
        input: PathBuf,
        /// Output file path (defaults to the input with an .arrows extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// How to handle 64-bit integer columns: wrapping, checked or preserve
        #[arg(long, default_value = "wrapping")]
        narrowing: IntNarrowing,
    },
    /// Display the schema and first N rows of an Arrow IPC stream
    Inspect {
        /// Path to the stream file
        path: PathBuf,
        /// Number of rows to display
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },
    /// Validate a widget config file and list the fields it sets
    Config {
        /// Path to the JSON config file
        path: PathBuf,
    },
}

/// Run the cosmolink CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            narrowing,
        } => basic::cmd_encode(&input, output.as_deref(), narrowing),
        Commands::Inspect { path, rows } => basic::cmd_inspect(&path, rows),
        Commands::Config { path } => basic::cmd_config(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
