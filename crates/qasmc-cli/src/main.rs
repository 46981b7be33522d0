//! qasmc Command-Line Interface
//!
//! Compiles `OpenQASM` 2.0 programs into flat circuits and renders them as a
//! table, JSON or normalized QASM.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::compile::OutputFormat;
use commands::{compile, library, tokens};

/// qasmc - OpenQASM 2.0 compiler
#[derive(Parser)]
#[command(name = "qasmc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program into a flat circuit
    Compile {
        /// Input file
        input: PathBuf,

        /// Additional include directories, searched after the input file's directory
        #[arg(
            short = 'I',
            long = "include-dir",
            env = "QASMC_INCLUDE_PATH",
            value_delimiter = ':'
        )]
        include_dirs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum include nesting depth
        #[arg(long, default_value_t = qasmc::options::DEFAULT_MAX_INCLUDE_DEPTH)]
        max_include_depth: usize,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Load the extended gate table for `include "qelib1.inc"`
        #[arg(long)]
        extended_library: bool,
    },

    /// Print the token stream of a file
    Tokens {
        /// Input file
        input: PathBuf,
    },

    /// List the gates of the standard library
    Library {
        /// Show the extended gate table
        #[arg(long)]
        extended_library: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            include_dirs,
            format,
            output,
            max_include_depth,
            strict,
            extended_library,
        } => compile::execute(
            &input,
            &include_dirs,
            format,
            output.as_deref(),
            max_include_depth,
            strict,
            extended_library,
        ),

        Commands::Tokens { input } => tokens::execute(&input),

        Commands::Library { extended_library } => {
            library::execute(extended_library);
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
