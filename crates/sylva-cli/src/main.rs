//! Sylva command-line tool
//!
//! Loads compiled assembly documents and reports on the result: load
//! diagnostics, the type table, and decoded GC header words.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use sylva_engine::LoaderConfig;
use sylva_runtime::RuntimeOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sylva")]
#[command(about = "Sylva assembly inspection tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log loader phases (overrides SYLVA_LOG with `debug`)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Loader flags shared by commands that read an assembly.
#[derive(Args, Debug, Clone)]
struct LoadArgs {
    /// Assembly JSON file
    file: PathBuf,
    /// Skip mask coverage checks
    #[arg(long)]
    no_verify_masks: bool,
    /// Drop source texts after loading
    #[arg(long)]
    no_sources: bool,
    /// Largest accepted global buffer in bytes
    #[arg(long)]
    max_global_buffer: Option<usize>,
}

impl LoadArgs {
    fn options(&self) -> RuntimeOptions {
        let mut loader = LoaderConfig::new()
            .with_verify_masks(!self.no_verify_masks)
            .with_retain_sources(!self.no_sources);
        if let Some(bytes) = self.max_global_buffer {
            loader = loader.with_max_global_buffer(bytes);
        }
        RuntimeOptions {
            loader,
            defer_constants: true,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load an assembly and report what it contains
    Check {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Print the type table of an assembly
    Types {
        #[command(flatten)]
        load: LoadArgs,
        /// Also list interned names that have no descriptor
        #[arg(long)]
        all: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Decode a raw 64-bit GC header word (decimal or 0x-prefixed hex)
    Header {
        /// Header value
        value: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SYLVA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Check { load } => commands::check::execute(&load.file, load.options())?,
        Commands::Types { load, all, json } => {
            commands::types::execute(&load.file, load.options(), all, json)?
        }
        Commands::Header { value } => commands::header::execute(&value)?,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
