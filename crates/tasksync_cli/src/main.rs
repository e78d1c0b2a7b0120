//! tasksync CLI
//!
//! Command-line tools for running and inspecting tasksync collections.
//!
//! # Commands
//!
//! - `sync` - Apply a journal file to a local store
//! - `inspect` - Display the records and marker of a local store

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// tasksync command-line tools.
#[derive(Parser)]
#[command(name = "tasksync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store directory
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync session from a journal file into the store
    Sync {
        /// Journal file (JSON) describing the collection and its changes
        #[arg(short, long)]
        journal: PathBuf,

        /// Record domain (tasks, contacts)
        #[arg(short, long, default_value = "tasks")]
        domain: String,

        /// Records fetched per batch
        #[arg(short, long, default_value = "50")]
        batch_size: u32,

        /// Attempts for retryable failures
        #[arg(short, long, default_value = "1")]
        attempts: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display the records and sync marker of a store
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync {
            journal,
            domain,
            batch_size,
            attempts,
            format,
        } => {
            let store = cli.store.ok_or("Store path required for sync")?;
            let options = commands::sync::SyncOptions {
                domain,
                batch_size,
                attempts,
                format,
            };
            commands::sync::run(&store, &journal, &options)?;
        }
        Commands::Inspect { format } => {
            let store = cli.store.ok_or("Store path required for inspect")?;
            commands::inspect::run(&store, &format)?;
        }
        Commands::Version => {
            println!("tasksync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
