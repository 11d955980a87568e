use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::constants::{DEFAULT_DATABASE, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "stockwatch")]
#[command(about = "Stock price and insider trade tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape prices and insider trades for the tickers in a file
    Ingest {
        /// Path to a file with one ticker symbol per line
        path: PathBuf,
        /// Maximum number of concurrent scrape tasks
        #[arg(short, long)]
        max_workers: Option<usize>,
        /// Path to the SQLite database file
        #[arg(short, long, default_value = DEFAULT_DATABASE)]
        database: PathBuf,
    },
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Path to the SQLite database file
        #[arg(short, long, default_value = DEFAULT_DATABASE)]
        database: PathBuf,
    },
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            path,
            max_workers,
            database,
        } => {
            commands::ingest::run(path, max_workers, database);
        }
        Commands::Serve { port, database } => {
            commands::serve::run(port, database);
        }
    }
}
