//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// catat - Bookkeeping assistant for small merchants
#[derive(Parser)]
#[command(name = "catat")]
#[command(about = "Multi-channel bookkeeping assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "catat.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Parse a free-text transaction from the command line
    Parse {
        /// The utterance to parse, e.g. "jual bakso 50 ribu"
        text: String,

        /// Persist the transaction when the confidence gate clears
        #[arg(long)]
        save: bool,

        /// Owning user id
        #[arg(short, long, default_value = "local-dev")]
        user: String,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default the server requires an API key from
        /// CATAT_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },

    /// Show database and backend status
    Status,

    /// List recent transactions
    Transactions {
        /// Owning user id
        #[arg(short, long, default_value = "local-dev")]
        user: String,

        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}
