//! catat CLI - Multi-channel bookkeeping assistant
//!
//! Usage:
//!   catat init                       Initialize database
//!   catat parse "jual bakso 50 ribu" Parse a transaction from text
//!   catat serve --port 3000          Start web server
//!   catat status                     Show database and backend status
//!   catat transactions               List recent transactions

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Parse { text, save, user } => {
            commands::cmd_parse(&cli.db, &text, save, &user).await
        }
        Commands::Serve { port, host, no_auth } => {
            commands::cmd_serve(&cli.db, &host, port, no_auth).await
        }
        Commands::Status => commands::cmd_status(&cli.db).await,
        Commands::Transactions { user, limit } => commands::cmd_transactions(&cli.db, &user, limit),
    }
}
