//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_parse` - One-shot transaction parse
//! - `cmd_status` - Database and backend status

use std::path::Path;

use anyhow::{Context, Result};
use catat_core::ai::{ExtractionBackend, ExtractionClient};
use catat_core::channels::VoiceAdapter;
use catat_core::config::ChannelConfig;
use catat_core::db::Database;
use catat_core::policy::CommitPolicy;

/// Open the database at the given path
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path.to_str().context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Parse a transaction: catat parse \"jual bakso 50 ribu\" --save");
    println!("  2. Start the server: catat serve");

    Ok(())
}

pub async fn cmd_parse(db_path: &Path, text: &str, save: bool, user: &str) -> Result<()> {
    let db = open_db(db_path)?;

    let client = ExtractionClient::from_env()
        .context("Extraction backend not configured (set OLLAMA_HOST, or EXTRACTION_BACKEND=mock)")?;

    let config = ChannelConfig::load()?;
    let policy = CommitPolicy::new(config.voice.auto_commit_threshold);
    let adapter = VoiceAdapter::new(&db, &client, policy);

    let outcome = adapter.process(user, text, save).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !save {
        println!();
        println!("💡 Re-run with --save to persist when confidence clears the gate");
    }

    Ok(())
}

pub async fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    println!("📊 catat status");
    println!("   Database: {}", db.path());

    let summary = db.user_summary("local-dev")?;
    println!(
        "   local-dev ledger: {} transactions, balance {}",
        summary.transaction_count,
        catat_core::models::format_rupiah(summary.balance)
    );

    match ExtractionClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                println!("   ✅ Extraction backend: {} ({})", client.host(), client.model());
            } else {
                println!(
                    "   ⚠️  Extraction backend configured but not responding: {}",
                    client.host()
                );
            }
        }
        None => println!("   ℹ️  Extraction backend not configured (set OLLAMA_HOST)"),
    }

    Ok(())
}
