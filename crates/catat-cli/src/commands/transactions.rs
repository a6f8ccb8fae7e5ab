//! Transaction listing command

use std::path::Path;

use anyhow::Result;
use catat_core::models::format_rupiah;

use super::open_db;

pub fn cmd_transactions(db_path: &Path, user: &str, limit: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let transactions = db.list_transactions_by_user(user, limit)?;

    if transactions.is_empty() {
        println!("No transactions recorded for {}", user);
        return Ok(());
    }

    println!("Transactions for {} (newest first):", user);
    for tx in &transactions {
        println!(
            "  #{:<5} {}  {:<7} {:>14}  {}  [{}]",
            tx.id,
            tx.created_at.format("%Y-%m-%d %H:%M"),
            tx.tx_type.to_string(),
            format_rupiah(tx.amount),
            tx.description,
            tx.category,
        );
    }

    Ok(())
}
