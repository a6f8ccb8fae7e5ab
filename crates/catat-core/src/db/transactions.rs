//! Transaction operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    NewTransaction, Transaction, TransactionSource, TransactionType, TransactionUpdate,
    UserSummary,
};

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let tx_type: String = row.get("type")?;
    let source: String = row.get("source")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Transaction {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        tx_type: tx_type.parse::<TransactionType>().unwrap_or(TransactionType::Expense),
        amount: row.get("amount")?,
        description: row.get("description")?,
        category: row.get("category")?,
        source: source.parse::<TransactionSource>().unwrap_or(TransactionSource::Manual),
        raw_input: row.get("raw_input")?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// Insert a transaction, returning its new id
    pub fn save_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, type, amount, description, category, source, raw_input)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.user_id,
                tx.tx_type.as_str(),
                tx.amount,
                tx.description,
                tx.category,
                tx.source.as_str(),
                tx.raw_input,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                "SELECT * FROM transactions WHERE id = ?",
                params![id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List a user's transactions, newest first
    pub fn list_transactions_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM transactions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![user_id, limit], row_to_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Apply a partial update to a transaction
    ///
    /// Only the provided fields change; `updated_at` is bumped. Amount and
    /// description updates are re-validated against the same rules the
    /// normalizer enforces.
    pub fn update_transaction(&self, id: i64, update: &TransactionUpdate) -> Result<Transaction> {
        if let Some(amount) = update.amount {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(Error::validation("amount", "must be a positive number"));
            }
        }
        if let Some(ref description) = update.description {
            if description.trim().is_empty() {
                return Err(Error::validation("description", "must not be empty"));
            }
        }
        if let Some(ref category) = update.category {
            if category.trim().is_empty() {
                return Err(Error::validation("category", "must not be empty"));
            }
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE transactions SET
                type = COALESCE(?, type),
                amount = COALESCE(?, amount),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
            params![
                update.tx_type.map(|t| t.as_str()),
                update.amount,
                update.description.as_ref().map(|s| s.trim()),
                update.category.as_ref().map(|s| s.trim()),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }

        self.get_transaction(id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    /// Delete a transaction
    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Aggregate ledger summary for a user
    ///
    /// A user with no records gets a zero-value summary, not an error.
    pub fn user_summary(&self, user_id: &str) -> Result<UserSummary> {
        let conn = self.conn()?;
        let summary = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0) AS income_total,
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0) AS expense_total,
                COUNT(*) AS transaction_count
            FROM transactions WHERE user_id = ?
            "#,
            params![user_id],
            |row| {
                let income_total: f64 = row.get("income_total")?;
                let expense_total: f64 = row.get("expense_total")?;
                Ok(UserSummary {
                    income_total,
                    expense_total,
                    balance: income_total - expense_total,
                    transaction_count: row.get("transaction_count")?,
                })
            },
        )?;
        Ok(summary)
    }
}
