//! Principals and WhatsApp identity linkage
//!
//! WhatsApp-only senders get a deterministic pseudo-user derived from the
//! sender address, so records are never orphaned. Linking a real account
//! merges that shadow identity: every transaction recorded under the
//! pseudo-user is re-keyed to the linked account.

use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::User;

/// Derive the deterministic pseudo-user id for a WhatsApp sender address
///
/// Repeated messages from the same number always map to the same id.
pub fn synthetic_user_id(address: &str) -> String {
    let digest = Sha256::digest(address.trim().to_lowercase().as_bytes());
    format!("wa-{}", &hex::encode(digest)[..16])
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get("created_at")?;
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        whatsapp_address: row.get("whatsapp_address")?,
        first_contact_seen: row.get("first_contact_seen")?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Create a regular account with an email (registration is external;
    /// this is the hook the rest of the system calls)
    pub fn create_user(&self, id: &str, email: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, email) VALUES (?, ?)",
            params![id, email],
        )?;
        Ok(())
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row("SELECT * FROM users WHERE id = ?", params![id], row_to_user)
            .optional()?;
        Ok(user)
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT * FROM users WHERE email = ? COLLATE NOCASE",
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Resolve the owning user id for a WhatsApp sender address
    ///
    /// Returns the linked account if one exists; otherwise creates (or
    /// reuses) the deterministic pseudo-user so data is not lost for
    /// unlinked senders.
    pub fn resolve_whatsapp_user(&self, address: &str) -> Result<String> {
        let conn = self.conn()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE whatsapp_address = ?",
                params![address],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = synthetic_user_id(address);
        conn.execute(
            "INSERT OR IGNORE INTO users (id, whatsapp_address) VALUES (?, ?)",
            params![id, address],
        )?;
        Ok(id)
    }

    /// Link a WhatsApp sender address to the account registered under
    /// `email`, merging the sender's shadow identity
    ///
    /// Re-keys all transactions from the pseudo-user to the account and
    /// deletes the shadow user row, all in one SQL transaction. Returns the
    /// linked account id, or None when no account has that email (a polite
    /// failure, not an error).
    pub fn link_whatsapp_user(&self, address: &str, email: &str) -> Result<Option<String>> {
        let account = match self.get_user_by_email(email)? {
            Some(user) => user,
            None => return Ok(None),
        };

        let shadow_id = synthetic_user_id(address);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Carry the first-contact flag over so the account is not re-welcomed
        let shadow_seen: Option<bool> = tx
            .query_row(
                "SELECT first_contact_seen FROM users WHERE id = ? AND whatsapp_address = ?",
                params![shadow_id, address],
                |row| row.get(0),
            )
            .optional()?;

        let moved = tx.execute(
            "UPDATE transactions SET user_id = ? WHERE user_id = ?",
            params![account.id, shadow_id],
        )?;
        tx.execute(
            "UPDATE ocr_results SET user_id = ? WHERE user_id = ?",
            params![account.id, shadow_id],
        )?;
        tx.execute(
            "DELETE FROM users WHERE id = ? AND whatsapp_address = ?",
            params![shadow_id, address],
        )?;
        tx.execute(
            "UPDATE users SET whatsapp_address = ?, first_contact_seen = MAX(first_contact_seen, ?) WHERE id = ?",
            params![address, shadow_seen.unwrap_or(false), account.id],
        )?;

        tx.commit()?;

        info!(
            account = %account.id,
            moved,
            "Linked WhatsApp sender and merged shadow identity"
        );
        Ok(Some(account.id))
    }

    /// Whether a sender has been seen before (durable first-contact flag)
    pub fn sender_seen(&self, address: &str) -> Result<bool> {
        let conn = self.conn()?;
        let seen: Option<bool> = conn
            .query_row(
                "SELECT first_contact_seen FROM users WHERE whatsapp_address = ?",
                params![address],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seen.unwrap_or(false))
    }

    /// Mark a sender as seen, creating the pseudo-user row if needed
    pub fn mark_sender_seen(&self, address: &str) -> Result<()> {
        self.resolve_whatsapp_user(address)?;
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET first_contact_seen = 1 WHERE whatsapp_address = ?",
            params![address],
        )?;
        Ok(())
    }
}
