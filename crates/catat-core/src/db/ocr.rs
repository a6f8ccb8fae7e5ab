//! Archive of processed document results
//!
//! Document extraction results are archived for review; the merchant turns
//! them into transactions explicitly, never automatically.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{DocumentType, OcrResult, ParsedDocument};

fn row_to_ocr_result(row: &Row<'_>) -> rusqlite::Result<OcrResult> {
    let document_type: String = row.get("document_type")?;
    let parsed_json: String = row.get("parsed")?;
    let created_at: String = row.get("created_at")?;

    // The payload column is written from a ParsedDocument, so a decode
    // failure means the row was tampered with; surface it as a column error
    let parsed: ParsedDocument = serde_json::from_str(&parsed_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(OcrResult {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        document_type: document_type.parse::<DocumentType>().unwrap_or(DocumentType::Receipt),
        raw_text: row.get("raw_text")?,
        parsed,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Archive one document-processing result, returning its id
    pub fn save_ocr_result(
        &self,
        user_id: &str,
        raw_text: &str,
        parsed: &ParsedDocument,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO ocr_results (user_id, document_type, raw_text, parsed)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                user_id,
                parsed.document_type().as_str(),
                raw_text,
                serde_json::to_string(parsed)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get one archived result by id
    pub fn get_ocr_result(&self, id: i64) -> Result<Option<OcrResult>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                "SELECT * FROM ocr_results WHERE id = ?",
                params![id],
                row_to_ocr_result,
            )
            .optional()?;
        Ok(result)
    }

    /// List a user's archived results, newest first
    pub fn list_ocr_results(&self, user_id: &str, limit: i64) -> Result<Vec<OcrResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM ocr_results WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![user_id, limit], row_to_ocr_result)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
