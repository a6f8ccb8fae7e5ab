//! OCR channel adapter
//!
//! Takes a document image plus an optional requested category, classifies
//! when the caller asked for `auto`, extracts with the resolved category's
//! template, and archives the result. The result is not turned into a
//! transaction automatically; the merchant reviews and saves explicitly.

use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::{ensure_image_media, ExtractionBackend, ExtractionClient};
use crate::config::OcrConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{DocumentType, OcrResult};

/// Fixed backoff between vision attempts
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// OCR channel front-end
pub struct OcrAdapter<'a> {
    db: &'a Database,
    client: &'a ExtractionClient,
    config: &'a OcrConfig,
}

impl<'a> OcrAdapter<'a> {
    pub fn new(db: &'a Database, client: &'a ExtractionClient, config: &'a OcrConfig) -> Self {
        Self { db, client, config }
    }

    /// Process one document image under the channel's wall-clock ceiling
    ///
    /// After the ceiling the request is a `Timeout`; no partial state is
    /// kept.
    pub async fn process(
        &self,
        user_id: &str,
        image: &[u8],
        content_type: &str,
        requested: DocumentType,
    ) -> Result<OcrResult> {
        ensure_image_media(content_type, image.len())?;

        tokio::time::timeout(
            self.config.timeout(),
            self.process_inner(user_id, image, content_type, requested),
        )
        .await
        .map_err(|_| Error::Timeout)?
    }

    async fn process_inner(
        &self,
        user_id: &str,
        image: &[u8],
        content_type: &str,
        requested: DocumentType,
    ) -> Result<OcrResult> {
        let resolved = match requested {
            DocumentType::Auto => {
                let resolved = self.client.classify_document(image, content_type).await?;
                debug!(document_type = %resolved, "Classified document");
                resolved
            }
            concrete => concrete,
        };

        let extraction = self.extract_with_retry(image, content_type, resolved).await?;

        let id = self
            .db
            .save_ocr_result(user_id, &extraction.raw_text, &extraction.parsed)?;
        self.db
            .get_ocr_result(id)?
            .ok_or_else(|| Error::NotFound(format!("ocr result {}", id)))
    }

    /// Vision extraction with a capped attempt count
    ///
    /// Only transient failures are retried; validation and malformed-response
    /// errors surface immediately.
    async fn extract_with_retry(
        &self,
        image: &[u8],
        content_type: &str,
        document_type: DocumentType,
    ) -> Result<crate::ai::DocumentExtraction> {
        let attempts = self.config.vision_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.client.extract_document(image, content_type, document_type).await {
                Ok(extraction) => return Ok(extraction),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(attempt, error = %e, "Vision extraction failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // Unreachable with attempts >= 1; kept for the type checker
        Err(last_error.unwrap_or(Error::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::ParsedDocument;

    fn config() -> OcrConfig {
        OcrConfig::default()
    }

    #[tokio::test]
    async fn test_auto_resolves_via_classifier() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::Mock(MockBackend::new().classifying_as(DocumentType::Invoice));
        let cfg = config();
        let adapter = OcrAdapter::new(&db, &client, &cfg);

        let result = adapter
            .process("u1", b"fake-image", "image/jpeg", DocumentType::Auto)
            .await
            .unwrap();

        // The resolved category wins regardless of the requested sentinel
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert!(matches!(result.parsed, ParsedDocument::Invoice(_)));
    }

    #[tokio::test]
    async fn test_pinned_type_skips_classifier() {
        let db = Database::in_memory().unwrap();
        // Classifier would say invoice, but the caller pinned bank_statement
        let client = ExtractionClient::Mock(MockBackend::new().classifying_as(DocumentType::Invoice));
        let cfg = config();
        let adapter = OcrAdapter::new(&db, &client, &cfg);

        let result = adapter
            .process("u1", b"fake-image", "image/jpeg", DocumentType::BankStatement)
            .await
            .unwrap();
        assert_eq!(result.document_type, DocumentType::BankStatement);
    }

    #[tokio::test]
    async fn test_result_is_archived() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::mock();
        let cfg = config();
        let adapter = OcrAdapter::new(&db, &client, &cfg);

        let result = adapter
            .process("u1", b"fake-image", "image/png", DocumentType::Receipt)
            .await
            .unwrap();

        let archived = db.get_ocr_result(result.id).unwrap().unwrap();
        assert_eq!(archived.document_type, DocumentType::Receipt);
        // No transaction is created from OCR output
        assert!(db.list_transactions_by_user("u1", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_media_rejected() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::mock();
        let cfg = config();
        let adapter = OcrAdapter::new(&db, &client, &cfg);

        let result = adapter
            .process("u1", b"%PDF-1.4", "application/pdf", DocumentType::Auto)
            .await;
        assert!(matches!(result, Err(Error::InvalidMedia(_))));
    }
}
