//! Mock backend for testing
//!
//! Provides deterministic responses for all extraction operations.
//! Useful for unit tests and development without a running model server.

use crate::amount::normalize_amount;
use crate::error::{Error, Result};
use crate::models::{
    format_rupiah, BankStatementFields, ContractFields, DocumentType, InvoiceFields, LineItem,
    NewTransaction, ParsedCandidate, ParsedDocument, PurchaseOrderFields, ReceiptFields,
    StatementLine, StockCardFields, StockMovement,
};

use super::types::DocumentExtraction;
use super::{ensure_image_media, ensure_text_input, ExtractionBackend};

/// Keywords that mark an utterance as income
const INCOME_KEYWORDS: &[&str] = &["jual", "terjual", "laku", "pendapatan", "masuk", "dapat"];

/// Leading verbs stripped from the item description
const VERBS: &[&str] = &["jual", "beli", "bayar", "terjual", "dapat", "laku"];

/// Tokens that belong to the amount expression, not the item
const AMOUNT_TOKENS: &[&str] = &[
    "ribu", "rb", "juta", "jt", "miliar", "m", "rupiah", "rp", "ceng", "gopek", "ceban",
];

/// Mock extraction backend for testing
///
/// Classifies income vs expense by keyword, reads the amount with the
/// colloquial normalizer, and reports a fixed configurable confidence.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    confidence: f64,
    document_type: Option<DocumentType>,
    transcript: String,
    fail_extraction: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, confidence 0.9)
    pub fn new() -> Self {
        Self {
            healthy: true,
            confidence: 0.9,
            document_type: None,
            transcript: "jual bakso 50 ribu".to_string(),
            fail_extraction: false,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Fail every transaction extraction with a malformed response
    ///
    /// Used to exercise cross-provider fallback paths.
    pub fn failing_extraction(mut self) -> Self {
        self.fail_extraction = true;
        self
    }

    /// Report this confidence from every extraction
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Classify every document image as this category
    pub fn classifying_as(mut self, document_type: DocumentType) -> Self {
        self.document_type = Some(document_type);
        self
    }

    /// Transcribe every voice note to this text
    pub fn with_transcript(mut self, transcript: &str) -> Self {
        self.transcript = transcript.to_string();
        self
    }

    fn item_words(text: &str) -> Vec<&str> {
        text.split_whitespace()
            .filter(|word| {
                let lower = word.to_lowercase();
                !VERBS.contains(&lower.as_str())
                    && !AMOUNT_TOKENS.contains(&lower.as_str())
                    && !lower.chars().any(|c| c.is_ascii_digit())
            })
            .collect()
    }

    fn expense_category(item: &str) -> &'static str {
        let lower = item.to_lowercase();
        if lower.contains("bensin") || lower.contains("ojek") || lower.contains("parkir") {
            "Transportasi"
        } else if lower.contains("gaji") {
            "Gaji Karyawan"
        } else if lower.contains("listrik") || lower.contains("air") {
            "Listrik & Air"
        } else if lower.contains("gas") || lower.contains("beras") || lower.contains("gula") {
            "Bahan Baku"
        } else {
            "Lainnya"
        }
    }
}

#[async_trait::async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract_transaction(&self, text: &str) -> Result<ParsedCandidate> {
        ensure_text_input(text)?;

        if self.fail_extraction {
            return Err(Error::MalformedResponse("mock extraction failure".into()));
        }

        let lower = text.to_lowercase();
        let is_income = INCOME_KEYWORDS.iter().any(|k| lower.contains(k));

        let amount = normalize_amount(text);
        if amount <= 0.0 {
            // Mirrors the real backends: an amountless utterance is an
            // extraction failure, not a zero-value candidate.
            return Err(Error::InvalidAmount(amount));
        }

        let item = Self::item_words(text).join(" ");
        let (tx_type, description, category) = if is_income {
            (
                "income",
                if item.is_empty() {
                    "Pendapatan".to_string()
                } else {
                    format!("Penjualan {}", item)
                },
                "Penjualan Produk".to_string(),
            )
        } else {
            (
                "expense",
                if item.is_empty() {
                    "Pengeluaran".to_string()
                } else {
                    format!("Pembelian {}", item)
                },
                Self::expense_category(&item).to_string(),
            )
        };

        Ok(ParsedCandidate {
            tx_type: tx_type.to_string(),
            amount,
            description,
            category,
            confidence: self.confidence,
        })
    }

    async fn extract_document(
        &self,
        image: &[u8],
        content_type: &str,
        document_type: DocumentType,
    ) -> Result<DocumentExtraction> {
        ensure_image_media(content_type, image.len())?;

        let parsed = match document_type {
            DocumentType::Invoice => ParsedDocument::Invoice(InvoiceFields {
                vendor: Some("PT Maju Jaya".into()),
                invoice_number: Some("INV-2024-001".into()),
                date: Some("2024-03-01".into()),
                due_date: Some("2024-03-31".into()),
                items: vec![LineItem {
                    name: "Tepung terigu 25kg".into(),
                    quantity: Some(4.0),
                    price: Some(62_500.0),
                }],
                total: Some(250_000.0),
            }),
            DocumentType::PurchaseOrder => ParsedDocument::PurchaseOrder(PurchaseOrderFields {
                supplier: Some("CV Sumber Pangan".into()),
                po_number: Some("PO-0042".into()),
                date: Some("2024-03-05".into()),
                items: vec![LineItem {
                    name: "Minyak goreng 1L".into(),
                    quantity: Some(24.0),
                    price: Some(17_000.0),
                }],
                total: Some(408_000.0),
            }),
            DocumentType::BankStatement => ParsedDocument::BankStatement(BankStatementFields {
                bank_name: Some("Bank Central".into()),
                period: Some("2024-02".into()),
                opening_balance: Some(1_000_000.0),
                closing_balance: Some(1_350_000.0),
                transactions: vec![StatementLine {
                    date: Some("2024-02-14".into()),
                    description: "Setoran tunai".into(),
                    amount: 350_000.0,
                }],
            }),
            DocumentType::StockCard => ParsedDocument::StockCard(StockCardFields {
                item_name: Some("Gula pasir".into()),
                period: Some("2024-02".into()),
                movements: vec![StockMovement {
                    date: Some("2024-02-10".into()),
                    direction: "in".into(),
                    quantity: 50.0,
                }],
            }),
            DocumentType::Contract => ParsedDocument::Contract(ContractFields {
                parties: vec!["Warung Bu Sri".into(), "PT Maju Jaya".into()],
                date: Some("2024-01-15".into()),
                subject: Some("Kontrak pasokan tepung".into()),
                value: Some(3_000_000.0),
            }),
            DocumentType::Receipt | DocumentType::Auto => ParsedDocument::Receipt(ReceiptFields {
                store_name: Some("Toko Sumber Rejeki".into()),
                date: Some("2024-03-15".into()),
                items: vec![
                    LineItem {
                        name: "Indomie goreng".into(),
                        quantity: Some(2.0),
                        price: Some(3_500.0),
                    },
                    LineItem {
                        name: "Teh botol".into(),
                        quantity: Some(1.0),
                        price: Some(5_000.0),
                    },
                ],
                total: Some(12_000.0),
            }),
        };

        Ok(DocumentExtraction {
            raw_text: format!("mock {} text", document_type),
            parsed,
        })
    }

    async fn classify_document(&self, image: &[u8], content_type: &str) -> Result<DocumentType> {
        ensure_image_media(content_type, image.len())?;
        Ok(self.document_type.unwrap_or(DocumentType::Receipt))
    }

    async fn transcribe_audio(&self, _audio: &[u8], content_type: &str) -> Result<String> {
        if !content_type.starts_with("audio/") {
            return Err(Error::InvalidMedia(format!(
                "unsupported content type '{}'",
                content_type
            )));
        }
        Ok(self.transcript.clone())
    }

    async fn summarize_transaction(&self, tx: &NewTransaction) -> Result<String> {
        Ok(format!(
            "Siap! {} sebesar {} ({}) sudah dicatat.",
            tx.description,
            format_rupiah(tx.amount),
            tx.category
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_income_utterance() {
        let mock = MockBackend::new();
        let candidate = mock.extract_transaction("jual bakso 50 ribu").await.unwrap();
        assert_eq!(candidate.tx_type, "income");
        assert_eq!(candidate.amount, 50_000.0);
        assert_eq!(candidate.description, "Penjualan bakso");
        assert_eq!(candidate.category, "Penjualan Produk");
        assert_eq!(candidate.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_expense_utterance() {
        let mock = MockBackend::new();
        let candidate = mock.extract_transaction("beli gas 22 ribu").await.unwrap();
        assert_eq!(candidate.tx_type, "expense");
        assert_eq!(candidate.amount, 22_000.0);
        assert_eq!(candidate.description, "Pembelian gas");
        assert_eq!(candidate.category, "Bahan Baku");
    }

    #[tokio::test]
    async fn test_amountless_utterance_fails() {
        let mock = MockBackend::new();
        assert!(matches!(
            mock.extract_transaction("halo apa kabar").await,
            Err(Error::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_confidence() {
        let mock = MockBackend::new().with_confidence(0.4);
        let candidate = mock.extract_transaction("jual es teh 5 ribu").await.unwrap();
        assert_eq!(candidate.confidence, 0.4);
    }

    #[tokio::test]
    async fn test_classify_default_and_override() {
        let mock = MockBackend::new();
        assert_eq!(
            mock.classify_document(b"img", "image/jpeg").await.unwrap(),
            DocumentType::Receipt
        );

        let mock = MockBackend::new().classifying_as(DocumentType::Invoice);
        assert_eq!(
            mock.classify_document(b"img", "image/jpeg").await.unwrap(),
            DocumentType::Invoice
        );
    }

    #[tokio::test]
    async fn test_extract_document_variant_matches_request() {
        let mock = MockBackend::new();
        let extraction = mock
            .extract_document(b"img", "image/png", DocumentType::BankStatement)
            .await
            .unwrap();
        assert!(matches!(extraction.parsed, ParsedDocument::BankStatement(_)));
    }

    #[tokio::test]
    async fn test_transcribe_audio() {
        let mock = MockBackend::new().with_transcript("beli gula 10 ribu");
        let text = mock.transcribe_audio(b"OggS", "audio/ogg").await.unwrap();
        assert_eq!(text, "beli gula 10 ribu");
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
