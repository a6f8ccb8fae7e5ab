//! Domain models for catat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction provenance - which channel produced it
///
/// Immutable after creation; retained for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    Voice,
    Manual,
    Ocr,
    Whatsapp,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Manual => "manual",
            Self::Ocr => "ocr",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "voice" => Ok(Self::Voice),
            "manual" => Ok(Self::Manual),
            "ocr" => Ok(Self::Ocr),
            "whatsapp" => Ok(Self::Whatsapp),
            _ => Err(format!("Unknown transaction source: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A committed financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Owning principal. WhatsApp-only senders get a deterministic
    /// pseudo-user id until they link a real account.
    pub user_id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Rupiah, whole units. Always positive; direction is `tx_type`.
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub source: TransactionSource,
    /// Original utterance/transcript/OCR text, retained for audit
    pub raw_input: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated transaction ready for insertion
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub tx_type: TransactionType,
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub source: TransactionSource,
    pub raw_input: Option<String>,
}

/// Partial update for a committed transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    #[serde(rename = "type")]
    pub tx_type: Option<TransactionType>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// An unvalidated transaction guess produced by the extraction step
///
/// Ephemeral: either becomes a `Transaction` via the normalizer and
/// auto-commit policy, or is returned to the caller for manual review.
/// `tx_type` stays a raw string here so the normalizer can reject values
/// the extraction capability should not have produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCandidate {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    /// Extraction self-estimate in [0, 1]
    pub confidence: f64,
}

/// Categories of photographed financial documents
///
/// `Auto` is a request-side sentinel only: the classifier always resolves
/// it to one of the six concrete categories before extraction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Auto,
    Receipt,
    Invoice,
    PurchaseOrder,
    BankStatement,
    StockCard,
    Contract,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Receipt => "receipt",
            Self::Invoice => "invoice",
            Self::PurchaseOrder => "purchase_order",
            Self::BankStatement => "bank_statement",
            Self::StockCard => "stock_card",
            Self::Contract => "contract",
        }
    }

    /// The six concrete categories (excludes the `Auto` sentinel)
    pub fn concrete() -> &'static [DocumentType] {
        &[
            Self::Receipt,
            Self::Invoice,
            Self::PurchaseOrder,
            Self::BankStatement,
            Self::StockCard,
            Self::Contract,
        ]
    }

    /// Resolve a classifier reply to a concrete category
    ///
    /// Lower-cases and trims the reply; anything outside the six valid
    /// categories (including "auto") falls back to `Receipt`. Documented
    /// fallback policy, not an error.
    pub fn from_reply(reply: &str) -> DocumentType {
        let cleaned = reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '.' || c == '\'')
            .to_lowercase();
        match cleaned.as_str() {
            "receipt" => Self::Receipt,
            "invoice" => Self::Invoice,
            "purchase_order" => Self::PurchaseOrder,
            "bank_statement" => Self::BankStatement,
            "stock_card" => Self::StockCard,
            "contract" => Self::Contract,
            _ => Self::Receipt,
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "receipt" => Ok(Self::Receipt),
            "invoice" => Ok(Self::Invoice),
            "purchase_order" => Ok(Self::PurchaseOrder),
            "bank_statement" => Ok(Self::BankStatement),
            "stock_card" => Ok(Self::StockCard),
            "contract" => Ok(Self::Contract),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line item on a receipt, invoice, or purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// One row of a bank statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    #[serde(default)]
    pub date: Option<String>,
    pub description: String,
    pub amount: f64,
}

/// One movement on a stock card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    #[serde(default)]
    pub date: Option<String>,
    /// "in" or "out"
    pub direction: String,
    pub quantity: f64,
}

/// Fields extracted from a receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptFields {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Fields extracted from an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Fields extracted from a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderFields {
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Fields extracted from a bank statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatementFields {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub opening_balance: Option<f64>,
    #[serde(default)]
    pub closing_balance: Option<f64>,
    #[serde(default)]
    pub transactions: Vec<StatementLine>,
}

/// Fields extracted from a stock card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCardFields {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub movements: Vec<StockMovement>,
}

/// Fields extracted from a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFields {
    #[serde(default)]
    pub parties: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Structured payload of a processed document, tagged by category
///
/// Constructed only by the classifier+extractor pair, so the variant
/// always matches the resolved document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum ParsedDocument {
    Receipt(ReceiptFields),
    Invoice(InvoiceFields),
    PurchaseOrder(PurchaseOrderFields),
    BankStatement(BankStatementFields),
    StockCard(StockCardFields),
    Contract(ContractFields),
}

impl ParsedDocument {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Receipt(_) => DocumentType::Receipt,
            Self::Invoice(_) => DocumentType::Invoice,
            Self::PurchaseOrder(_) => DocumentType::PurchaseOrder,
            Self::BankStatement(_) => DocumentType::BankStatement,
            Self::StockCard(_) => DocumentType::StockCard,
            Self::Contract(_) => DocumentType::Contract,
        }
    }
}

/// Archived result of one document-processing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub id: i64,
    pub user_id: String,
    pub document_type: DocumentType,
    pub raw_text: String,
    pub parsed: ParsedDocument,
    pub created_at: DateTime<Utc>,
}

/// Aggregate ledger summary for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
    pub transaction_count: i64,
}

/// A principal known to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub whatsapp_address: Option<String>,
    /// Durable first-contact flag for the WhatsApp welcome message
    pub first_contact_seen: bool,
    pub created_at: DateTime<Utc>,
}

/// Suggested expense categories
///
/// Advisory vocabulary; the normalizer does not enforce a closed set.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Bahan Baku",
    "Gaji Karyawan",
    "Sewa Tempat",
    "Listrik & Air",
    "Transportasi",
    "Pemasaran",
    "Peralatan",
    "Lainnya",
];

/// Suggested income categories
pub const INCOME_CATEGORIES: &[&str] = &[
    "Penjualan Produk",
    "Penjualan Jasa",
    "Komisi",
    "Pendapatan Lain",
];

/// Format a Rupiah amount with dot thousand-separators ("Rp50.000")
pub fn format_rupiah(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-Rp{}", grouped)
    } else {
        format!("Rp{}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_round_trip() {
        assert_eq!(TransactionType::from_str("income").unwrap(), TransactionType::Income);
        assert_eq!(TransactionType::from_str("EXPENSE").unwrap(), TransactionType::Expense);
        assert!(TransactionType::from_str("transfer").is_err());
        assert_eq!(TransactionType::Income.to_string(), "income");
    }

    #[test]
    fn test_document_type_from_reply_valid() {
        assert_eq!(DocumentType::from_reply("invoice"), DocumentType::Invoice);
        assert_eq!(DocumentType::from_reply("  Bank_Statement \n"), DocumentType::BankStatement);
        assert_eq!(DocumentType::from_reply("\"receipt\""), DocumentType::Receipt);
    }

    #[test]
    fn test_document_type_from_reply_falls_back_to_receipt() {
        assert_eq!(DocumentType::from_reply("shopping list"), DocumentType::Receipt);
        assert_eq!(DocumentType::from_reply(""), DocumentType::Receipt);
        // the sentinel is never a valid classification result
        assert_eq!(DocumentType::from_reply("auto"), DocumentType::Receipt);
    }

    #[test]
    fn test_format_rupiah_grouping() {
        assert_eq!(format_rupiah(500.0), "Rp500");
        assert_eq!(format_rupiah(50_000.0), "Rp50.000");
        assert_eq!(format_rupiah(1_500_000.0), "Rp1.500.000");
    }

    #[test]
    fn test_parsed_document_tag_matches_type() {
        let doc = ParsedDocument::Invoice(InvoiceFields {
            vendor: Some("PT Sumber Makmur".into()),
            invoice_number: Some("INV-001".into()),
            date: None,
            due_date: None,
            items: vec![],
            total: Some(250_000.0),
        });
        assert_eq!(doc.document_type(), DocumentType::Invoice);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["document_type"], "invoice");
    }
}
