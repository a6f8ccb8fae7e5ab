//! Instruction templates for the extraction capability
//!
//! One fixed template per task. The capability is expected to answer with a
//! JSON payload (possibly fenced in markdown); parsing and validation live
//! in `parsing.rs`.

use crate::models::{DocumentType, NewTransaction, EXPENSE_CATEGORIES, INCOME_CATEGORIES};

/// Prompt for parsing a free-text utterance into a transaction candidate
pub fn transaction_prompt(text: &str) -> String {
    format!(
        r#"Kamu adalah asisten pembukuan untuk pedagang kecil di Indonesia.
Ubah kalimat berikut menjadi satu transaksi keuangan.

Kalimat: "{text}"

Jawab HANYA dengan JSON berbentuk:
{{"type": "income" | "expense", "amount": <angka rupiah positif>, "description": "<deskripsi singkat>", "category": "<kategori>", "confidence": <0.0-1.0>}}

Kategori pengeluaran yang disarankan: {expense}.
Kategori pemasukan yang disarankan: {income}.
"confidence" adalah perkiraanmu sendiri seberapa yakin hasil ini benar."#,
        text = text,
        expense = EXPENSE_CATEGORIES.join(", "),
        income = INCOME_CATEGORIES.join(", "),
    )
}

/// Target JSON shape for one document category
fn document_shape(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Invoice => {
            r#"{"vendor": "...", "invoice_number": "...", "date": "...", "due_date": "...", "items": [{"name": "...", "quantity": 1, "price": 0}], "total": 0}"#
        }
        DocumentType::PurchaseOrder => {
            r#"{"supplier": "...", "po_number": "...", "date": "...", "items": [{"name": "...", "quantity": 1, "price": 0}], "total": 0}"#
        }
        DocumentType::BankStatement => {
            r#"{"bank_name": "...", "period": "...", "opening_balance": 0, "closing_balance": 0, "transactions": [{"date": "...", "description": "...", "amount": 0}]}"#
        }
        DocumentType::StockCard => {
            r#"{"item_name": "...", "period": "...", "movements": [{"date": "...", "direction": "in", "quantity": 0}]}"#
        }
        DocumentType::Contract => {
            r#"{"parties": ["..."], "date": "...", "subject": "...", "value": 0}"#
        }
        // Auto is resolved by the classifier before extraction runs
        DocumentType::Receipt | DocumentType::Auto => {
            r#"{"store_name": "...", "date": "...", "items": [{"name": "...", "quantity": 1, "price": 0}], "total": 0}"#
        }
    }
}

/// Prompt for extracting structured fields from a document image
pub fn document_prompt(document_type: DocumentType) -> String {
    format!(
        r#"Baca dokumen keuangan pada gambar ini. Jenis dokumen: {kind}.
Jawab HANYA dengan JSON berbentuk:
{{"raw_text": "<seluruh teks yang terbaca>", "parsed": {shape}}}
Gunakan null untuk nilai yang tidak terbaca."#,
        kind = document_type.as_str(),
        shape = document_shape(document_type),
    )
}

/// Prompt for classifying a document image into one category
pub fn classification_prompt() -> String {
    "Lihat gambar dokumen keuangan ini. Jawab dengan TEPAT SATU KATA dari daftar: \
     receipt, invoice, purchase_order, bank_statement, stock_card, contract."
        .to_string()
}

/// Prompt for a short confirmation sentence about a committed transaction
pub fn summary_prompt(tx: &NewTransaction) -> String {
    format!(
        "Buat satu kalimat singkat ramah dalam Bahasa Indonesia yang menegaskan bahwa \
         transaksi berikut sudah dicatat: {} sebesar Rp{} ({}, kategori {}). \
         Jawab hanya dengan kalimatnya, tanpa tanda kutip.",
        tx.description, tx.amount, tx.tx_type, tx.category,
    )
}
