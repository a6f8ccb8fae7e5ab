//! Integration tests for catat-core
//!
//! These tests exercise the full extract -> normalize -> gate -> persist
//! pipeline across channels, using the mock extraction backend.

use catat_core::{
    channels::whatsapp::replies,
    db::synthetic_user_id,
    ChannelConfig, CommitPolicy, Database, DocumentType, ExtractionClient, InboundMessage,
    MockBackend, OcrAdapter, ParsedDocument, TransactionSource, TransactionType, VoiceAdapter,
    WhatsAppAdapter,
};

fn text_msg(sender: &str, body: &str) -> InboundMessage {
    InboundMessage {
        sender: sender.to_string(),
        body: body.to_string(),
        media: vec![],
    }
}

// =============================================================================
// Voice channel
// =============================================================================

#[tokio::test]
async fn test_voice_auto_save_persists_exact_fields() {
    let db = Database::in_memory().expect("Failed to create test database");
    let client = ExtractionClient::mock();
    let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

    let outcome = adapter
        .process("merchant-1", "jual bakso 50 ribu", true)
        .await
        .expect("Parse failed");

    assert!(outcome.auto_saved);
    let id = outcome.transaction_id.expect("Transaction committed");

    let tx = db.get_transaction(id).unwrap().expect("Stored transaction");
    assert_eq!(tx.tx_type, TransactionType::Income);
    assert_eq!(tx.amount, 50_000.0);
    assert_eq!(tx.description, "Penjualan bakso");
    assert_eq!(tx.category, "Penjualan Produk");
    assert_eq!(tx.source, TransactionSource::Voice);
}

#[tokio::test]
async fn test_voice_low_confidence_returns_candidate_unmodified() {
    let db = Database::in_memory().unwrap();
    let client = ExtractionClient::Mock(MockBackend::new().with_confidence(0.4));
    let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

    let outcome = adapter
        .process("merchant-1", "jual bakso 50 ribu", true)
        .await
        .unwrap();

    assert!(!outcome.auto_saved);
    assert!(outcome.transaction_id.is_none());
    assert_eq!(outcome.parsed.tx_type, "income");
    assert_eq!(outcome.parsed.amount, 50_000.0);
    assert_eq!(outcome.parsed.confidence, 0.4);

    assert!(db.list_transactions_by_user("merchant-1", 10).unwrap().is_empty());
}

// =============================================================================
// OCR channel
// =============================================================================

#[tokio::test]
async fn test_ocr_auto_resolution_overrides_request_field() {
    let db = Database::in_memory().unwrap();
    let client = ExtractionClient::Mock(MockBackend::new().classifying_as(DocumentType::Invoice));
    let config = ChannelConfig::embedded().unwrap();
    let adapter = OcrAdapter::new(&db, &client, &config.ocr);

    let result = adapter
        .process("merchant-1", b"fake-image", "image/jpeg", DocumentType::Auto)
        .await
        .unwrap();

    assert_eq!(result.document_type, DocumentType::Invoice);
    assert!(matches!(result.parsed, ParsedDocument::Invoice(_)));

    // Archived, but never auto-converted into a transaction
    assert_eq!(db.list_ocr_results("merchant-1", 10).unwrap().len(), 1);
    assert!(db.list_transactions_by_user("merchant-1", 10).unwrap().is_empty());
}

// =============================================================================
// WhatsApp channel
// =============================================================================

#[tokio::test]
async fn test_whatsapp_help_makes_no_extraction_call() {
    let db = Database::in_memory().unwrap();
    // Extraction would fail loudly if invoked
    let client = ExtractionClient::Mock(MockBackend::new().failing_extraction());
    let adapter = WhatsAppAdapter::new(&db, &client, None, CommitPolicy::default());

    let reply = adapter
        .handle(&text_msg("whatsapp:+62811111111", "bantuan"))
        .await
        .unwrap();

    assert_eq!(reply, replies::help_text());
    assert!(db
        .list_transactions_by_user(&synthetic_user_id("whatsapp:+62811111111"), 10)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_whatsapp_link_unknown_email_fails_politely() {
    let db = Database::in_memory().unwrap();
    let client = ExtractionClient::mock();
    let adapter = WhatsAppAdapter::new(&db, &client, None, CommitPolicy::default());
    let sender = "whatsapp:+62822222222";

    let reply = adapter
        .handle(&text_msg(sender, "link test@example.com"))
        .await
        .unwrap();

    assert_eq!(reply, replies::link_failure("test@example.com"));
    // Sender remains unlinked: still resolves to the pseudo-user
    assert_eq!(db.resolve_whatsapp_user(sender).unwrap(), synthetic_user_id(sender));
}

#[tokio::test]
async fn test_whatsapp_end_to_end_then_link_merges() {
    let db = Database::in_memory().unwrap();
    db.create_user("acct-9", "warung@example.com").unwrap();
    let client = ExtractionClient::mock();
    let adapter = WhatsAppAdapter::new(&db, &client, None, CommitPolicy::default());
    let sender = "whatsapp:+62833333333";

    adapter.handle(&text_msg(sender, "jual bakso 50 ribu")).await.unwrap();
    adapter.handle(&text_msg(sender, "beli gas 22 ribu")).await.unwrap();

    let shadow = synthetic_user_id(sender);
    assert_eq!(db.list_transactions_by_user(&shadow, 10).unwrap().len(), 2);

    adapter
        .handle(&text_msg(sender, "link warung@example.com"))
        .await
        .unwrap();

    // Shadow history is re-keyed to the real account
    assert!(db.list_transactions_by_user(&shadow, 10).unwrap().is_empty());
    let merged = db.list_transactions_by_user("acct-9", 10).unwrap();
    assert_eq!(merged.len(), 2);

    let summary = db.user_summary("acct-9").unwrap();
    assert_eq!(summary.income_total, 50_000.0);
    assert_eq!(summary.expense_total, 22_000.0);
    assert_eq!(summary.balance, 28_000.0);
}
