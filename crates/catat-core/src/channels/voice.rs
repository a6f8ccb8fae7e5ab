//! Voice channel adapter
//!
//! The transcript is produced client-side and arrives as plain text. The
//! adapter runs it through extraction, normalization, and the auto-commit
//! policy, persisting only when the confidence gate clears.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::{ExtractionBackend, ExtractionClient};
use crate::db::Database;
use crate::error::Result;
use crate::models::{format_rupiah, NewTransaction, ParsedCandidate, TransactionSource};
use crate::normalize::normalize;
use crate::policy::CommitPolicy;

/// Result of one parse request
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    /// The candidate, whether or not it was committed
    pub parsed: ParsedCandidate,
    /// Set when the candidate was persisted
    pub transaction_id: Option<i64>,
    /// Natural-language confirmation, only for committed transactions
    pub confirmation: Option<String>,
    pub auto_saved: bool,
}

/// Voice channel front-end
pub struct VoiceAdapter<'a> {
    db: &'a Database,
    client: &'a ExtractionClient,
    policy: CommitPolicy,
}

impl<'a> VoiceAdapter<'a> {
    pub fn new(db: &'a Database, client: &'a ExtractionClient, policy: CommitPolicy) -> Self {
        Self { db, client, policy }
    }

    /// Parse a transcript and commit it when allowed
    ///
    /// The confirmation text is a separate, low-stakes call: its failure
    /// never rolls back the already-committed transaction, it only degrades
    /// the confirmation to a generic fallback string.
    pub async fn process(&self, user_id: &str, text: &str, auto_save: bool) -> Result<ParseOutcome> {
        let candidate = self.client.extract_transaction(text).await?;
        let record = normalize(&candidate, user_id, TransactionSource::Voice, Some(text))?;

        let decision = self.policy.decide(&candidate, auto_save);
        if !decision.commit {
            debug!(
                confidence = candidate.confidence,
                threshold = self.policy.threshold(),
                auto_save,
                "Returning candidate for manual confirmation"
            );
            return Ok(ParseOutcome {
                parsed: candidate,
                transaction_id: None,
                confirmation: None,
                auto_saved: false,
            });
        }

        let id = self.db.save_transaction(&record)?;
        let confirmation = self.confirmation_text(&record).await;

        Ok(ParseOutcome {
            parsed: candidate,
            transaction_id: Some(id),
            confirmation: Some(confirmation),
            auto_saved: true,
        })
    }

    async fn confirmation_text(&self, record: &NewTransaction) -> String {
        match self.client.summarize_transaction(record).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_confirmation(record),
            Err(e) => {
                warn!(error = %e, "Confirmation synthesis failed, using fallback text");
                fallback_confirmation(record)
            }
        }
    }
}

/// Generic confirmation used when summary synthesis fails
pub fn fallback_confirmation(record: &NewTransaction) -> String {
    format!(
        "{} sebesar {} sudah dicatat.",
        record.description,
        format_rupiah(record.amount)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::error::Error;
    use crate::models::TransactionType;

    #[tokio::test]
    async fn test_auto_save_commits() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::Mock(MockBackend::new());
        let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

        let outcome = adapter.process("u1", "jual bakso 50 ribu", true).await.unwrap();
        assert!(outcome.auto_saved);
        let id = outcome.transaction_id.expect("committed");
        assert!(outcome.confirmation.is_some());

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.tx_type, TransactionType::Income);
        assert_eq!(tx.amount, 50_000.0);
        assert_eq!(tx.source, TransactionSource::Voice);
        assert_eq!(tx.raw_input.as_deref(), Some("jual bakso 50 ribu"));
    }

    #[tokio::test]
    async fn test_low_confidence_returns_candidate() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::Mock(MockBackend::new().with_confidence(0.4));
        let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

        let outcome = adapter.process("u1", "jual bakso 50 ribu", true).await.unwrap();
        assert!(!outcome.auto_saved);
        assert!(outcome.transaction_id.is_none());
        assert_eq!(outcome.parsed.confidence, 0.4);
        assert_eq!(outcome.parsed.amount, 50_000.0);

        assert!(db.list_transactions_by_user("u1", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_opt_in_never_commits() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::Mock(MockBackend::new().with_confidence(0.99));
        let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

        let outcome = adapter.process("u1", "jual bakso 50 ribu", false).await.unwrap();
        assert!(!outcome.auto_saved);
        assert!(db.list_transactions_by_user("u1", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_propagates() {
        let db = Database::in_memory().unwrap();
        let client = ExtractionClient::mock();
        let adapter = VoiceAdapter::new(&db, &client, CommitPolicy::default());

        assert!(matches!(
            adapter.process("u1", "", true).await,
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_fallback_confirmation_text() {
        let record = NewTransaction {
            user_id: "u1".into(),
            tx_type: TransactionType::Income,
            amount: 50_000.0,
            description: "Penjualan bakso".into(),
            category: "Penjualan Produk".into(),
            source: TransactionSource::Voice,
            raw_input: None,
        };
        assert_eq!(
            fallback_confirmation(&record),
            "Penjualan bakso sebesar Rp50.000 sudah dicatat."
        );
    }
}
