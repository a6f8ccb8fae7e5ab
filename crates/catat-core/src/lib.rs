//! catat Core Library
//!
//! Shared functionality for the catat bookkeeping assistant:
//! - Multi-channel ingestion pipeline (voice text, documents, WhatsApp)
//! - Colloquial Indonesian amount normalization
//! - Pluggable extraction backends (Ollama, OpenAI-compatible, mock)
//! - Candidate validation and confidence-gated auto-commit
//! - Document classification and per-category extraction
//! - SQLite-backed transaction and identity store

pub mod ai;
pub mod amount;
pub mod channels;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod policy;

pub use ai::{
    DocumentExtraction, ExtractionBackend, ExtractionClient, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use channels::{
    InboundMedia, InboundMessage, OcrAdapter, ParseOutcome, VoiceAdapter, WhatsAppAdapter,
};
pub use config::ChannelConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    DocumentType, NewTransaction, OcrResult, ParsedCandidate, ParsedDocument, Transaction,
    TransactionSource, TransactionType, TransactionUpdate, User, UserSummary,
};
pub use policy::{CommitDecision, CommitPolicy};
