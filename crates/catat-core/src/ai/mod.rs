//! Pluggable extraction backend abstraction
//!
//! The language/vision capability behind the ingestion pipeline is a
//! black box: given text, return structured transaction fields with a
//! confidence score; given an image, return raw text and/or a document
//! category. This module provides a backend-agnostic interface for it.
//!
//! # Architecture
//!
//! - `ExtractionBackend` trait: defines the interface for all extraction
//!   operations
//! - `ExtractionClient` enum: concrete wrapper providing Clone +
//!   compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`,
//!   `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `EXTRACTION_BACKEND`: Backend to use (ollama, openai_compatible, mock).
//!   Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)
//! - `OLLAMA_VISION_MODEL`: Vision model name (default: llama3.2-vision)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible
//!   backend, and for the cross-provider fallback)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod templates;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::DocumentExtraction;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{DocumentType, NewTransaction, ParsedCandidate};

/// Fixed size ceiling for inbound document images (10 MB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Reject empty text input before it reaches the capability
pub(crate) fn ensure_text_input(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

/// Reject unsupported or oversized image payloads
pub(crate) fn ensure_image_media(content_type: &str, len: usize) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(Error::InvalidMedia(format!(
            "unsupported content type '{}'",
            content_type
        )));
    }
    if len == 0 {
        return Err(Error::InvalidMedia("empty image payload".into()));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(Error::InvalidMedia(format!(
            "image exceeds {} byte limit",
            MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}

/// Trait defining the interface for all extraction backends
///
/// Backends must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Parse a free-text utterance into a transaction candidate
    async fn extract_transaction(&self, text: &str) -> Result<ParsedCandidate>;

    /// Extract raw text and structured fields from a document image
    ///
    /// `document_type` must already be resolved to a concrete category.
    async fn extract_document(
        &self,
        image: &[u8],
        content_type: &str,
        document_type: DocumentType,
    ) -> Result<DocumentExtraction>;

    /// Classify a document image into one of the six concrete categories
    ///
    /// Never returns the `Auto` sentinel; unrecognized replies resolve to
    /// `Receipt`.
    async fn classify_document(&self, image: &[u8], content_type: &str) -> Result<DocumentType>;

    /// Transcribe a voice note to text
    async fn transcribe_audio(&self, audio: &[u8], content_type: &str) -> Result<String>;

    /// Produce a short confirmation sentence for a committed transaction
    ///
    /// Low-stakes call: callers degrade to a generic fallback on failure.
    async fn summarize_transaction(&self, tx: &NewTransaction) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete extraction client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ExtractionClient {
    /// Ollama backend (HTTP API, text + vision)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, hosted APIs)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ExtractionClient {
    /// Create an extraction client from environment variables
    ///
    /// Checks `EXTRACTION_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and
    ///   OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("EXTRACTION_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(ExtractionClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(ExtractionClient::OpenAICompatible)
            }
            "mock" => Some(ExtractionClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown EXTRACTION_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(ExtractionClient::Ollama)
            }
        }
    }

    /// Create the independent second provider used for cross-provider
    /// fallback on the WhatsApp channel
    ///
    /// Always the OpenAI-compatible backend, so a fallback is only available
    /// when the primary is a different provider.
    pub fn fallback_from_env(primary: &ExtractionClient) -> Option<Self> {
        if matches!(primary, ExtractionClient::OpenAICompatible(_)) {
            return None;
        }
        OpenAICompatibleBackend::from_env().map(ExtractionClient::OpenAICompatible)
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        ExtractionClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ExtractionClient::Mock(MockBackend::new())
    }
}

// Implement ExtractionBackend for ExtractionClient by delegating to the
// inner backend
#[async_trait]
impl ExtractionBackend for ExtractionClient {
    async fn extract_transaction(&self, text: &str) -> Result<ParsedCandidate> {
        match self {
            ExtractionClient::Ollama(b) => b.extract_transaction(text).await,
            ExtractionClient::OpenAICompatible(b) => b.extract_transaction(text).await,
            ExtractionClient::Mock(b) => b.extract_transaction(text).await,
        }
    }

    async fn extract_document(
        &self,
        image: &[u8],
        content_type: &str,
        document_type: DocumentType,
    ) -> Result<DocumentExtraction> {
        match self {
            ExtractionClient::Ollama(b) => {
                b.extract_document(image, content_type, document_type).await
            }
            ExtractionClient::OpenAICompatible(b) => {
                b.extract_document(image, content_type, document_type).await
            }
            ExtractionClient::Mock(b) => {
                b.extract_document(image, content_type, document_type).await
            }
        }
    }

    async fn classify_document(&self, image: &[u8], content_type: &str) -> Result<DocumentType> {
        match self {
            ExtractionClient::Ollama(b) => b.classify_document(image, content_type).await,
            ExtractionClient::OpenAICompatible(b) => b.classify_document(image, content_type).await,
            ExtractionClient::Mock(b) => b.classify_document(image, content_type).await,
        }
    }

    async fn transcribe_audio(&self, audio: &[u8], content_type: &str) -> Result<String> {
        match self {
            ExtractionClient::Ollama(b) => b.transcribe_audio(audio, content_type).await,
            ExtractionClient::OpenAICompatible(b) => b.transcribe_audio(audio, content_type).await,
            ExtractionClient::Mock(b) => b.transcribe_audio(audio, content_type).await,
        }
    }

    async fn summarize_transaction(&self, tx: &NewTransaction) -> Result<String> {
        match self {
            ExtractionClient::Ollama(b) => b.summarize_transaction(tx).await,
            ExtractionClient::OpenAICompatible(b) => b.summarize_transaction(tx).await,
            ExtractionClient::Mock(b) => b.summarize_transaction(tx).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ExtractionClient::Ollama(b) => b.health_check().await,
            ExtractionClient::OpenAICompatible(b) => b.health_check().await,
            ExtractionClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ExtractionClient::Ollama(b) => b.model(),
            ExtractionClient::OpenAICompatible(b) => b.model(),
            ExtractionClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ExtractionClient::Ollama(b) => b.host(),
            ExtractionClient::OpenAICompatible(b) => b.host(),
            ExtractionClient::Mock(b) => b.host(),
        }
    }
}
