//! Ollama backend implementation
//!
//! HTTP client for the Ollama API. Text tasks go through the default model,
//! document tasks through the vision model via base64-encoded images.

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DocumentType, NewTransaction, ParsedCandidate};

use super::parsing::{parse_candidate, parse_document};
use super::types::DocumentExtraction;
use super::{ensure_image_media, ensure_text_input, templates, ExtractionBackend};

/// Ollama backend
///
/// # Configuration
///
/// - `OLLAMA_HOST`: server URL (required)
/// - `OLLAMA_MODEL`: text model (default: llama3.2)
/// - `OLLAMA_VISION_MODEL`: vision model for document tasks
///   (default: llama3.2-vision)
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    vision_model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            vision_model: "llama3.2-vision".to_string(),
        }
    }

    /// Create a new instance with a different vision model
    pub fn with_vision_model(mut self, vision_model: &str) -> Self {
        self.vision_model = vision_model.to_string();
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        let mut backend = Self::new(&host, &model);
        if let Ok(vision) = std::env::var("OLLAMA_VISION_MODEL") {
            backend.vision_model = vision;
        }
        Some(backend)
    }

    /// Make a text generation request
    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);
        Ok(ollama_response.response)
    }

    /// Make a vision generation request with one image
    async fn generate_vision(&self, prompt: String, image: &[u8]) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request = OllamaVisionRequest {
            model: self.vision_model.clone(),
            prompt,
            images: vec![encoded],
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama vision response: {}", ollama_response.response);
        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Request to Ollama API with images (for vision models)
#[derive(Debug, Serialize)]
struct OllamaVisionRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait::async_trait]
impl ExtractionBackend for OllamaBackend {
    async fn extract_transaction(&self, text: &str) -> Result<ParsedCandidate> {
        ensure_text_input(text)?;
        let response = self.generate(templates::transaction_prompt(text)).await?;
        parse_candidate(&response)
    }

    async fn extract_document(
        &self,
        image: &[u8],
        content_type: &str,
        document_type: DocumentType,
    ) -> Result<DocumentExtraction> {
        ensure_image_media(content_type, image.len())?;
        debug_assert!(document_type != DocumentType::Auto, "caller resolves Auto first");
        let response = self
            .generate_vision(templates::document_prompt(document_type), image)
            .await?;
        parse_document(&response, document_type)
    }

    async fn classify_document(&self, image: &[u8], content_type: &str) -> Result<DocumentType> {
        ensure_image_media(content_type, image.len())?;
        let response = self
            .generate_vision(templates::classification_prompt(), image)
            .await?;
        Ok(DocumentType::from_reply(&response))
    }

    async fn transcribe_audio(&self, _audio: &[u8], _content_type: &str) -> Result<String> {
        Err(Error::ConfigurationMissing(
            "audio transcription requires a Whisper-compatible backend (set OPENAI_COMPATIBLE_HOST)"
                .into(),
        ))
    }

    async fn summarize_transaction(&self, tx: &NewTransaction) -> Result<String> {
        let response = self.generate(templates::summary_prompt(tx)).await?;
        Ok(response.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
