//! OpenAI-compatible backend implementation
//!
//! Speaks the chat-completions protocol, so it works with vLLM, LocalAI,
//! llama-server, and hosted OpenAI-compatible APIs alike. Voice notes go
//! through the Whisper-compatible `/v1/audio/transcriptions` endpoint.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key when the server wants one
//! - `OPENAI_COMPATIBLE_TRANSCRIBE_MODEL`: transcription model
//!   (default: whisper-1)

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DocumentType, NewTransaction, ParsedCandidate};

use super::parsing::{parse_candidate, parse_document};
use super::types::DocumentExtraction;
use super::{ensure_image_media, ensure_text_input, templates, ExtractionBackend};

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    transcribe_model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            transcribe_model: "whisper-1".to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model =
            std::env::var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let mut backend = Self::new(&host, &model);
        backend.api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();
        if let Ok(transcribe) = std::env::var("OPENAI_COMPATIBLE_TRANSCRIBE_MODEL") {
            backend.transcribe_model = transcribe;
        }
        Some(backend)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// Make a chat completion request
    async fn chat_completion(&self, content: ChatContent) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            temperature: Some(0.1),
            stream: false,
        };

        let req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        let response = self.authorize(req_builder).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::MalformedResponse(format!(
                "chat completion error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("no choices in chat completion".into()))?;

        debug!("Chat completion response: {}", content);
        Ok(content)
    }

    /// Chat completion with one inline image
    async fn chat_completion_with_image(
        &self,
        prompt: String,
        image: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{};base64,{}", content_type, encoded);
        let content = ChatContent::Parts(vec![
            ContentPart::Text { text: prompt },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            },
        ]);
        self.chat_completion(content).await
    }
}

/// Request to the chat completions API
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait::async_trait]
impl ExtractionBackend for OpenAICompatibleBackend {
    async fn extract_transaction(&self, text: &str) -> Result<ParsedCandidate> {
        ensure_text_input(text)?;
        let response = self
            .chat_completion(ChatContent::Text(templates::transaction_prompt(text)))
            .await?;
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
            .chat_completion_with_image(templates::document_prompt(document_type), image, content_type)
            .await?;
        parse_document(&response, document_type)
    }

    async fn classify_document(&self, image: &[u8], content_type: &str) -> Result<DocumentType> {
        ensure_image_media(content_type, image.len())?;
        let response = self
            .chat_completion_with_image(templates::classification_prompt(), image, content_type)
            .await?;
        Ok(DocumentType::from_reply(&response))
    }

    async fn transcribe_audio(&self, audio: &[u8], content_type: &str) -> Result<String> {
        if !content_type.starts_with("audio/") {
            return Err(Error::InvalidMedia(format!(
                "unsupported content type '{}'",
                content_type
            )));
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("voice-note")
            .mime_str(content_type)
            .map_err(|e| Error::InvalidMedia(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcribe_model.clone())
            .part("file", part);

        let req_builder = self
            .http_client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form);

        let response = self.authorize(req_builder).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::MalformedResponse(format!(
                "transcription error {}: {}",
                status, body
            )));
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text)
    }

    async fn summarize_transaction(&self, tx: &NewTransaction) -> Result<String> {
        let response = self
            .chat_completion(ChatContent::Text(templates::summary_prompt(tx)))
            .await?;
        Ok(response.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        let req = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));
        self.authorize(req)
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
