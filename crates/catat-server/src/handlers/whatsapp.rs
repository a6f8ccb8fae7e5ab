//! WhatsApp webhook handler
//!
//! Accepts Twilio-style form payloads and replies with plain text addressed
//! to the sender. This surface authenticates via sender-address linkage, not
//! API keys.

use std::sync::Arc;

use axum::{extract::State, Form};
use serde::Deserialize;
use tracing::warn;

use crate::{AppError, AppState};
use catat_core::channels::whatsapp::replies;
use catat_core::channels::{InboundMedia, InboundMessage, WhatsAppAdapter};
use catat_core::error::Error as CoreError;
use catat_core::policy::CommitPolicy;

/// Inbound webhook payload (Twilio-style field names)
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhook {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "NumMedia", default)]
    pub num_media: String,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url0: Option<String>,
    #[serde(rename = "MediaContentType0", default)]
    pub media_content_type0: Option<String>,
}

/// POST /api/whatsapp/webhook - Handle one inbound message
///
/// Always replies 200 with the outbound message body; pipeline failures
/// become user-facing reply text rather than HTTP errors.
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<WhatsAppWebhook>,
) -> Result<String, AppError> {
    let client = state.extraction.as_ref().ok_or_else(|| {
        AppError::service_unavailable("Extraction backend is not configured")
    })?;

    let num_media: usize = payload.num_media.trim().parse().unwrap_or(0);
    let mut media = Vec::new();

    if num_media > 0 {
        if let (Some(url), Some(content_type)) = (&payload.media_url0, &payload.media_content_type0)
        {
            // Only voice notes need their bytes; images are answered with a
            // feature-pending reply before any download would matter
            let data = if content_type.starts_with("audio/") {
                match fetch_media(&state, url).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch inbound media");
                        return Ok(replies::for_error(&e));
                    }
                }
            } else {
                Vec::new()
            };
            media.push(InboundMedia {
                content_type: content_type.clone(),
                data,
            });
        }
    }

    let message = InboundMessage {
        sender: payload.from.clone(),
        body: payload.body.clone(),
        media,
    };

    let policy = CommitPolicy::new(state.channels.whatsapp.auto_commit_threshold);
    let adapter = WhatsAppAdapter::new(&state.db, client, state.fallback.as_ref(), policy);

    let reply = adapter.handle(&message).await?;
    Ok(reply)
}

async fn fetch_media(state: &AppState, url: &str) -> Result<Vec<u8>, CoreError> {
    let response = state.http_client.get(url).send().await?;
    let response = response.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}
