//! Free-text transaction parsing

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{get_principal, AppError, AppState};
use catat_core::channels::VoiceAdapter;
use catat_core::models::ParsedCandidate;
use catat_core::policy::CommitPolicy;

/// Request for POST /api/parse-transaction
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseTransactionRequest {
    pub text: String,
    #[serde(default)]
    pub auto_save: bool,
}

/// Response for POST /api/parse-transaction
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseTransactionResponse {
    /// Echo of the parsed input text
    pub transcription: String,
    pub parsed: ParsedCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
    pub auto_saved: bool,
}

/// POST /api/parse-transaction - Parse text into a transaction candidate
///
/// With `autoSave` and a confident extraction the candidate is committed;
/// otherwise it comes back for manual confirmation.
pub async fn parse_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ParseTransactionRequest>,
) -> Result<Json<ParseTransactionResponse>, AppError> {
    let user_id = get_principal(&state, &headers)?;

    let client = state.extraction.as_ref().ok_or_else(|| {
        AppError::service_unavailable("Extraction backend is not configured")
    })?;

    let policy = CommitPolicy::new(state.channels.voice.auto_commit_threshold);
    let adapter = VoiceAdapter::new(&state.db, client, policy);
    let outcome = adapter
        .process(&user_id, &request.text, request.auto_save)
        .await?;

    Ok(Json(ParseTransactionResponse {
        transcription: request.text,
        parsed: outcome.parsed,
        transaction_id: outcome.transaction_id,
        confirmation_message: outcome.confirmation,
        auto_saved: outcome.auto_saved,
    }))
}
