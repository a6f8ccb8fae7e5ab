//! Document processing handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_principal, AppError, AppState, MAX_PAGE_LIMIT, MAX_UPLOAD_SIZE};
use catat_core::channels::OcrAdapter;
use catat_core::models::{DocumentType, OcrResult, ParsedDocument};

/// Query parameters for POST /api/documents/process
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentParams {
    /// Requested category; `auto` lets the classifier decide
    #[serde(default)]
    pub document_type: Option<String>,
}

/// Response for POST /api/documents/process
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentResponse {
    pub id: i64,
    pub document_type: DocumentType,
    pub raw_text: String,
    pub parsed: ParsedDocument,
}

impl From<OcrResult> for ProcessDocumentResponse {
    fn from(result: OcrResult) -> Self {
        Self {
            id: result.id,
            document_type: result.document_type,
            raw_text: result.raw_text,
            parsed: result.parsed,
        }
    }
}

/// POST /api/documents/process - Extract structured fields from an image
///
/// The raw request body is the image; the content type comes from the
/// Content-Type header. The result is archived for review, never turned
/// into a transaction automatically.
pub async fn process_document(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProcessDocumentParams>,
    request: Request,
) -> Result<Json<ProcessDocumentResponse>, AppError> {
    let user_id = get_principal(&state, request.headers())?;

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let requested = match params.document_type.as_deref() {
        None | Some("") => DocumentType::Auto,
        Some(raw) => raw
            .parse::<DocumentType>()
            .map_err(|e| AppError::bad_request(&e))?,
    };

    let client = state.extraction.as_ref().ok_or_else(|| {
        AppError::service_unavailable("Extraction backend is not configured")
    })?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body or file too large (max 10MB)"))?;

    let adapter = OcrAdapter::new(&state.db, client, &state.channels.ocr);
    let result = adapter
        .process(&user_id, &bytes, &content_type, requested)
        .await?;

    Ok(Json(result.into()))
}

/// Query parameters for GET /api/documents
#[derive(Debug, Deserialize)]
pub struct ListDocumentsParams {
    pub limit: Option<i64>,
}

/// GET /api/documents - List the principal's archived document results
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDocumentsParams>,
    request: Request,
) -> Result<Json<Vec<OcrResult>>, AppError> {
    let user_id = get_principal(&state, request.headers())?;
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_PAGE_LIMIT);
    let results = state.db.list_ocr_results(&user_id, limit)?;
    Ok(Json(results))
}
