//! Transaction CRUD and health handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_principal, AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};
use catat_core::ai::ExtractionBackend;
use catat_core::models::{
    ParsedCandidate, Transaction, TransactionSource, TransactionUpdate,
};
use catat_core::normalize::normalize;

/// Query parameters for GET /api/transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsParams {
    pub limit: Option<i64>,
}

/// GET /api/transactions - List the principal's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTransactionsParams>,
    headers: HeaderMap,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let user_id = get_principal(&state, &headers)?;
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_PAGE_LIMIT);
    let transactions = state.db.list_transactions_by_user(&user_id, limit)?;
    Ok(Json(transactions))
}

/// Request for POST /api/transactions (manual entry)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

/// POST /api/transactions - Manually record a transaction
///
/// Runs through the same validation as the extraction channels.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    let user_id = get_principal(&state, &headers)?;

    let candidate = ParsedCandidate {
        tx_type: request.tx_type,
        amount: request.amount,
        description: request.description,
        category: request.category,
        confidence: 1.0,
    };
    let record = normalize(&candidate, &user_id, TransactionSource::Manual, None)?;

    let id = state.db.save_transaction(&record)?;
    let transaction = state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::internal("Transaction not found after creation"))?;
    Ok(Json(transaction))
}

/// Look up a transaction and verify it belongs to the principal
fn owned_transaction(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
) -> Result<Transaction, AppError> {
    let user_id = get_principal(state, headers)?;
    let transaction = state
        .db
        .get_transaction(id)?
        .filter(|tx| tx.user_id == user_id)
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(transaction)
}

/// GET /api/transactions/:id - Get one transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Transaction>, AppError> {
    let transaction = owned_transaction(&state, &headers, id)?;
    Ok(Json(transaction))
}

/// PATCH /api/transactions/:id - Partially update a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(update): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, AppError> {
    owned_transaction(&state, &headers, id)?;
    let updated = state.db.update_transaction(id, &update)?;
    Ok(Json(updated))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    owned_transaction(&state, &headers, id)?;
    state.db.delete_transaction(id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Response for GET /api/health
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub extraction_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_healthy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// GET /api/health - Service and backend health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    match &state.extraction {
        Some(client) => Json(HealthResponse {
            status: "ok",
            extraction_configured: true,
            extraction_healthy: Some(client.health_check().await),
            model: Some(client.model().to_string()),
        }),
        None => Json(HealthResponse {
            status: "ok",
            extraction_configured: false,
            extraction_healthy: None,
            model: None,
        }),
    }
}
