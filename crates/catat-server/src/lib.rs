//! catat Web Server
//!
//! Axum-based REST API for the catat bookkeeping assistant.
//!
//! Security posture:
//! - API-key authentication (on by default, --no-auth for local dev)
//! - Locked-down CORS policy
//! - Input validation (pagination limits, upload size limits)
//! - Error responses that never leak internals
//!
//! The WhatsApp webhook is the one unauthenticated surface: it authenticates
//! via sender-address linkage instead of API keys.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use subtle::ConstantTimeEq;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use catat_core::ai::{ExtractionBackend, ExtractionClient};
use catat_core::config::ChannelConfig;
use catat_core::db::Database;
use catat_core::error::Error as CoreError;

mod handlers;

#[cfg(test)]
mod tests;

/// Upload ceiling for document images (10 MB, shared with the OCR adapter)
pub const MAX_UPLOAD_SIZE: usize = catat_core::ai::MAX_IMAGE_BYTES;

/// Largest page size a client may request
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Header carrying the authenticated principal's user id
const USER_ID_HEADER: &str = "x-user-id";

/// Header presenting the API key
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Require API keys on every request (on by default)
    pub require_auth: bool,
    /// CORS origins allowed to call the API; empty locks it to same-origin
    pub allowed_origins: Vec<String>,
    /// Accepted API keys, presented as "Bearer <key>" in the
    /// Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// State shared by all handlers
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Primary extraction backend
    pub extraction: Option<ExtractionClient>,
    /// Independent second provider for WhatsApp cross-provider fallback
    pub fallback: Option<ExtractionClient>,
    /// Per-channel thresholds and limits
    pub channels: ChannelConfig,
    /// Client for fetching inbound WhatsApp media
    pub http_client: reqwest::Client,
}

/// Authentication middleware - validates API keys
///
/// API keys are compared using constant-time comparison to prevent timing
/// attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    if let Some(presented) = bearer {
        let authorized = state
            .config
            .api_keys
            .iter()
            .any(|key| key.as_bytes().ct_eq(presented.as_bytes()).into());
        if authorized {
            return next.run(request).await;
        }
    }

    warn!(path = %request.uri().path(), "Rejected unauthenticated request");
    AppError::unauthorized().into_response()
}

/// Extract the principal's user id from request headers
///
/// In no-auth mode requests without an explicit id act as "local-dev",
/// mirroring single-user development setups.
pub fn get_principal(state: &AppState, headers: &axum::http::HeaderMap) -> Result<String, AppError> {
    if let Some(user_id) = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        return Ok(user_id.to_string());
    }

    if !state.config.require_auth {
        return Ok("local-dev".to_string());
    }

    Err(AppError::unauthorized())
}

/// Success response
#[derive(serde::Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Build the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let extraction = ExtractionClient::from_env();
    let fallback = extraction
        .as_ref()
        .and_then(ExtractionClient::fallback_from_env);
    let channels = ChannelConfig::load().unwrap_or_default();
    create_router_with_clients(db, config, extraction, fallback, channels)
}

/// Create the application router with explicit backends (for testing)
pub fn create_router_with_clients(
    db: Database,
    config: ServerConfig,
    extraction: Option<ExtractionClient>,
    fallback: Option<ExtractionClient>,
    channels: ChannelConfig,
) -> Router {
    match &extraction {
        Some(client) => info!(
            host = client.host(),
            model = client.model(),
            "Extraction backend configured"
        ),
        None => info!("Extraction backend not configured (set OLLAMA_HOST to enable parsing)"),
    }
    if let Some(fb) = &fallback {
        info!(host = fb.host(), "Cross-provider fallback configured");
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        extraction,
        fallback,
        channels,
        http_client: reqwest::Client::new(),
    });

    let protected = Router::new()
        .route("/health", get(handlers::health))
        .route("/parse-transaction", post(handlers::parse_transaction))
        .route("/documents/process", post(handlers::process_document))
        .route("/documents", get(handlers::list_documents))
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .patch(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Sender-address linkage stands in for API-key auth on this surface
    let webhook = Router::new().route("/whatsapp/webhook", post(handlers::whatsapp_webhook));

    let api_routes = protected.merge(webhook);

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - keep this server off public networks!");
    }

    check_extraction_connection().await;

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log extraction backend connection status
async fn check_extraction_connection() {
    match ExtractionClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ Extraction backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  Extraction backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  Extraction backend not configured (set OLLAMA_HOST to enable parsing)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Request-level error carrying an HTTP status
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized".to_string(),
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::EmptyInput | CoreError::InvalidMedia(_) | CoreError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            CoreError::InvalidType(_)
            | CoreError::InvalidAmount(_)
            | CoreError::MalformedResponse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            CoreError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Database(_)
            | CoreError::Pool(_)
            | CoreError::Http(_)
            | CoreError::Json(_)
            | CoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Hide internals from clients, keep the full error for logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Internal error");
            "An internal error occurred".to_string()
        } else {
            err.to_string()
        };

        Self { status, message }
    }
}
