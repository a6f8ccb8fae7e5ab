//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use catat_core::db::synthetic_user_id;
use catat_core::models::DocumentType;
use catat_core::MockBackend;

fn test_app_with_client(client: ExtractionClient) -> Router {
    let db = Database::in_memory().unwrap();
    test_app_with_db(db, client)
}

fn test_app_with_db(db: Database, client: ExtractionClient) -> Router {
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    create_router_with_clients(
        db,
        config,
        Some(client),
        None,
        ChannelConfig::embedded().unwrap(),
    )
}

fn setup_test_app() -> Router {
    test_app_with_client(ExtractionClient::mock())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// ========== Parse API Tests ==========

#[tokio::test]
async fn test_parse_transaction_auto_save() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/parse-transaction",
            serde_json::json!({"text": "jual bakso 50 ribu", "autoSave": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["transcription"], "jual bakso 50 ribu");
    assert_eq!(json["autoSaved"], true);
    assert!(json["transactionId"].is_i64());
    assert!(json["confirmationMessage"].is_string());
    assert_eq!(json["parsed"]["type"], "income");
    assert_eq!(json["parsed"]["amount"], 50000.0);
    assert_eq!(json["parsed"]["description"], "Penjualan bakso");
}

#[tokio::test]
async fn test_parse_transaction_low_confidence_not_saved() {
    let db = Database::in_memory().unwrap();
    let client = ExtractionClient::Mock(MockBackend::new().with_confidence(0.4));
    let app = test_app_with_db(db.clone(), client);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/parse-transaction",
            serde_json::json!({"text": "jual bakso 50 ribu", "autoSave": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["autoSaved"], false);
    assert!(json.get("transactionId").is_none());
    assert_eq!(json["parsed"]["confidence"], 0.4);

    assert!(db.list_transactions_by_user("local-dev", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_parse_transaction_without_opt_in_not_saved() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/parse-transaction",
            serde_json::json!({"text": "jual bakso 50 ribu"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["autoSaved"], false);
    assert!(json.get("transactionId").is_none());
}

#[tokio::test]
async fn test_parse_transaction_empty_text_is_bad_request() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/parse-transaction",
            serde_json::json!({"text": "   "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Document API Tests ==========

#[tokio::test]
async fn test_process_document_auto_classifies() {
    let client = ExtractionClient::Mock(MockBackend::new().classifying_as(DocumentType::Invoice));
    let app = test_app_with_client(client);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/documents/process?documentType=auto")
                .header("content-type", "image/jpeg")
                .body(Body::from("fake-image-bytes"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["documentType"], "invoice");
    assert_eq!(json["parsed"]["document_type"], "invoice");
    assert!(json["rawText"].is_string());
}

#[tokio::test]
async fn test_process_document_pinned_type() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/documents/process?documentType=bank_statement")
                .header("content-type", "image/png")
                .body(Body::from("fake-image-bytes"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["documentType"], "bank_statement");
}

#[tokio::test]
async fn test_process_document_rejects_non_image() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/documents/process")
                .header("content-type", "application/pdf")
                .body(Body::from("%PDF-1.4"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_document_rejects_unknown_type_param() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/documents/process?documentType=selfie")
                .header("content-type", "image/jpeg")
                .body(Body::from("fake"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_documents_after_processing() {
    let db = Database::in_memory().unwrap();
    let app = test_app_with_db(db, ExtractionClient::mock());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/documents/process")
                .header("content-type", "image/jpeg")
                .body(Body::from("fake-image-bytes"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ========== WhatsApp Webhook Tests ==========

fn webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/whatsapp/webhook")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_help_command() {
    let app = setup_test_app();

    let response = app
        .oneshot(webhook_request(
            "From=whatsapp%3A%2B6281234567890&Body=bantuan&NumMedia=0",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = get_body_text(response).await;
    assert!(text.contains("Perintah yang tersedia"));
}

#[tokio::test]
async fn test_webhook_transaction_saved_under_pseudo_user() {
    let db = Database::in_memory().unwrap();
    let app = test_app_with_db(db.clone(), ExtractionClient::mock());

    let response = app
        .oneshot(webhook_request(
            "From=whatsapp%3A%2B6281234567890&Body=jual%20bakso%2050%20ribu&NumMedia=0",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = get_body_text(response).await;
    assert!(text.contains("Penjualan bakso"));

    let pseudo = synthetic_user_id("whatsapp:+6281234567890");
    assert_eq!(db.list_transactions_by_user(&pseudo, 10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_link_unknown_email_replies_failure() {
    let app = setup_test_app();

    let response = app
        .oneshot(webhook_request(
            "From=whatsapp%3A%2B6281234567890&Body=link%20test%40example.com&NumMedia=0",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = get_body_text(response).await;
    assert!(text.contains("Tidak ada akun"));
    assert!(text.contains("test@example.com"));
}

#[tokio::test]
async fn test_webhook_image_gets_pending_reply() {
    let app = setup_test_app();

    let response = app
        .oneshot(webhook_request(
            "From=whatsapp%3A%2B6281234567890&Body=&NumMedia=1\
             &MediaUrl0=https%3A%2F%2Fexample.com%2Fmedia%2F1\
             &MediaContentType0=image%2Fjpeg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = get_body_text(response).await;
    assert!(text.contains("segera hadir"));
}

// ========== Transaction CRUD Tests ==========

#[tokio::test]
async fn test_create_get_update_delete_transaction() {
    let app = setup_test_app();

    // Create
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({
                "type": "expense",
                "amount": 20000.0,
                "description": "Beli gas",
                "category": "Bahan Baku"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let id = json["id"].as_i64().unwrap();
    assert_eq!(json["source"], "manual");

    // Get
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/transactions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Update
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/transactions/{}", id),
            serde_json::json!({"amount": 22000.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 22000.0);
    assert_eq!(json["description"], "Beli gas");

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/transactions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Gone
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/transactions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_transaction_rejects_invalid_type() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({
                "type": "transfer",
                "amount": 1000.0,
                "description": "x",
                "category": "y"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_are_scoped_to_principal() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transactions")
                .header("content-type", "application/json")
                .header("x-user-id", "merchant-a")
                .body(Body::from(
                    serde_json::json!({
                        "type": "income",
                        "amount": 50000.0,
                        "description": "Penjualan bakso",
                        "category": "Penjualan Produk"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let id = json["id"].as_i64().unwrap();

    // Another principal cannot see it
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/transactions/{}", id))
                .header("x-user-id", "merchant-b")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Auth Tests ==========

fn auth_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        api_keys: vec!["sekret-key".to_string()],
        ..Default::default()
    };
    create_router_with_clients(
        db,
        config,
        Some(ExtractionClient::mock()),
        None,
        ChannelConfig::embedded().unwrap(),
    )
}

#[tokio::test]
async fn test_auth_rejects_missing_and_wrong_keys() {
    let app = auth_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/transactions")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_accepts_valid_key_with_principal() {
    let app = auth_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/transactions")
                .header("authorization", "Bearer sekret-key")
                .header("x-user-id", "merchant-a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_bypasses_api_key_auth() {
    let app = auth_test_app();

    let response = app
        .oneshot(webhook_request(
            "From=whatsapp%3A%2B6281234567890&Body=bantuan&NumMedia=0",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Persistence Tests ==========

#[tokio::test]
async fn test_file_backed_database_shared_across_routers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catat.db");
    let path = path.to_str().unwrap();

    let app = test_app_with_db(Database::new(path).unwrap(), ExtractionClient::mock());
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/parse-transaction",
            serde_json::json!({"text": "jual bakso 50 ribu", "autoSave": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A fresh router over the same file sees the committed transaction
    let app = test_app_with_db(Database::new(path).unwrap(), ExtractionClient::mock());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ========== Health Tests ==========

#[tokio::test]
async fn test_health_reports_backend() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["extractionConfigured"], true);
    assert_eq!(json["extractionHealthy"], true);
    assert_eq!(json["model"], "mock");
}
