//! Integration tests driving the full router with the in-memory backends.
//!
//! No network, database, or AI credentials are needed: the store is the
//! in-memory backend, the rate limiter runs in process, and the AI client
//! is left unconfigured (its routes answer 503 once past the gate).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use finance_guru_api::routes::router;
use finance_guru_api::services::email::Mailer;
use finance_guru_api::services::rate_limit::RateLimiter;
use finance_guru_api::state::AppState;
use finance_guru_api::store::MemoryStore;

const ADMIN_EMAIL: &str = "admin@financeguru.com";

fn test_app(rate_limit: u32) -> Router {
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        rate_limiter: Arc::new(RateLimiter::in_memory(
            rate_limit,
            Duration::from_secs(10),
            true,
        )),
        gemini: None,
        mailer: Arc::new(Mailer::new(None)),
        chrome_path: None,
    };
    router(state)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn register_body(email: &str) -> Value {
    json!({
        "name": "Grace Hopper",
        "email": email,
        "company": "Navy R&D",
        "location": "Arlington, VA",
        "phone": "+1 555 0100"
    })
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        Some(json!({ "email": email })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app(10);
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_docs_describe_the_surface() {
    let app = test_app(10);
    let (status, body) = send(&app, "GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].as_array().unwrap().len() >= 10);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = test_app(10);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "user_exists");
}

#[tokio::test]
async fn login_with_unknown_email_fails() {
    let app = test_app(10);
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "nobody@example.com" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "user_not_found");
}

#[tokio::test]
async fn session_token_resolves_current_user_until_logout() {
    let app = test_app(10);
    send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    let token = login(&app, "grace@example.com").await;

    let (status, body) = send(&app, "GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["role"], "developer");

    let (status, _) = send(&app, "POST", "/api/auth/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn portal_routes_reject_missing_tokens() {
    let app = test_app(10);
    let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_session_token");
}

#[tokio::test]
async fn key_lifecycle_pending_active_revoked() {
    let app = test_app(10);
    let (_, dev) = send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    let dev_id = dev["id"].as_str().unwrap().to_string();
    let dev_token = login(&app, "grace@example.com").await;

    // Developer requests a key: born pending
    let (status, key) = send(&app, "POST", "/api/keys", None, Some(&dev_token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(key["status"], "pending");
    let key_string = key["key"].as_str().unwrap().to_string();
    assert!(key_string.starts_with("fg_"));

    // Admin approves it
    let admin_token = login(&app, ADMIN_EMAIL).await;
    let (status, key) = send(
        &app,
        "PUT",
        "/api/admin/keys",
        Some(json!({ "userId": dev_id, "key": key_string, "status": "active" })),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(key["status"], "active");

    // Then revokes it
    let (status, key) = send(
        &app,
        "PUT",
        "/api/admin/keys",
        Some(json!({ "userId": dev_id, "key": key_string, "status": "revoked" })),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(key["status"], "revoked");

    // Revoked keys never come back
    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/keys",
        Some(json!({ "userId": dev_id, "key": key_string, "status": "active" })),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_key_transition");
}

#[tokio::test]
async fn admin_routes_reject_developers() {
    let app = test_app(10);
    send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    let dev_token = login(&app, "grace@example.com").await;

    let (status, body) = send(&app, "GET", "/api/admin/users", None, Some(&dev_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "admin_only");
}

#[tokio::test]
async fn admin_sees_all_users() {
    let app = test_app(10);
    send(
        &app,
        "POST",
        "/api/auth/register",
        Some(register_body("grace@example.com")),
        None,
    )
    .await;
    let admin_token = login(&app, ADMIN_EMAIL).await;

    let (status, body) = send(&app, "GET", "/api/admin/users", None, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert!(emails.contains(&ADMIN_EMAIL));
    assert!(emails.contains(&"grace@example.com"));
}

#[tokio::test]
async fn analyze_gate_denies_once_the_window_is_full() {
    // Limit of 1: the first request passes the gate (then fails on the
    // unconfigured AI client), the second is denied by the limiter
    let app = test_app(1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/analyze",
        Some(json!({ "content": "Revenue: 500000, Expenses: 350000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "ai_unconfigured");

    let (status, body) = send(
        &app,
        "POST",
        "/api/analyze",
        Some(json!({ "content": "Revenue: 500000, Expenses: 350000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "rate_limited");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Please wait")
    );
}

async fn analyze_from(app: &Router, addr: &str) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(ConnectInfo(addr.parse::<SocketAddr>().unwrap()))
        .body(Body::from(
            json!({ "content": "Revenue: 500000" }).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn unauthenticated_clients_get_independent_windows() {
    let app = test_app(1);

    // First caller fills their window (503: past the gate, AI unconfigured)
    assert_eq!(
        analyze_from(&app, "10.0.0.1:40000").await,
        StatusCode::SERVICE_UNAVAILABLE
    );
    // Same host on another ephemeral port shares the window
    assert_eq!(
        analyze_from(&app, "10.0.0.1:40001").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    // A different host is unaffected
    assert_eq!(
        analyze_from(&app, "10.0.0.2:40000").await,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn blank_content_fails_before_the_gate() {
    let app = test_app(1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/analyze",
        Some(json!({ "content": "   \n\t " })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "empty_file");

    // The blank request consumed no rate-limit slot
    let (status, _) = send(
        &app,
        "POST",
        "/api/analyze",
        Some(json!({ "content": "Revenue: 500000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn chat_requires_a_message() {
    let app = test_app(10);
    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "  " })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn upload_rejects_unsupported_formats() {
    let app = test_app(10);

    let boundary = "X-TEST-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"report.docx\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         not a real docx\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "unsupported_format");
}

#[tokio::test]
async fn generate_pdf_requires_content() {
    let app = test_app(10);
    let (status, body) = send(&app, "POST", "/api/generate-pdf", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}
