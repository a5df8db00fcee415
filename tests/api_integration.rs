//! HTTP API Integration Tests
//!
//! Exercises the router with signed requests, as Discord would send them.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{harness, Harness, Sent};
use soundswap_bot::core::Session;
use soundswap_bot::integrations::interactions::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use soundswap_bot::integrations::{router, ApiState, SignatureVerifier};
use soundswap_bot::Topic;

const TIMESTAMP: &str = "1718000000";

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn app(h: &Harness) -> Router {
    let verifier = SignatureVerifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes()))
        .unwrap();
    let state = ApiState::new(h.workflow.clone(), Some(verifier), 1900)
        .with_scout_pause(Duration::ZERO);
    router(Arc::new(state))
}

fn signed(body: &Value) -> Request<Body> {
    let body = body.to_string();
    let mut message = TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    let signature = hex::encode(signing_key().sign(&message).to_bytes());

    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(TIMESTAMP_HEADER, TIMESTAMP)
        .body(Body::from(body))
        .unwrap()
}

fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// Signature Checks
// ============================================================================

#[tokio::test]
async fn test_ping_is_ponged() {
    let h = harness();
    let (status, body) = send(app(&h), signed(&json!({"type": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"type": 1}));
}

#[tokio::test]
async fn test_bad_signature_is_refused() {
    let h = harness();
    let mut req = signed(&json!({"type": 1}));
    req.headers_mut().insert(TIMESTAMP_HEADER, "1718000001".parse().unwrap());

    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("signature"));
}

#[tokio::test]
async fn test_missing_headers_are_refused() {
    let h = harness();
    let (status, _) = send(app(&h), json_post("/interactions", &json!({"type": 1}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_public_key_is_server_error() {
    let h = harness();
    let app = router(Arc::new(ApiState::new(h.workflow.clone(), None, 1900)));
    let (status, _) = send(app, signed(&json!({"type": 1}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_root_path_accepts_interactions() {
    let h = harness();
    let mut req = signed(&json!({"type": 1}));
    *req.uri_mut() = "/".parse().unwrap();
    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], 1);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_blog_command_defers() {
    let h = harness();
    let req = signed(&json!({"type": 2, "token": "tok-blog", "data": {"name": "blog"}}));
    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"type": 5}));
}

#[tokio::test]
async fn test_unknown_command() {
    let h = harness();
    let req = signed(&json!({"type": 2, "token": "t", "data": {"name": "mystery"}}));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "❌ Unknown command");
}

#[tokio::test]
async fn test_draft_without_message_context() {
    let h = harness();
    let req = signed(&json!({"type": 2, "token": "t", "data": {"name": "Generate Draft"}}));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "❌ Error: Could not find message context.");
}

#[tokio::test]
async fn test_draft_with_message_context_defers() {
    let h = harness();
    let req = signed(&json!({
        "type": 2,
        "token": "t",
        "data": {
            "name": "Generate Draft",
            "target_id": "42",
            "resolved": {"messages": {"42": {"content": "Scout intel"}}}
        }
    }));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body, json!({"type": 5}));
}

#[tokio::test]
async fn test_component_and_unknown_types() {
    let h = harness();
    let (_, body) = send(app(&h), signed(&json!({"type": 3, "token": "t"}))).await;
    assert_eq!(body["type"], 4);
    assert!(body["data"]["content"].as_str().unwrap().contains("1"));

    let (_, body) = send(app(&h), signed(&json!({"type": 9, "token": "t"}))).await;
    assert_eq!(body["data"]["content"], "Unknown Interaction");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let h = harness();
    let (status, _) = send(app(&h), signed(&json!({"token": "no type"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Follow-ups
// ============================================================================

#[tokio::test]
async fn test_followup_without_session() {
    let h = harness();
    let req = json_post("/followup", &json!({"token": "missing", "content": "1"}));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body["status"], "session_not_found");
    assert!(body["message"].as_str().unwrap().starts_with("❌"));
}

#[tokio::test]
async fn test_followup_invalid_input() {
    let h = harness();
    h.sessions.put(Session::new("tok", vec![Topic::new("lofi drums", 60)]));
    let req = json_post("/followup", &json!({"token": "tok", "content": "nine"}));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body["status"], "invalid_input");
    assert!(h.sessions.get("tok").is_some());
}

#[tokio::test]
async fn test_followup_accepts_selection() {
    let h = harness();
    h.workflow.start("tok").await;
    let req = json_post("/followup", &json!({"token": "tok", "content": "1"}));
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body, json!({"status": "processing_outlines"}));
}

// ============================================================================
// Health & Scout
// ============================================================================

#[tokio::test]
async fn test_health_reports_sessions() {
    let h = harness();
    h.sessions.put(Session::new("a", vec![Topic::new("x", 10)]));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "sessions": 1}));
}

#[tokio::test]
async fn test_scout_posts_report() {
    let h = harness();
    let req = Request::builder().uri("/scout").body(Body::empty()).unwrap();
    let (_, body) = send(app(&h), req).await;
    assert_eq!(body["status"], "sent");
    assert_eq!(body["topics"], 4);
    assert!(body["timestamp"].is_string());

    let messages = h.messenger.messages();
    assert!(!messages.is_empty());
    assert!(messages.iter().all(|(to, _)| *to == Sent::Channel));
}
