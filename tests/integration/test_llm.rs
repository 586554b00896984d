//! Integration tests for the DeepSeek chat-completion client.
//!
//! Each test starts a local axum server standing in for the upstream API
//! and points a `DeepSeekClient` at it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use studybot_llm::{ChatOptions, DeepSeekClient, LlmClient, LlmError, LlmErrorKind};

/// Requests seen by the fake upstream: authorization header and JSON body.
type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Wraps `content` in a minimal chat-completion response.
fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

/// Spawns `router` on an ephemeral port and returns its base URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

/// Builds a client pointed at `base_url`.
fn client_for(base_url: &str) -> DeepSeekClient {
    DeepSeekClient::with_options("sk-test", ChatOptions::default().with_base_url(base_url))
        .expect("Failed to build client")
}

/// Upstream that records every request and answers with a fixed text.
async fn recording_upstream(answer: &'static str) -> (String, Captured) {
    let captured: Captured = Arc::default();

    let router = Router::new()
        .route(
            "/chat/completions",
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.lock().expect("lock poisoned").push((auth, body));
                    Json(completion(answer))
                },
            ),
        )
        .with_state(Arc::clone(&captured));

    (spawn_upstream(router).await, captured)
}

// ============================================================================
// Success Tests
// ============================================================================

/// The generated text is returned exactly as the upstream sent it.
#[tokio::test]
async fn test_ask_returns_content_verbatim() {
    let (base_url, _captured) = recording_upstream("Photosynthesis is...").await;
    let client = client_for(&base_url);

    let answer = client.ask("Explain photosynthesis").await.expect("ask failed");

    assert_eq!(answer, "Photosynthesis is...");
}

/// The request carries the bearer key and the documented payload.
#[tokio::test]
async fn test_ask_sends_bearer_key_and_payload() {
    let (base_url, captured) = recording_upstream("ok").await;
    let client = client_for(&base_url);

    client.ask("What is entropy?").await.expect("ask failed");

    let requests = captured.lock().expect("lock poisoned").clone();
    assert_eq!(requests.len(), 1, "Expected exactly one upstream call");

    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["temperature"], 0.7);
    assert_eq!(body["max_tokens"], 800);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(
        body["messages"][0]["content"],
        "You are a helpful study assistant."
    );
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "What is entropy?");
}

/// A trailing slash on the base URL does not produce a double slash.
#[tokio::test]
async fn test_base_url_trailing_slash_is_tolerated() {
    let (base_url, captured) = recording_upstream("ok").await;
    let client = client_for(&format!("{base_url}/"));

    client.ask("ping").await.expect("ask failed");

    assert_eq!(captured.lock().expect("lock poisoned").len(), 1);
}

// ============================================================================
// Failure Tests
// ============================================================================

/// A 5xx status surfaces as a server `Api` error and no text.
#[tokio::test]
async fn test_ask_server_error_status() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let client = client_for(&spawn_upstream(router).await);

    let err = client.ask("anything").await.unwrap_err();

    assert!(
        matches!(
            &err,
            LlmError::Api { kind: LlmErrorKind::Server, status: 500, message } if message.contains("upstream exploded")
        ),
        "Expected Api 500 error, got: {err:?}"
    );
}

/// A 401 status is classified as an authentication failure.
#[tokio::test]
async fn test_ask_unauthorized_status() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"invalid api key"}"#) }),
    );
    let client = client_for(&spawn_upstream(router).await);

    let err = client.ask("anything").await.unwrap_err();

    assert!(
        matches!(
            err,
            LlmError::Api { kind: LlmErrorKind::Authentication, status: 401, .. }
        ),
        "Expected authentication error, got: {err:?}"
    );
}

/// A success status with an unexpected body is a malformed response.
#[tokio::test]
async fn test_ask_malformed_body() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let client = client_for(&spawn_upstream(router).await);

    let err = client.ask("anything").await.unwrap_err();

    assert!(
        matches!(err, LlmError::MalformedResponse(_)),
        "Expected MalformedResponse, got: {err:?}"
    );
}

/// A success status with a non-JSON body is a malformed response.
#[tokio::test]
async fn test_ask_non_json_body() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { "<html>gateway page</html>" }),
    );
    let client = client_for(&spawn_upstream(router).await);

    let err = client.ask("anything").await.unwrap_err();

    assert!(
        matches!(err, LlmError::MalformedResponse(_)),
        "Expected MalformedResponse, got: {err:?}"
    );
}

/// An upstream slower than the timeout yields a `Timeout` error.
#[tokio::test]
async fn test_ask_times_out() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(completion("too late"))
        }),
    );
    let base_url = spawn_upstream(router).await;
    let client = DeepSeekClient::with_options(
        "sk-test",
        ChatOptions::default()
            .with_base_url(base_url)
            .with_timeout(Duration::from_millis(200)),
    )
    .expect("Failed to build client");

    let err = client.ask("anything").await.unwrap_err();

    assert!(err.is_timeout(), "Expected Timeout, got: {err:?}");
}

/// Nothing listening on the port is a transport error, not a timeout.
#[tokio::test]
async fn test_ask_connection_refused() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port();
    let client = client_for(&format!("http://127.0.0.1:{port}"));

    let err = client.ask("anything").await.unwrap_err();

    assert!(
        matches!(err, LlmError::Transport(_)),
        "Expected Transport error, got: {err:?}"
    );
}
