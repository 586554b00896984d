//! End-to-end tests for the StudyBot HTTP API.
//!
//! A fake upstream stands in for the chat-completion API; the StudyBot
//! router runs on its own ephemeral port and is driven over real HTTP.

use std::path::PathBuf;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use studybot_dialogue::{
    create_router, AppState, Config, DialogueManager, ErrorResponse, Mode, PromptBook,
    StatusResponse, StudyResponse, QUESTION_PLACEHOLDER,
};

/// Path to the prompts shipped with the repository.
fn prompts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join("prompts"))
        .expect("Failed to find prompts directory")
}

/// Spawns `router` on an ephemeral port and returns its base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

/// Fake upstream that answers with the user message it received.
fn echo_upstream() -> Router {
    Router::new().route(
        "/chat/completions",
        post(|Json(body): Json<Value>| async move {
            let prompt = body["messages"][1]["content"].clone();
            Json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": prompt}}]
            }))
        }),
    )
}

/// Starts StudyBot against the given upstream and returns its base URL.
async fn spawn_studybot(upstream: Router, timeout_secs: u64) -> String {
    let upstream_url = spawn(upstream).await;

    let mut config = Config {
        prompts_dir: prompts_dir().display().to_string(),
        ..Default::default()
    };
    config.llm.base_url = upstream_url;
    config.llm.timeout_secs = timeout_secs;
    config.validate().expect("Test config should be valid");

    let manager =
        DialogueManager::with_api_key(&config, "sk-test").expect("Failed to build manager");
    spawn(create_router(AppState::new(manager))).await
}

/// Posts a study request and returns the raw response.
async fn post_study(base_url: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base_url}/study"))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
}

// ============================================================================
// Happy Path
// ============================================================================

/// A quiz request reaches the upstream wrapped in the quiz template.
#[tokio::test]
async fn test_quiz_request_end_to_end() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;

    let response = post_study(
        &base_url,
        &json!({"mode": "quiz", "question": "Newton's laws"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: StudyResponse = response.json().await.expect("Invalid response body");

    let book = PromptBook::load(prompts_dir()).expect("Failed to load prompts");
    let quiz = book.get(Mode::Quiz).expect("quiz template").text();
    let (before, after) = quiz
        .split_once(QUESTION_PLACEHOLDER)
        .expect("quiz template placeholder");

    assert!(body.answer.contains("Newton's laws"));
    assert!(body.answer.starts_with(before));
    assert!(body.answer.ends_with(after));
    assert_eq!(body.answer, quiz.replacen(QUESTION_PLACEHOLDER, "Newton's laws", 1));
}

/// Each mode selects its own template.
#[tokio::test]
async fn test_each_mode_uses_its_template() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;
    let book = PromptBook::load(prompts_dir()).expect("Failed to load prompts");

    for mode in Mode::ALL {
        let response = post_study(
            &base_url,
            &json!({"mode": mode.as_str(), "question": "the Krebs cycle"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "mode {mode}");

        let body: StudyResponse = response.json().await.expect("Invalid response body");
        let expected = book
            .get(mode)
            .expect("template")
            .render("the Krebs cycle");
        assert_eq!(body.answer, expected, "mode {mode}");
    }
}

/// Concurrent requests are answered independently.
#[tokio::test]
async fn test_concurrent_requests() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let base_url = base_url.clone();
            tokio::spawn(async move {
                let question = format!("topic number {i}");
                let response =
                    post_study(&base_url, &json!({"mode": "explain", "question": question})).await;
                let body: StudyResponse = response.json().await.expect("Invalid response body");
                (question, body.answer)
            })
        })
        .collect();

    for handle in handles {
        let (question, answer) = handle.await.expect("Task panicked");
        assert!(answer.contains(&question));
    }
}

/// The root and UI routes respond without touching the upstream.
#[tokio::test]
async fn test_root_and_ui_routes() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;

    let status: StatusResponse = reqwest::get(format!("{base_url}/"))
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid status body");
    assert_eq!(status.status, "ok");
    assert_eq!(status.bot, "studybot");

    let ui = reqwest::get(format!("{base_url}/ui"))
        .await
        .expect("Failed to send request");
    assert_eq!(ui.status(), StatusCode::OK);
    let html = ui.text().await.expect("Invalid UI body");
    assert!(html.contains("/study"));
}

// ============================================================================
// Error Paths
// ============================================================================

/// An unknown mode is rejected before reaching the upstream.
#[tokio::test]
async fn test_unknown_mode_rejected() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;

    let response = post_study(
        &base_url,
        &json!({"mode": "summarize", "question": "Newton's laws"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// An upstream 500 becomes a 502 with an error body.
#[tokio::test]
async fn test_upstream_failure_becomes_bad_gateway() {
    let upstream = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base_url = spawn_studybot(upstream, 30).await;

    let response = post_study(&base_url, &json!({"mode": "review", "question": "mitosis"})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: ErrorResponse = response.json().await.expect("Invalid error body");
    assert!(body.error.contains("500"));
}

/// An upstream slower than the configured timeout becomes a 504.
#[tokio::test]
async fn test_upstream_timeout_becomes_gateway_timeout() {
    let upstream = Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"choices": [{"message": {"content": "too late"}}]}))
        }),
    );
    let base_url = spawn_studybot(upstream, 1).await;

    let response = post_study(&base_url, &json!({"mode": "explain", "question": "entropy"})).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

/// A blank question never reaches the upstream.
#[tokio::test]
async fn test_blank_question_rejected() {
    let base_url = spawn_studybot(echo_upstream(), 30).await;

    let response = post_study(&base_url, &json!({"mode": "quiz", "question": "  "})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Startup fails fast when a template is missing.
#[test]
fn test_manager_requires_complete_prompts() {
    let config = Config {
        prompts_dir: "/nonexistent/prompts".to_string(),
        ..Default::default()
    };

    let err = DialogueManager::with_api_key(&config, "sk-test").unwrap_err();
    assert!(err.is_fatal(), "Expected fatal error, got: {err:?}");
}
