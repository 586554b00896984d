//! HTTP API endpoints for StudyBot.
//!
//! # Endpoints
//!
//! - `POST /study` - Answer a question in the requested mode
//! - `GET /` - Liveness check
//! - `GET /ui` - Browser front-end
//!
//! # Example
//!
//! ```no_run
//! use studybot_dialogue::{create_router, AppState, Config, DialogueManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let manager = DialogueManager::from_config(&config)?;
//!
//! let router = create_router(AppState::new(manager));
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{DialogueManager, Mode, StudyError};

/// Static front-end served at `/ui`.
const UI_PAGE: &str = include_str!("../assets/ui.html");

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the study endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyRequest {
    /// Requested study mode.
    pub mode: Mode,
    /// The user's question or topic.
    pub question: String,
}

/// Response body for the study endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyResponse {
    /// Text generated by the upstream model, unmodified.
    pub answer: String,
}

/// Response body for the liveness endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"ok"` while the server is up.
    pub status: String,
    /// Service name.
    pub bot: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The dialogue manager answering study requests.
    pub manager: DialogueManager,
}

impl AppState {
    /// Creates a new `AppState` around a ready manager.
    #[must_use]
    pub const fn new(manager: DialogueManager) -> Self {
        Self { manager }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request was well-formed JSON but unusable.
    InvalidRequest(String),
    /// The upstream model did not answer in time.
    UpstreamTimeout(String),
    /// The upstream model failed or answered with an unexpected shape.
    Upstream(String),
    /// Anything else.
    Internal(String),
}

impl From<StudyError> for ApiError {
    fn from(err: StudyError) -> Self {
        match &err {
            StudyError::Llm(llm) if llm.is_timeout() => Self::UpstreamTimeout(err.to_string()),
            StudyError::Llm(_) => Self::Upstream(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all endpoints.
///
/// The router carries CORS middleware allowing any origin and a tracing
/// layer logging every request.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/ui", get(handle_ui))
        .route("/study", post(handle_study))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `POST /study`.
async fn handle_study(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StudyRequest>,
) -> Result<Json<StudyResponse>, ApiError> {
    info!(
        mode = %request.mode,
        question_len = request.question.len(),
        "Received study request"
    );

    if request.question.trim().is_empty() {
        warn!(mode = %request.mode, "Rejecting study request with empty question");
        return Err(ApiError::InvalidRequest(
            "question must not be empty".to_string(),
        ));
    }

    let answer = state
        .manager
        .handle(request.mode, &request.question)
        .await
        .map_err(|e| {
            warn!(mode = %request.mode, error = %e, "Study request failed");
            ApiError::from(e)
        })?;

    info!(
        mode = %request.mode,
        answer_len = answer.len(),
        "Study request answered"
    );

    Ok(Json(StudyResponse { answer }))
}

/// Handler for `GET /`.
async fn handle_root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        bot: "studybot".to_string(),
    })
}

/// Handler for `GET /ui`.
async fn handle_ui() -> Html<&'static str> {
    Html(UI_PAGE)
}

// ============================================================================
// Tests
// ============================================================================
