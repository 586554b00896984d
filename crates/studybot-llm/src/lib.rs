//! StudyBot LLM Client
//!
//! Chat-completion adapter used by the dialogue manager.
//!
//! This crate turns a single text prompt into an upstream chat-completion
//! request and extracts the generated text from the response. The
//! [`LlmClient`] trait is the seam the dialogue layer depends on;
//! [`DeepSeekClient`] is the production implementation.

pub mod deepseek;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use deepseek::{
    ChatOptions, DeepSeekClient, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};

/// A specialized `Result` type for LLM client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Maximum number of characters of an upstream error body kept in an error.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors that can occur while talking to the upstream model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The client was constructed without a usable API key.
    #[error("API key is missing or empty")]
    MissingApiKey,

    /// The upstream API answered with a non-success status.
    #[error("upstream returned HTTP {status} ({kind}): {message}")]
    Api {
        /// Classification of the failure.
        kind: LlmErrorKind,
        /// HTTP status code returned by the upstream API.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("upstream request timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Connection, TLS or body transfer failure.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected completion shape.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Creates an `Api` error from a status code and raw response body.
    #[must_use]
    pub fn api(status: u16, body: &str) -> Self {
        let message = if body.chars().count() > MAX_ERROR_BODY_CHARS {
            let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("{truncated}...")
        } else {
            body.to_string()
        };

        Self::Api {
            kind: LlmErrorKind::from_status(status),
            status,
            message,
        }
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Returns `true` if the upstream did not answer in time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Categories of upstream API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Authentication failure (invalid API key, expired credentials).
    Authentication,
    /// Rate limit exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Other unclassified errors.
    Other,
}

impl LlmErrorKind {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check your API key or credentials",
            Self::RateLimit => "Reduce request frequency or check your plan limits",
            Self::Server => "Try again later; the LLM service may be experiencing issues",
            Self::Other => "Check the LLM provider's status page",
        }
    }
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A client that answers a single text prompt.
///
/// Implementors own transport and vendor details. Each call is one upstream
/// request with no retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `prompt` to the model and returns the generated text.
    async fn ask(&self, prompt: &str) -> Result<String>;
}
