//! DeepSeek chat-completion client.
//!
//! Sends one system message and one user message per request and returns the
//! content of the first choice. The endpoint is OpenAI-compatible, so any
//! service speaking the same `/chat/completions` dialect works when the base
//! URL is overridden.
//!
//! # Example
//!
//! ```no_run
//! use studybot_llm::{DeepSeekClient, LlmClient};
//!
//! # async fn example() -> studybot_llm::Result<()> {
//! let client = DeepSeekClient::new("sk-...")?;
//! let answer = client.ask("Explain photosynthesis in two sentences.").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{LlmClient, LlmError, Result};

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// System instruction sent ahead of every prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful study assistant.";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default maximum number of generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path appended to the base URL.
const COMPLETIONS_PATH: &str = "/chat/completions";

/// Generation and transport settings for [`DeepSeekClient`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use studybot_llm::ChatOptions;
///
/// let options = ChatOptions::default()
///     .with_base_url("http://127.0.0.1:9000")
///     .with_max_tokens(200)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(options.max_tokens, 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// Base URL of the upstream API, without the completions path.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// System instruction.
    pub system_prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum number of generated tokens.
    pub max_tokens: u32,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ChatOptions {
    /// Sets the upstream base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum number of generated tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Extracts `choices[0].message.content` from a response body.
fn parse_completion(body: &[u8]) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_slice(body).map_err(|e| LlmError::malformed(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| LlmError::malformed("response contained no choices"))
}

// ============================================================================
// Client
// ============================================================================

/// Client for the DeepSeek chat-completion API.
///
/// Holds the credential and a pooled HTTP client. Calls only borrow `self`.
#[derive(Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    options: ChatOptions,
}

impl std::fmt::Debug for DeepSeekClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekClient")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl DeepSeekClient {
    /// Creates a client with default [`ChatOptions`].
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `api_key` is empty or whitespace.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, ChatOptions::default())
    }

    /// Creates a client with explicit options.
    ///
    /// No network activity happens here.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `api_key` is empty or whitespace,
    /// or `LlmError::Transport` if the HTTP client cannot be initialized.
    pub fn with_options(api_key: impl Into<String>, options: ChatOptions) -> Result<Self> {
        let api_key: String = api_key.into();
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let http = reqwest::Client::builder().timeout(options.timeout).build()?;
        let endpoint = format!(
            "{}{COMPLETIONS_PATH}",
            options.base_url.trim_end_matches('/')
        );

        Ok(Self {
            http,
            api_key,
            endpoint,
            options,
        })
    }

    /// Returns the full completions URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the options this client was built with.
    #[must_use]
    pub const fn options(&self) -> &ChatOptions {
        &self.options
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.options.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.options.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                timeout: self.options.timeout,
            }
        } else {
            LlmError::Transport(err)
        }
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    #[instrument(skip_all, fields(model = %self.options.model, prompt_len = prompt.len()))]
    async fn ask(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<body unavailable: {e}>"));
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(LlmError::api(status.as_u16(), &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let answer = parse_completion(&body)?;

        debug!(answer_len = answer.len(), "Completion received");
        Ok(answer)
    }
}
