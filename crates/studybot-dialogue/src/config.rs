//! Configuration types for StudyBot.
//!
//! Settings come from an optional `studybot.json` file; every field has a
//! default so the service runs without one. The API credential is never read
//! from the file, only from the environment variable the file names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use studybot_llm::{
    ChatOptions, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT,
};

use crate::error::{Result, StudyError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "studybot.json";

/// Highest sampling temperature accepted by the upstream API.
const MAX_TEMPERATURE: f64 = 2.0;

/// Default bind address.
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default bind port.
const fn default_port() -> u16 {
    8000
}

/// Default directory holding the prompt templates.
fn default_prompts_dir() -> String {
    "prompts".to_string()
}

/// Default environment variable holding the API key.
fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

const fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

const fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Main configuration for StudyBot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory containing `explain.txt`, `quiz.txt` and `review.txt`.
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,

    /// Name of the environment variable holding the upstream API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upstream model settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            prompts_dir: default_prompts_dir(),
            api_key_env: default_api_key_env(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `studybot.json` in the current directory. If not found,
    /// returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON or
    /// invalid values.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            StudyError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `studybot.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON or
    /// invalid values.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigParseError` if the file exists but cannot be
    /// read or contains invalid JSON.
    ///
    /// Returns `StudyError::ConfigValidationError` if the configuration values
    /// are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(StudyError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| StudyError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(StudyError::config_validation(
                "host must not be empty",
                "Set host to an address such as 127.0.0.1 in your studybot.json",
            ));
        }

        if self.prompts_dir.trim().is_empty() {
            return Err(StudyError::config_validation(
                "promptsDir must not be empty",
                "Provide the directory holding explain.txt, quiz.txt and review.txt in your studybot.json",
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(StudyError::config_validation(
                "apiKeyEnv must not be empty",
                "Set apiKeyEnv to the name of the variable holding your API key (e.g. DEEPSEEK_API_KEY)",
            ));
        }

        self.llm.validate()
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::MissingCredential` if the variable is unset or blank.
    pub fn resolve_api_key(&self) -> Result<String> {
        credential_from(&self.api_key_env, std::env::var(&self.api_key_env).ok())
    }

    /// Returns the `host:port` string the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts a credential value only if it is present and not blank.
fn credential_from(var: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(StudyError::missing_credential(var)),
    }
}

/// Upstream model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// Base URL of the chat-completion API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum number of generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Validates the model settings.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(StudyError::config_validation(
                format!("llm.baseUrl must be an http(s) URL, got '{}'", self.base_url),
                "Set llm.baseUrl to something like https://api.deepseek.com in your studybot.json",
            ));
        }

        if self.model.trim().is_empty() {
            return Err(StudyError::config_validation(
                "llm.model must not be empty",
                "Set llm.model (e.g. deepseek-chat) in your studybot.json",
            ));
        }

        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(StudyError::config_validation(
                format!("llm.temperature must be between 0 and 2, got {}", self.temperature),
                "Set llm.temperature to a value between 0 and 2 in your studybot.json",
            ));
        }

        if self.max_tokens == 0 {
            return Err(StudyError::config_validation(
                "llm.maxTokens must be greater than 0",
                "Set llm.maxTokens to at least 1 in your studybot.json",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(StudyError::config_validation(
                "llm.timeoutSecs must be greater than 0",
                "Set llm.timeoutSecs to at least 1 second in your studybot.json",
            ));
        }

        Ok(())
    }

    /// Converts these settings into client options.
    #[must_use]
    pub fn to_options(&self) -> ChatOptions {
        ChatOptions::default()
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}
