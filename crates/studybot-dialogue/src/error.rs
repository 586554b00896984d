//! Error types for the StudyBot dialogue layer.
//!
//! This module defines the error hierarchy for configuration loading,
//! credential resolution, prompt template loading, and upstream model calls.

use std::path::PathBuf;

use studybot_llm::LlmError;

use crate::mode::Mode;

/// A specialized `Result` type for dialogue operations.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Errors that can occur while starting or running StudyBot.
///
/// Startup variants carry an actionable suggestion. Upstream failures are
/// wrapped unchanged so the HTTP layer can map them to status codes.
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your studybot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The API credential environment variable is unset or blank.
    #[error("{var} is not set\n\nSuggestion: Export {var} or add it to a .env file in the working directory")]
    MissingCredential {
        /// Name of the environment variable that was checked.
        var: String,
    },

    // ========================================================================
    // Prompt Template Errors
    // ========================================================================
    /// A mode's template file was not found.
    #[error("Prompt template for mode '{mode}' not found: '{path}'\n\nSuggestion: Check the 'promptsDir' field in studybot.json or create the file")]
    PromptNotFound {
        /// Mode the template belongs to.
        mode: Mode,
        /// Path where the template was expected.
        path: PathBuf,
    },

    /// A template file exceeds the size limit.
    #[error("Prompt template exceeds size limit (64KB): '{path}' is {size_kb}KB\n\nSuggestion: Shorten the template")]
    PromptTooLarge {
        /// Path to the oversized template.
        path: PathBuf,
        /// Actual size in kilobytes.
        size_kb: u64,
    },

    /// A template file contains non-UTF-8 content.
    #[error("Prompt template has invalid encoding: '{path}'\n\nSuggestion: Convert the file to UTF-8 encoding")]
    PromptEncodingError {
        /// Path to the template with encoding issues.
        path: PathBuf,
    },

    /// A template file exists but could not be read.
    #[error("Prompt template for mode '{mode}' could not be read: '{path}': {source}\n\nSuggestion: Check that the path is a regular file readable by the server")]
    PromptUnreadable {
        /// Mode the template belongs to.
        mode: Mode,
        /// Path to the template.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A template does not contain exactly one question placeholder.
    #[error("Prompt template for mode '{mode}' must contain {{question}} exactly once, found {found}\n\nSuggestion: Edit the template so the question appears in a single place")]
    InvalidPrompt {
        /// Mode the template belongs to.
        mode: Mode,
        /// Number of placeholders found.
        found: usize,
    },

    // ========================================================================
    // Upstream Errors
    // ========================================================================
    /// The LLM client failed to build or to answer.
    #[error(transparent)]
    Llm(#[from] LlmError),

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudyError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    /// Creates a new `PromptNotFound` error.
    #[must_use]
    pub fn prompt_not_found(mode: Mode, path: impl Into<PathBuf>) -> Self {
        Self::PromptNotFound {
            mode,
            path: path.into(),
        }
    }

    /// Creates a new `PromptTooLarge` error.
    #[must_use]
    pub fn prompt_too_large(path: impl Into<PathBuf>, size_kb: u64) -> Self {
        Self::PromptTooLarge {
            path: path.into(),
            size_kb,
        }
    }

    /// Creates a new `PromptEncodingError`.
    #[must_use]
    pub fn prompt_encoding(path: impl Into<PathBuf>) -> Self {
        Self::PromptEncodingError { path: path.into() }
    }

    /// Creates a new `PromptUnreadable` error.
    #[must_use]
    pub fn prompt_unreadable(mode: Mode, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PromptUnreadable {
            mode,
            path: path.into(),
            source,
        }
    }

    /// Creates a new `InvalidPrompt` error.
    #[must_use]
    pub const fn invalid_prompt(mode: Mode, found: usize) -> Self {
        Self::InvalidPrompt { mode, found }
    }

    /// Returns `true` if this error prevents the service from starting.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::MissingCredential { .. }
                | Self::PromptNotFound { .. }
                | Self::PromptTooLarge { .. }
                | Self::PromptEncodingError { .. }
                | Self::PromptUnreadable { .. }
                | Self::InvalidPrompt { .. }
                | Self::Llm(LlmError::MissingApiKey)
        )
    }
}
