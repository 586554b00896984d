//! Prompt templates for the StudyBot dialogue manager.
//!
//! Each [`Mode`] has one plain-text template on disk containing a single
//! `{question}` placeholder. Templates are read once at startup into a
//! [`PromptBook`] and never change afterwards.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, StudyError};
use crate::mode::Mode;

/// The placeholder replaced by the user's question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Maximum allowed template file size in bytes (64KB).
pub const MAX_PROMPT_SIZE: u64 = 64 * 1024;

/// A validated prompt template for one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    mode: Mode,
    text: String,
}

impl PromptTemplate {
    /// Creates a template from text.
    ///
    /// Braces other than the placeholder are kept literally, so templates may
    /// contain LaTeX such as `\frac{a}{b}`.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidPrompt` unless `text` contains
    /// [`QUESTION_PLACEHOLDER`] exactly once.
    pub fn new(mode: Mode, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let found = text.matches(QUESTION_PLACEHOLDER).count();
        if found != 1 {
            return Err(StudyError::invalid_prompt(mode, found));
        }
        Ok(Self { mode, text })
    }

    /// Loads the template for `mode` from `dir`.
    ///
    /// The file name comes from [`Mode::template_file`].
    ///
    /// # Errors
    ///
    /// Returns `StudyError::PromptNotFound` if the file doesn't exist.
    /// Returns `StudyError::PromptTooLarge` if the file exceeds 64KB.
    /// Returns `StudyError::PromptEncodingError` if the file is not valid UTF-8.
    /// Returns `StudyError::PromptUnreadable` if the file exists but cannot be read.
    /// Returns `StudyError::InvalidPrompt` if the placeholder count is not one.
    pub fn load(mode: Mode, dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(mode.template_file());

        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StudyError::prompt_not_found(mode, &path)
            } else {
                StudyError::prompt_unreadable(mode, &path, e)
            }
        })?;

        let file_size = metadata.len();
        if file_size > MAX_PROMPT_SIZE {
            return Err(StudyError::prompt_too_large(&path, file_size / 1024));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                StudyError::prompt_encoding(&path)
            } else {
                StudyError::prompt_unreadable(mode, &path, e)
            }
        })?;

        debug!(mode = %mode, path = %path.display(), size = file_size, "Prompt template loaded");
        Self::new(mode, text)
    }

    /// Returns the mode this template belongs to.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes `question` into the placeholder.
    ///
    /// The question is inserted verbatim; placeholder text inside the
    /// question itself is not expanded again.
    #[must_use]
    pub fn render(&self, question: &str) -> String {
        self.text.replacen(QUESTION_PLACEHOLDER, question, 1)
    }
}

/// The mode-to-template mapping owned by the dialogue manager.
#[derive(Debug, Clone, Default)]
pub struct PromptBook {
    templates: HashMap<Mode, PromptTemplate>,
}

impl PromptBook {
    /// Loads one template per mode from `dir`.
    ///
    /// The returned book is always complete; any missing or invalid template
    /// aborts the load.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`PromptTemplate::load`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let templates = Mode::ALL
            .into_iter()
            .map(|mode| PromptTemplate::load(mode, dir).map(|template| (mode, template)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { templates })
    }

    /// Builds a book from already constructed templates.
    ///
    /// Later templates replace earlier ones for the same mode. The book may
    /// be incomplete; see [`PromptBook::is_complete`].
    #[must_use]
    pub fn from_templates(templates: impl IntoIterator<Item = PromptTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.mode(), template))
                .collect(),
        }
    }

    /// Returns the template for `mode`, if present.
    #[must_use]
    pub fn get(&self, mode: Mode) -> Option<&PromptTemplate> {
        self.templates.get(&mode)
    }

    /// Returns `true` if every mode has a template.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Mode::ALL.iter().all(|mode| self.templates.contains_key(mode))
    }

    /// Returns the number of templates in the book.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the book holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
