//! The dialogue manager: mode dispatch, templating and delegation.

use std::sync::Arc;

use studybot_llm::{DeepSeekClient, LlmClient};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::mode::Mode;
use crate::prompt::PromptBook;

/// Turns a `(mode, question)` pair into an answer from the upstream model.
///
/// Holds only immutable state, so one instance is shared by every request.
#[derive(Clone)]
pub struct DialogueManager {
    prompts: PromptBook,
    llm: Arc<dyn LlmClient>,
}

impl std::fmt::Debug for DialogueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueManager")
            .field("prompts", &self.prompts)
            .finish_non_exhaustive()
    }
}

impl DialogueManager {
    /// Assembles a manager from a prompt book and any LLM client.
    #[must_use]
    pub fn new(prompts: PromptBook, llm: Arc<dyn LlmClient>) -> Self {
        Self { prompts, llm }
    }

    /// Builds the production manager from configuration.
    ///
    /// Resolves the API key from the environment, then loads every template.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::MissingCredential` if the key is absent, or any
    /// error from [`DialogueManager::with_api_key`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Builds the production manager with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Llm` if the client cannot be built, or a prompt
    /// error if any template is missing or invalid.
    pub fn with_api_key(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let client = DeepSeekClient::with_options(api_key, config.llm.to_options())?;
        let prompts = PromptBook::load(&config.prompts_dir)?;

        info!(
            prompts_dir = %config.prompts_dir,
            endpoint = %client.endpoint(),
            model = %client.options().model,
            "Dialogue manager ready"
        );

        Ok(Self::new(prompts, Arc::new(client)))
    }

    /// Returns the loaded prompt book.
    #[must_use]
    pub const fn prompts(&self) -> &PromptBook {
        &self.prompts
    }

    /// Produces the prompt sent upstream for `mode` and `question`.
    ///
    /// Falls back to the raw question when the book has no template for
    /// `mode`. Books from [`PromptBook::load`] are always complete, so this
    /// only happens with hand-assembled books.
    #[must_use]
    pub fn build_prompt(&self, mode: Mode, question: &str) -> String {
        if let Some(template) = self.prompts.get(mode) {
            template.render(question)
        } else {
            warn!(mode = %mode, "No template registered for mode; sending raw question");
            question.to_string()
        }
    }

    /// Answers `question` in the given mode.
    ///
    /// Makes exactly one upstream call and returns its text unmodified.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Llm` if the upstream call fails.
    pub async fn handle(&self, mode: Mode, question: &str) -> Result<String> {
        let prompt = self.build_prompt(mode, question);
        debug!(mode = %mode, prompt_len = prompt.len(), "Prompt built");

        let answer = self.llm.ask(&prompt).await?;
        Ok(answer)
    }
}
