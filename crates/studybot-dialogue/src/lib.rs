//! StudyBot Dialogue Layer
//!
//! Mode dispatch, prompt templating, configuration and the HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod mode;
pub mod prompt;

pub use api::{create_router, AppState, ErrorResponse, StatusResponse, StudyRequest, StudyResponse};
pub use config::{Config, LlmConfig};
pub use error::{Result, StudyError};
pub use manager::DialogueManager;
pub use mode::Mode;
pub use prompt::{PromptBook, PromptTemplate, MAX_PROMPT_SIZE, QUESTION_PLACEHOLDER};
