//! Study modes.

use serde::{Deserialize, Serialize};

/// Instructional framing requested by the user.
///
/// Each mode selects one prompt template. The set is closed: the HTTP layer
/// rejects any other value before it reaches the dialogue manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Explain a concept step by step.
    Explain,
    /// Generate practice questions.
    Quiz,
    /// Summarize key points for revision.
    Review,
}

impl Mode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 3] = [Self::Explain, Self::Quiz, Self::Review];

    /// Returns the wire name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Quiz => "quiz",
            Self::Review => "review",
        }
    }

    /// Returns the file name of this mode's template inside the prompts directory.
    #[must_use]
    pub const fn template_file(&self) -> &'static str {
        match self {
            Self::Explain => "explain.txt",
            Self::Quiz => "quiz.txt",
            Self::Review => "review.txt",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
