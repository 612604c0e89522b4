//! Conversation history types for the document chatbot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange in a chatbot session.
///
/// History is append-only; only the most recent turns are replayed into
/// future prompts (see [`ConversationTurn::REPLAY_WINDOW`]), older ones
/// are kept for statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// Names of the documents the answer drew on (at most three)
    pub sources: Vec<String>,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Number of prior turns replayed as context for a new question.
    pub const REPLAY_WINDOW: usize = 3;

    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            asked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = ConversationTurn::new("What is the total?", "Ten.", vec!["a.pdf".into()]);
        assert_eq!(turn.question, "What is the total?");
        assert_eq!(turn.sources, vec!["a.pdf"]);
    }
}
