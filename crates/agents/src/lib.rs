//! LLM-backed agents for DocLens
//!
//! This crate contains the pieces that sit between extracted documents
//! and the language model:
//! - Analyst: runs the per-chunk analysis strategies and consolidates
//!   their results
//! - Chatbot: retrieval-augmented question answering over a folder of
//!   documents
//! - RelevanceIndex: lexical top-k retrieval with a keyword fallback
//! - ChatProvider: the completion transport abstraction

pub mod analyst;
pub mod chatbot;
pub mod error;
pub mod llm;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod testing;

pub use analyst::AnalystAgent;
pub use chatbot::{ChatbotSession, ConversationStats, DocumentInfo};
pub use error::{AgentError, Result};
pub use llm::{ChatOptions, ChatProvider, LlmConfig, ModelTier, OpenAiProvider};
pub use retrieval::{Hit, RelevanceIndex, DEFAULT_TOP_K};
