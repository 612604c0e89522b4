//! Core domain types for DocLens
//!
//! This crate defines the fundamental data structures used throughout
//! the application: extracted documents, text chunks, analysis results,
//! and conversation history.

pub mod analysis;
pub mod chunk;
pub mod conversation;
pub mod document;
pub mod error;
pub mod profile;

pub use analysis::{
    AnalysisKind, AnalysisResult, ClauseAnalysis, ClauseRecord, ExecutiveSummary, ExtractedData,
    GeneralAnalysis, Importance, Timeline, TimelineEvent, TopicAnalysis, TopicBranch, TopicReport,
};
pub use chunk::{chunk_document, chunk_text, Chunk, DEFAULT_MAX_CHUNK_SIZE};
pub use conversation::ConversationTurn;
pub use document::{ContentUnit, DocumentDigest, DocumentKind, DocumentMetadata, DocumentText};
pub use error::{CoreError, Result};
pub use profile::{DocumentProfile, DocumentStructure};
