//! Chatbot Session - Retrieval-augmented Q&A over a folder of documents
//!
//! The session owns everything it needs: the ingested document records,
//! their chunks, the relevance index built over them, and the
//! conversation history. Nothing outside the session mutates that
//! state; re-ingesting replaces it wholesale.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use doclens_core::{chunk_document, Chunk, ConversationTurn, DocumentKind};

use crate::error::{AgentError, Result};
use crate::llm::{ChatOptions, ChatProvider};
use crate::retrieval::{RelevanceIndex, DEFAULT_TOP_K};

/// Returned by [`ChatbotSession::ask`] before any ingestion happened.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents have been processed yet. Ingest a folder of documents first.";

/// Returned when retrieval finds nothing for a question.
pub const NO_RELEVANT_MESSAGE: &str =
    "No relevant information was found in the processed documents for this question.";

/// One successfully ingested document
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub filename: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub chunk_count: usize,
    pub word_count: usize,
}

/// Usage statistics over the conversation history
#[derive(Debug, Clone)]
pub struct ConversationStats {
    pub total_questions: usize,
    /// Up to three (document, citation count) pairs, most cited first
    pub most_consulted: Vec<(String, usize)>,
    pub avg_sources_per_question: f64,
}

/// Stateful document chatbot over one ingested folder.
pub struct ChatbotSession {
    provider: Arc<dyn ChatProvider>,
    documents: Vec<DocumentInfo>,
    chunks: Vec<Chunk>,
    index: RelevanceIndex,
    history: Vec<ConversationTurn>,
}

impl ChatbotSession {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            documents: Vec::new(),
            chunks: Vec::new(),
            index: RelevanceIndex::build(&[]),
            history: Vec::new(),
        }
    }

    /// Walk a folder recursively and ingest every supported document.
    ///
    /// A file that fails extraction is logged and skipped; its siblings
    /// still load. The relevance index is rebuilt once, after the walk.
    /// Returns the number of documents successfully processed.
    #[instrument(skip(self))]
    pub fn ingest_folder(&mut self, folder: &Path) -> Result<usize> {
        if !folder.is_dir() {
            return Err(AgentError::Processing(format!(
                "not a folder: {}",
                folder.display()
            )));
        }

        let mut documents = Vec::new();
        let mut chunks = Vec::new();

        for entry in WalkDir::new(folder)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !doclens_extract::is_supported(path) {
                continue;
            }

            let doc = match doclens_extract::extract_path(path) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let file_chunks = chunk_document(&doc, &filename, None);

            documents.push(DocumentInfo {
                filename,
                path: path.to_path_buf(),
                kind: doc.metadata.kind,
                chunk_count: file_chunks.len(),
                word_count: doc.word_count(),
            });
            chunks.extend(file_chunks);
        }

        self.documents = documents;
        self.chunks = chunks;
        self.index = RelevanceIndex::build(&self.chunks);

        info!(
            "Processed {} documents into {} chunks",
            self.documents.len(),
            self.chunks.len()
        );

        Ok(self.documents.len())
    }

    /// Answer a question from the ingested documents.
    ///
    /// The turn is recorded in the history even when the completion
    /// fails; the stored answer is then the error-tagged message. The
    /// two fixed refusal messages short-circuit before any model call
    /// and are not recorded.
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        if self.chunks.is_empty() {
            return Ok(NO_DOCUMENTS_MESSAGE.to_string());
        }

        let hits = self.index.query(question, DEFAULT_TOP_K);
        if hits.is_empty() {
            return Ok(NO_RELEVANT_MESSAGE.to_string());
        }

        let relevant: Vec<&Chunk> = hits.iter().map(|hit| &self.chunks[hit.index]).collect();
        let prompt = self.build_prompt(question, &relevant);

        let mut cited: Vec<String> = Vec::new();
        for chunk in relevant.iter().take(3) {
            if !cited.contains(&chunk.document) {
                cited.push(chunk.document.clone());
            }
        }

        let answer = match self
            .provider
            .complete(&prompt, ChatOptions::capable(0.3, 800))
            .await
        {
            Ok(text) => format!("{}{}", text, source_footer(&relevant)),
            Err(e) => format!("Could not generate an answer: {}", e),
        };

        self.history
            .push(ConversationTurn::new(question, answer.clone(), cited));

        Ok(answer)
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Human-readable overview of what the session has loaded.
    pub fn summary(&self) -> String {
        if self.documents.is_empty() {
            return "No documents processed.".to_string();
        }

        let total_words: usize = self.documents.iter().map(|d| d.word_count).sum();
        let mut lines = vec![
            format!("Documents processed: {}", self.documents.len()),
            format!("Total sections: {}", self.chunks.len()),
            format!("Total words: {}", total_words),
            String::new(),
        ];
        for doc in &self.documents {
            lines.push(format!(
                "  - {} ({}) - {} words",
                doc.filename, doc.kind, doc.word_count
            ));
        }
        lines.join("\n")
    }

    /// Citation statistics over the recorded turns.
    pub fn stats(&self) -> ConversationStats {
        if self.history.is_empty() {
            return ConversationStats {
                total_questions: 0,
                most_consulted: Vec::new(),
                avg_sources_per_question: 0.0,
            };
        }

        let mut mentions: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        let mut total_sources = 0usize;
        for turn in &self.history {
            total_sources += turn.sources.len();
            for source in &turn.sources {
                *mentions.entry(source.as_str()).or_insert(0) += 1;
            }
        }

        let mut most_consulted: Vec<(String, usize)> = mentions
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        most_consulted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        most_consulted.truncate(3);

        ConversationStats {
            total_questions: self.history.len(),
            most_consulted,
            avg_sources_per_question: total_sources as f64 / self.history.len() as f64,
        }
    }

    fn build_prompt(&self, question: &str, relevant: &[&Chunk]) -> String {
        let context = relevant
            .iter()
            .map(|chunk| format!("[Document: {}]\n{}", chunk.document, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut history_block = String::new();
        if !self.history.is_empty() {
            history_block.push_str("CONVERSATION HISTORY:\n");
            let start = self
                .history
                .len()
                .saturating_sub(ConversationTurn::REPLAY_WINDOW);
            for turn in &self.history[start..] {
                history_block.push_str(&format!(
                    "Previous question: {}\nPrevious answer: {}\n\n",
                    turn.question, turn.answer
                ));
            }
        }

        format!(
            "You are an assistant that answers questions about a set of documents.\n\n\
             DOCUMENT CONTEXT:\n{}\n\n\
             {}CURRENT QUESTION: {}\n\n\
             INSTRUCTIONS:\n\
             - Answer clearly and objectively\n\
             - Use only information from the documents provided\n\
             - If the answer is not in the documents, say that you did not find it\n\
             - Cite the document name when relevant\n\
             - Stay consistent with the previous conversation\n\n\
             ANSWER:",
            context, history_block, question
        )
    }
}

/// Footer naming the distinct documents an answer drew on.
fn source_footer(relevant: &[&Chunk]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for chunk in relevant {
        if !names.contains(&chunk.document.as_str()) {
            names.push(&chunk.document);
        }
    }
    if names.len() == 1 {
        format!("\n\nBased on document: {}", names[0])
    } else {
        format!("\n\nBased on documents: {}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn make_docx(text: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            text
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn folder_with_documents() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.docx"),
            make_docx("The zebra budget grew by ten percent. It was approved in spring."),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.docx"),
            make_docx("Quantum flux readings were stable across every test run."),
        )
        .unwrap();
        std::fs::write(dir.path().join("bad.pdf"), b"not a real pdf").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored entirely").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_ask_before_ingest_never_calls_the_model() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = ChatbotSession::new(provider.clone());

        let answer = session.ask("anything?").await.unwrap();
        assert_eq!(answer, NO_DOCUMENTS_MESSAGE);
        assert_eq!(provider.call_count(), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_skips_corrupt_files() {
        let dir = folder_with_documents();
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = ChatbotSession::new(provider);

        let count = session.ingest_folder(dir.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.documents().len(), 2);
        assert_eq!(session.documents()[0].filename, "a.docx");
        assert_eq!(session.documents()[1].filename, "b.docx");
        assert_eq!(session.chunk_count(), 2);
    }

    #[tokio::test]
    async fn test_ingest_missing_folder_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = ChatbotSession::new(provider);

        let err = session
            .ingest_folder(Path::new("/no/such/folder"))
            .unwrap_err();
        assert!(matches!(err, AgentError::Processing(_)));
    }

    #[tokio::test]
    async fn test_ask_answers_with_source_footer() {
        let dir = folder_with_documents();
        let provider = Arc::new(ScriptedProvider::new().ok("The zebra budget grew ten percent."));
        let mut session = ChatbotSession::new(provider.clone());
        session.ingest_folder(dir.path()).unwrap();

        let answer = session
            .ask("What happened to the zebra budget?")
            .await
            .unwrap();

        assert!(answer.contains("The zebra budget grew ten percent."));
        assert!(answer.contains("Based on document"));
        assert!(answer.contains("a.docx"));

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].sources, vec!["a.docx"]);

        let prompts = provider.prompts();
        assert!(prompts[0].contains("[Document: a.docx]"));
        assert!(prompts[0].contains("zebra budget"));
    }

    #[tokio::test]
    async fn test_ask_without_relevant_chunks_returns_fixed_message() {
        let dir = folder_with_documents();
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = ChatbotSession::new(provider.clone());
        session.ingest_folder(dir.path()).unwrap();

        let answer = session
            .ask("submarine periscope telescope")
            .await
            .unwrap();
        assert_eq!(answer, NO_RELEVANT_MESSAGE);
        assert_eq!(provider.call_count(), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_ask_records_error_tagged_answer_on_failure() {
        let dir = folder_with_documents();
        let provider = Arc::new(ScriptedProvider::new().fail("socket closed"));
        let mut session = ChatbotSession::new(provider);
        session.ingest_folder(dir.path()).unwrap();

        let answer = session
            .ask("What happened to the zebra budget?")
            .await
            .unwrap();
        assert!(answer.contains("Could not generate an answer"));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].answer, answer);
    }

    #[tokio::test]
    async fn test_second_ask_replays_history() {
        let dir = folder_with_documents();
        let provider = Arc::new(
            ScriptedProvider::new()
                .ok("It grew ten percent.")
                .ok("It was approved in spring."),
        );
        let mut session = ChatbotSession::new(provider.clone());
        session.ingest_folder(dir.path()).unwrap();

        session
            .ask("What happened to the zebra budget?")
            .await
            .unwrap();
        session.ask("When was the zebra budget approved?").await.unwrap();

        let prompts = provider.prompts();
        assert!(prompts[1].contains("CONVERSATION HISTORY"));
        assert!(prompts[1].contains("Previous question: What happened to the zebra budget?"));
    }

    #[tokio::test]
    async fn test_summary_and_stats() {
        let dir = folder_with_documents();
        let provider = Arc::new(ScriptedProvider::new().ok("Grew."));
        let mut session = ChatbotSession::new(provider);
        session.ingest_folder(dir.path()).unwrap();

        let summary = session.summary();
        assert!(summary.contains("Documents processed: 2"));
        assert!(summary.contains("a.docx"));

        session
            .ask("What happened to the zebra budget?")
            .await
            .unwrap();
        let stats = session.stats();
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.most_consulted[0].0, "a.docx");
        assert!((stats.avg_sources_per_question - 1.0).abs() < 1e-9);

        session.clear_history();
        assert_eq!(session.stats().total_questions, 0);
    }
}
