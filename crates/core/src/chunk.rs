//! Sentence-boundary text chunker.
//!
//! Splits a document's full text into [`Chunk`]s bounded by a maximum
//! character length. Splitting never cuts a sentence in half: sentences
//! are accumulated until the next one would push the buffer past the
//! limit, then the buffer is sealed. A single sentence longer than the
//! limit becomes a chunk on its own.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentKind, DocumentMetadata, DocumentText};

/// Default chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// A contiguous, sentence-aligned span of one document's text.
///
/// Chunks are created in one pass over the full text and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Source document identifier (usually the file name)
    pub document: String,
    /// Ordinal position within the source document, starting at 0
    pub index: usize,
    pub kind: DocumentKind,
}

/// Split an extracted document into chunks, adapting the limit to the
/// document's scale.
///
/// Large PDFs get wider chunks so the chunk count stays manageable:
/// more than 50 pages raises the limit to 5000 characters, more than
/// 100 pages to 6000.
pub fn chunk_document(
    doc: &DocumentText,
    source: &str,
    max_chunk_size: Option<usize>,
) -> Vec<Chunk> {
    let max = adapt_chunk_size(
        max_chunk_size.unwrap_or(DEFAULT_MAX_CHUNK_SIZE),
        &doc.metadata,
    );
    chunk_text(&doc.full_text, source, doc.metadata.kind, max)
}

fn adapt_chunk_size(base: usize, metadata: &DocumentMetadata) -> usize {
    if metadata.kind == DocumentKind::Pdf {
        if let Some(pages) = metadata.pages {
            if pages > 100 {
                return 6000;
            }
            if pages > 50 {
                return 5000;
            }
        }
    }
    base
}

/// Split raw text into sentence-aligned chunks of at most
/// `max_chunk_size` characters.
///
/// Sentence candidates come from splitting on `.`, `!` and `?`; the
/// delimiters are discarded and every appended sentence gets a uniform
/// ". " terminator. Empty input yields an empty vector.
pub fn chunk_text(
    text: &str,
    source: &str,
    kind: DocumentKind,
    max_chunk_size: usize,
) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;
    let mut index = 0usize;

    for candidate in text.split(['.', '!', '?']) {
        let sentence = candidate.trim();
        if sentence.is_empty() {
            continue;
        }

        let sentence_chars = sentence.chars().count();
        if buffer_chars + sentence_chars <= max_chunk_size {
            buffer.push_str(sentence);
            buffer.push_str(". ");
            buffer_chars += sentence_chars + 2;
        } else {
            if !buffer.is_empty() {
                chunks.push(seal(&buffer, source, index, kind));
                index += 1;
            }
            buffer.clear();
            buffer.push_str(sentence);
            buffer.push_str(". ");
            buffer_chars = sentence_chars + 2;
        }
    }

    if !buffer.trim().is_empty() {
        chunks.push(seal(&buffer, source, index, kind));
    }

    chunks
}

fn seal(buffer: &str, source: &str, index: usize, kind: DocumentKind) -> Chunk {
    Chunk {
        text: buffer.trim().to_string(),
        document: source.to_string(),
        index,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ContentUnit, DocumentMetadata, DocumentText};

    fn chunks_of(text: &str, max: usize) -> Vec<Chunk> {
        chunk_text(text, "doc.pdf", DocumentKind::Pdf, max)
    }

    /// Flatten chunk texts back into the sentence list they were built from.
    fn sentences_in(chunks: &[Chunk]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.text.split('.'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunks_of("", 4000).is_empty());
        assert!(chunks_of("   \n  ", 4000).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunks_of("Alpha one. Beta two! Gamma three?", 4000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Alpha one. Beta two. Gamma three.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].document, "doc.pdf");
    }

    #[test]
    fn test_reconstructs_all_sentences_in_order() {
        let text = (0..40)
            .map(|i| format!("Sentence number {} here", i))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunks_of(&text, 120);
        assert!(chunks.len() > 1);

        let rebuilt = sentences_in(&chunks);
        let expected: Vec<String> = (0..40).map(|i| format!("Sentence number {} here", i)).collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn test_chunks_respect_max_size() {
        // Uniform short sentences keep sealed chunks under the limit.
        let text = (0..30)
            .map(|_| "ten chars!".to_string())
            .collect::<Vec<_>>()
            .join(" ");
        for chunk in chunks_of(&text, 50) {
            assert!(
                chunk.text.chars().count() <= 50,
                "chunk too long: {:?}",
                chunk.text
            );
        }
    }

    #[test]
    fn test_oversized_sentence_becomes_own_chunk() {
        let long = "x".repeat(80);
        let text = format!("Short one. {}. Short two.", long);
        let chunks = chunks_of(&text, 50);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "Short one.");
        assert_eq!(chunks[1].text, format!("{}.", long));
        assert!(chunks[1].text.chars().count() > 50);
        assert_eq!(chunks[2].text, "Short two.");
    }

    #[test]
    fn test_indices_contiguous() {
        let text = (0..20)
            .map(|i| format!("Sentence {}", i))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunks_of(&text, 40);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_pdf_page_count_widens_limit() {
        let mut metadata = DocumentMetadata::new(DocumentKind::Pdf);
        metadata.pages = Some(60);
        assert_eq!(adapt_chunk_size(4000, &metadata), 5000);

        metadata.pages = Some(150);
        assert_eq!(adapt_chunk_size(4000, &metadata), 6000);

        metadata.pages = Some(10);
        assert_eq!(adapt_chunk_size(4000, &metadata), 4000);
    }

    #[test]
    fn test_non_pdf_keeps_default() {
        let metadata = DocumentMetadata::new(DocumentKind::Word);
        assert_eq!(adapt_chunk_size(4000, &metadata), 4000);
    }

    #[test]
    fn test_chunk_document_uses_metadata() {
        let mut metadata = DocumentMetadata::new(DocumentKind::Pdf);
        metadata.pages = Some(2);
        let doc = DocumentText::from_units(
            vec![ContentUnit::new(1, "One sentence. Another sentence.")],
            metadata,
        );
        let chunks = chunk_document(&doc, "report.pdf", None);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, DocumentKind::Pdf);
    }
}
