//! Extracted document types - the input to every pipeline stage

use serde::{Deserialize, Serialize};

/// The kind of office document a text was extracted from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Word,
    Powerpoint,
}

impl DocumentKind {
    /// Map a lower-cased file extension (without the dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Word),
            "pptx" => Some(Self::Powerpoint),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pdf => "PDF",
            Self::Word => "Word Document",
            Self::Powerpoint => "PowerPoint Presentation",
        };
        write!(f, "{}", name)
    }
}

/// One page, paragraph or slide of extracted text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUnit {
    /// 1-based page/paragraph/slide number
    pub ordinal: usize,
    pub text: String,
    pub word_count: usize,
}

impl ContentUnit {
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        Self {
            ordinal,
            text,
            word_count,
        }
    }
}

/// Structural metadata gathered during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub kind: DocumentKind,
    /// Total pages (PDF only)
    pub pages: Option<usize>,
    /// Total paragraphs (Word only)
    pub paragraphs: Option<usize>,
    /// Total slides (PowerPoint only)
    pub slides: Option<usize>,
    /// Tables detected in the document body
    pub tables: Option<usize>,
    pub has_images: bool,
    pub has_tables: bool,
    /// Language hint, when one is known
    pub language: Option<String>,
}

impl DocumentMetadata {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            pages: None,
            paragraphs: None,
            slides: None,
            tables: None,
            has_images: false,
            has_tables: false,
            language: None,
        }
    }
}

/// The normalized result of extracting one source file.
///
/// Owned by the extraction layer; every downstream component treats it
/// as read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentText {
    pub units: Vec<ContentUnit>,
    pub metadata: DocumentMetadata,
    /// All unit texts joined with single spaces
    pub full_text: String,
}

impl DocumentText {
    /// Build a document from its units, deriving `full_text`.
    pub fn from_units(units: Vec<ContentUnit>, metadata: DocumentMetadata) -> Self {
        let full_text = units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            units,
            metadata,
            full_text,
        }
    }

    pub fn word_count(&self) -> usize {
        self.full_text.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.full_text.chars().count()
    }

    /// Basic statistics used for display before any analysis runs.
    pub fn digest(&self) -> DocumentDigest {
        let word_count = self.word_count();

        // ALL-CAPS lines near the top of the document often are headings.
        let potential_titles: Vec<String> = self
            .full_text
            .lines()
            .take(20)
            .map(str::trim)
            .filter(|line| {
                !line.is_empty()
                    && line.chars().count() < 100
                    && line.chars().any(|c| c.is_alphabetic())
                    && !line.chars().any(|c| c.is_lowercase())
            })
            .take(5)
            .map(str::to_string)
            .collect();

        DocumentDigest {
            word_count,
            char_count: self.char_count(),
            estimated_reading_minutes: word_count / 200,
            potential_titles,
            kind: self.metadata.kind,
            has_images: self.metadata.has_images,
            has_tables: self.metadata.has_tables,
        }
    }
}

/// Summary statistics for one extracted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDigest {
    pub word_count: usize,
    pub char_count: usize,
    /// Assumes roughly 200 words per minute
    pub estimated_reading_minutes: usize,
    pub potential_titles: Vec<String>,
    pub kind: DocumentKind,
    pub has_images: bool,
    pub has_tables: bool,
}
