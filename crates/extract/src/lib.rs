//! Text extraction for office documents
//!
//! Turns PDF, Word and PowerPoint files into the normalized
//! [`DocumentText`] structure the rest of the pipeline consumes.
//! Extraction is keyed by file extension; anything else is rejected
//! with an [`ExtractError`].

pub mod error;
mod ooxml;
mod pdf;

pub use error::{ExtractError, Result};

use std::path::Path;

use doclens_core::{DocumentKind, DocumentText};
use tracing::debug;

/// File extensions (lower-case, without dot) the extractor accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "pptx"];

/// Check whether a path has a supported document extension.
pub fn is_supported(path: &Path) -> bool {
    document_kind(path).is_some()
}

/// Determine the document kind from a path's extension.
pub fn document_kind(path: &Path) -> Option<DocumentKind> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| DocumentKind::from_extension(&ext.to_lowercase()))
}

/// Extract text and metadata from a document on disk.
pub fn extract_path(path: &Path) -> Result<DocumentText> {
    let kind = document_kind(path).ok_or_else(|| {
        ExtractError::Unsupported(
            path.extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("(none)")
                .to_string(),
        )
    })?;

    debug!("Extracting {} from {}", kind, path.display());
    let bytes = std::fs::read(path)?;
    extract_bytes(&bytes, kind)
}

/// Extract text and metadata from in-memory document bytes.
pub fn extract_bytes(bytes: &[u8], kind: DocumentKind) -> Result<DocumentText> {
    match kind {
        DocumentKind::Pdf => pdf::extract(bytes),
        DocumentKind::Word => ooxml::extract_docx(bytes),
        DocumentKind::Powerpoint => ooxml::extract_pptx(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(&PathBuf::from("report.pdf")));
        assert!(is_supported(&PathBuf::from("Memo.DOCX")));
        assert!(!is_supported(&PathBuf::from("notes.txt")));
        assert!(!is_supported(&PathBuf::from("bare")));
    }

    #[test]
    fn test_unsupported_extension_is_an_error() {
        let err = extract_path(&PathBuf::from("notes.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = extract_path(&PathBuf::from("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        let err = extract_bytes(b"not a pdf", DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_invalid_zip_is_an_error_for_docx() {
        let err = extract_bytes(b"not a zip", DocumentKind::Word).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }
}
