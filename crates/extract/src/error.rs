//! Extraction error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file extension: {0}")]
    Unsupported(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
