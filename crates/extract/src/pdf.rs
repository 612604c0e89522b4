//! PDF text extraction

use doclens_core::{ContentUnit, DocumentKind, DocumentMetadata, DocumentText};

use crate::error::{ExtractError, Result};

/// Pages with more structured-looking lines than this are assumed to
/// contain a table.
const TABLE_LINE_THRESHOLD: usize = 3;

pub fn extract(bytes: &[u8]) -> Result<DocumentText> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let mut metadata = DocumentMetadata::new(DocumentKind::Pdf);
    metadata.pages = Some(pages.len());

    let mut units = Vec::with_capacity(pages.len());
    for (i, text) in pages.into_iter().enumerate() {
        if looks_tabular(&text) {
            metadata.has_tables = true;
        }
        units.push(ContentUnit::new(i + 1, text));
    }
    // The text backend cannot see image objects; callers get no image flag
    // for PDFs.

    Ok(DocumentText::from_units(units, metadata))
}

/// Heuristic table detection: many lines padded with tabs or doubled
/// spaces usually mean columnar layout.
fn looks_tabular(page_text: &str) -> bool {
    let structured_lines = page_text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            line.contains('\t') || trimmed.contains("  ")
        })
        .count();
    structured_lines > TABLE_LINE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabular_heuristic() {
        let flowing = "One line of prose.\nAnother line of prose.\n";
        assert!(!looks_tabular(flowing));

        let columnar = "a  b  c\n1  2  3\n4  5  6\n7  8  9\n10  11  12\n";
        assert!(looks_tabular(columnar));
    }
}
