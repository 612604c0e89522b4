//! Word and PowerPoint extraction via their OOXML containers.
//!
//! Both formats are ZIP archives of XML parts. Word text lives in
//! `word/document.xml` as `<w:t>` runs grouped into `<w:p>` paragraphs;
//! PowerPoint text lives in one XML part per slide as `<a:t>` runs.

use std::io::{Cursor, Read};

use doclens_core::{ContentUnit, DocumentKind, DocumentMetadata, DocumentText};
use quick_xml::events::Event;

use crate::error::{ExtractError, Result};

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

pub fn extract_docx(bytes: &[u8]) -> Result<DocumentText> {
    let mut archive = open_archive(bytes)?;
    let has_images = archive.file_names().any(|n| n.starts_with("word/media/"));

    let xml = read_entry(&mut archive, "word/document.xml")?;
    let body = parse_docx_body(&xml)?;

    let mut metadata = DocumentMetadata::new(DocumentKind::Word);
    metadata.paragraphs = Some(body.paragraphs.len());
    metadata.tables = Some(body.table_count);
    metadata.has_tables = body.table_count > 0;
    metadata.has_images = has_images;

    let units = body
        .paragraphs
        .into_iter()
        .enumerate()
        .map(|(i, text)| ContentUnit::new(i + 1, text))
        .collect();

    Ok(DocumentText::from_units(units, metadata))
}

pub fn extract_pptx(bytes: &[u8]) -> Result<DocumentText> {
    let mut archive = open_archive(bytes)?;
    let has_images = archive.file_names().any(|n| n.starts_with("ppt/media/"));

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut metadata = DocumentMetadata::new(DocumentKind::Powerpoint);
    metadata.slides = Some(slide_names.len());
    metadata.has_images = has_images;
    // Table shapes are not inspected for slides.

    let mut units = Vec::with_capacity(slide_names.len());
    for (i, name) in slide_names.iter().enumerate() {
        let xml = read_entry(&mut archive, name)?;
        let runs = collect_text_runs(&xml)?;
        units.push(ContentUnit::new(i + 1, runs.join(" ")));
    }

    Ok(DocumentText::from_units(units, metadata))
}

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn read_entry(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;

    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(out)
}

struct DocxBody {
    paragraphs: Vec<String>,
    table_count: usize,
}

/// Stream `word/document.xml`, grouping `<w:t>` runs by paragraph and
/// counting `<w:tbl>` elements.
fn parse_docx_body(xml: &[u8]) -> Result<DocxBody> {
    // Text runs keep their inner whitespace; `<w:t>Second </w:t>` must
    // not fuse with the following run.
    let mut reader = quick_xml::Reader::from_reader(xml);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut table_count = 0usize;
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text_run = true,
                b"tbl" => table_count += 1,
                _ => {}
            },
            Ok(Event::Text(te)) if in_text_run => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(DocxBody {
        paragraphs,
        table_count,
    })
}

/// Pull every `<a:t>` text run out of one slide's XML.
fn collect_text_runs(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_reader(xml);

    let mut buf = Vec::new();
    let mut runs = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::Text(te)) if in_text_run => {
                let text = te.unescape().unwrap_or_default().trim().to_string();
                if !text.is_empty() {
                    runs.push(text);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn docx_with(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{}</w:body></w:document>"#,
            body
        );
        build_archive(&[("word/document.xml", &xml)])
    }

    #[test]
    fn test_docx_paragraphs_and_tables() {
        let bytes = docx_with(
            "<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>\
             <w:p/>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let doc = extract_docx(&bytes).unwrap();

        assert_eq!(doc.metadata.kind, DocumentKind::Word);
        assert_eq!(doc.metadata.tables, Some(1));
        assert!(doc.metadata.has_tables);
        assert!(!doc.metadata.has_images);
        assert_eq!(doc.units[0].text, "First paragraph.");
        assert_eq!(doc.units[1].text, "Second paragraph.");
        assert!(doc.full_text.contains("First paragraph. Second paragraph."));
    }

    #[test]
    fn test_docx_media_sets_image_flag() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Text.</w:t></w:r></w:p></w:body></w:document>"#;
        let bytes = build_archive(&[("word/document.xml", xml), ("word/media/image1.png", "png")]);
        let doc = extract_docx(&bytes).unwrap();
        assert!(doc.metadata.has_images);
    }

    #[test]
    fn test_docx_without_document_xml_fails() {
        let bytes = build_archive(&[("word/other.xml", "<x/>")]);
        assert!(matches!(
            extract_docx(&bytes),
            Err(ExtractError::Ooxml(_))
        ));
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let slide = |text: &str| {
            format!(
                r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><a:t>{}</a:t></p:sld>"#,
                text
            )
        };
        let (s1, s2, s10) = (slide("one"), slide("two"), slide("ten"));
        let bytes = build_archive(&[
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
        ]);
        let doc = extract_pptx(&bytes).unwrap();

        assert_eq!(doc.metadata.slides, Some(3));
        let texts: Vec<&str> = doc.units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "ten"]);
    }
}
