//! Document fetch + parse, dispatched on content type.
//!
//! `parse` never fails: any fetch or format-level error is absorbed into a
//! degraded `ParsedDocument` whose text is still usable downstream. The
//! orchestrator calls this per row without any error handling of its own.

use std::io::{Cursor, Read};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::ObjectStore;

const WORD_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

/// Result of fetching and parsing one document reference.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedDocument {
    pub success: bool,
    pub filename: String,
    pub content_type: String,
    /// Human label: `PDF`, `Word Document`, `Image`, or the raw content type.
    pub document_type: String,
    /// Extracted plain text. On failure this carries a readable error
    /// message instead, never empty, so downstream consumers need no
    /// separate failure path.
    pub text: String,
    pub pages: Option<usize>,
    pub error: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

/// Fetches documents from object storage and extracts their text.
pub struct DocumentParser<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> DocumentParser<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Fetch + parse, absorbing every failure into a degraded document.
    pub fn parse(&self, reference: &str) -> ParsedDocument {
        tracing::debug!(reference, "Parsing document");
        match self.try_parse(reference) {
            Ok(doc) => doc,
            Err(message) => {
                tracing::warn!(reference, error = %message, "Document parsing degraded");
                ParsedDocument {
                    success: false,
                    filename: "unknown".to_string(),
                    content_type: String::new(),
                    document_type: "Unknown".to_string(),
                    text: format!("Error parsing document: {message}"),
                    pages: None,
                    error: Some(message),
                    extracted_at: Utc::now(),
                }
            }
        }
    }

    fn try_parse(&self, reference: &str) -> Result<ParsedDocument, String> {
        let object = self.store.fetch(reference).map_err(|e| e.to_string())?;
        let content_type = object.content_type;

        let (document_type, text, pages) = if content_type == "application/pdf" {
            let (text, pages) = parse_pdf(&object.bytes)?;
            ("PDF".to_string(), text, Some(pages))
        } else if WORD_MIME_TYPES.contains(&content_type.as_str()) {
            let text = parse_word_document(&object.bytes)?;
            ("Word Document".to_string(), text, None)
        } else if content_type.starts_with("image/") {
            // No OCR wired up; the file is acknowledged but not read.
            (
                "Image".to_string(),
                "Image text extraction is not available. File uploaded successfully but \
                 text extraction is not configured."
                    .to_string(),
                None,
            )
        } else {
            (
                content_type.clone(),
                format!(
                    "Document of type {content_type} uploaded successfully. Content parsing \
                     may require additional configuration."
                ),
                None,
            )
        };

        Ok(ParsedDocument {
            success: true,
            filename: object.filename,
            content_type,
            document_type,
            text,
            pages,
            error: None,
            extracted_at: Utc::now(),
        })
    }
}

fn parse_pdf(bytes: &[u8]) -> Result<(String, usize), String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| format!("Failed to parse PDF content: {e}"))?;
    let count = pages.len();
    Ok((pages.join("\n"), count))
}

/// Pull text out of a `.docx` (a zip container with the body in
/// `word/document.xml`). Legacy binary `.doc` files fail here and surface
/// as a degraded document.
fn parse_word_document(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to parse Word document content: {e}"))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("Failed to parse Word document content: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("Failed to parse Word document content: {e}"))?;

    Ok(strip_document_xml(&xml))
}

/// Drop XML markup, keeping character data. Paragraph ends and explicit
/// breaks become newlines so sentence-boundary matching still works.
fn strip_document_xml(xml: &str) -> String {
    let mut out = String::new();
    let mut tag = String::new();
    let mut in_tag = false;

    for c in xml.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if tag == "/w:p" || tag.starts_with("w:br") {
                    out.push('\n');
                }
            }
            _ if in_tag => tag.push(c),
            _ => out.push(c),
        }
    }

    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string()
}
