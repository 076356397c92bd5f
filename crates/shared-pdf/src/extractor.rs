//! Page-ordered text extraction using lopdf content streams.
//!
//! Strings are decoded as UTF-8, then UTF-16BE (with BOM), then Latin-1.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use thiserror::Error;
use tracing::debug;

/// Kerning adjustment (thousandths of an em) treated as a word gap inside `TJ`.
const KERNING_GAP: f64 = -100.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),
}

/// Stateless extractor; cheap to construct and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the whole document as one string, pages separated by `\n`.
    pub fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        Ok(self.extract_pages(bytes)?.join("\n"))
    }

    /// Extract each page's text, in page order.
    pub fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let doc = load(bytes)?;
        let pages: Vec<String> = doc
            .get_pages()
            .into_values()
            .map(|page_id| page_text(&doc, page_id))
            .collect();

        debug!(pages = pages.len(), "Extracted document text");
        Ok(pages)
    }

    pub fn page_count(&self, bytes: &[u8]) -> Result<usize, ExtractError> {
        Ok(load(bytes)?.get_pages().len())
    }
}

fn load(bytes: &[u8]) -> Result<Document, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::UnreadableDocument(e.to_string()))?;
    if doc.get_pages().is_empty() {
        return Err(ExtractError::UnreadableDocument(
            "document has no pages".to_string(),
        ));
    }
    Ok(doc)
}

/// Text of one page. A page whose content stream cannot be decoded is empty.
fn page_text(doc: &Document, page_id: ObjectId) -> String {
    let Ok(data) = doc.get_page_content(page_id) else {
        debug!(?page_id, "Page has no readable content stream");
        return String::new();
    };
    let Ok(content) = Content::decode(&data) else {
        debug!(?page_id, "Page content stream failed to decode");
        return String::new();
    };

    let mut items: Vec<String> = Vec::new();
    for op in &content.operations {
        if !matches!(op.operator.as_str(), "Tj" | "TJ" | "'" | "\"") {
            continue;
        }
        let item: String = op.operands.iter().filter_map(operand_text).collect();
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }
    items.join(" ")
}

fn operand_text(operand: &Object) -> Option<String> {
    match operand {
        Object::String(bytes, _) => Some(decode_string(bytes)),
        Object::Array(parts) => {
            let mut text = String::new();
            for part in parts {
                match part {
                    Object::String(bytes, _) => text.push_str(&decode_string(bytes)),
                    Object::Integer(n) if (*n as f64) < KERNING_GAP => text.push(' '),
                    Object::Real(n) if f64::from(*n) < KERNING_GAP => text.push(' '),
                    _ => {}
                }
            }
            Some(text)
        }
        _ => None,
    }
}

fn decode_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}
