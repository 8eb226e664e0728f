// Primary extraction: the embedded text layer, page by page
use lopdf::Document;
use std::path::Path;

use super::lopdf_helper::with_pdf;
use crate::types::Result;

/// Extract the text layer of every page in document order. Pages without
/// text contribute nothing; every non-empty page is followed by a newline.
pub fn extract_text_layer(pdf_path: &Path) -> Result<String> {
    with_pdf(pdf_path, |document| Ok(collect_page_text(document)))
}

pub fn get_page_count(pdf_path: &Path) -> Result<usize> {
    with_pdf(pdf_path, |document| Ok(document.get_pages().len()))
}

fn collect_page_text(document: &Document) -> String {
    let mut text = String::new();
    for &page_number in document.get_pages().keys() {
        let page = page_text(document, page_number);
        if !page.is_empty() {
            text.push_str(&page);
            text.push('\n');
        }
    }
    tracing::debug!("Text layer: {} chars", text.chars().count());
    text
}

fn page_text(document: &Document, page_number: u32) -> String {
    match document.extract_text(&[page_number]) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Page {} has no readable text layer: {}", page_number, e);
            String::new()
        }
    }
}
