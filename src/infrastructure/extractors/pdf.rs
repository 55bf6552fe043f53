#[cfg(test)]
#[path = "pdf_test.rs"]
mod tests;

use lopdf::Document;

use crate::domain::models::DocumentExtractor;
use crate::domain::models::ExtractionError;

const PAGE_SEPARATOR: &str = "\n\n";

fn normalize_page(text: &str) -> String {
    return text
        .lines()
        .map(|line| return line.trim())
        .filter(|line| return !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n");
}

#[derive(Default)]
pub struct PdfExtractor {}

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(content)
            .map_err(|err| return ExtractionError::Malformed(err.to_string()))?;

        // Keys are page numbers, so iteration is already in document order.
        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            let text = doc.extract_text(&[*page_number]).map_err(|err| {
                return ExtractionError::UndecodablePage {
                    page: *page_number,
                    reason: err.to_string(),
                };
            })?;
            texts.push(normalize_page(&text));
        }

        tracing::debug!(pages = texts.len(), bytes = content.len(), "extracted pdf");

        return Ok(texts.join(PAGE_SEPARATOR).trim().to_string());
    }
}
