use std::sync::Arc;

use super::ExtractionError;

pub trait DocumentExtractor {
    /// Returns the document's text page by page in document order, pages
    /// separated by a blank line, trimmed at both ends.
    fn extract(&self, content: &[u8]) -> Result<String, ExtractionError>;
}

pub type ExtractorBox = Arc<dyn DocumentExtractor + Send + Sync>;
