pub mod pdf;

use std::sync::Arc;

use crate::domain::models::ExtractorBox;

pub struct ExtractorManager {}

impl ExtractorManager {
    pub fn get() -> ExtractorBox {
        return Arc::<pdf::PdfExtractor>::default();
    }
}
