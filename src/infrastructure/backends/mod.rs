pub mod gemini;

use std::sync::Arc;

use crate::domain::models::ConversationBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> ConversationBox {
        return Arc::<gemini::GeminiConversation>::default();
    }
}
