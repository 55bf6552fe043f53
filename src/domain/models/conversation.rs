#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use super::ConversationError;

/// Incremental pieces of a model reply, in emission order. Single pass.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ConversationError>> + Send>>;

pub type SessionBox = Arc<dyn ConversationSession + Send + Sync>;

pub type ConversationBox = Arc<dyn Conversation + Send + Sync>;

pub fn system_instruction(file_names: &[String], document_text: &str) -> String {
    let mut file_list = file_names.join(", ");
    if file_list.is_empty() {
        file_list = "No documents uploaded".to_string();
    }

    return format!(
        r#"You are a world-class expert specializing in analyzing and synthesizing information from multiple documents. The user has uploaded the following documents: {file_list}.

Here is the full content of these documents:
---
{document_text}
---

Your conversation must be strictly based on the content of these documents. When you don't have enough information from the documents, clearly state that the documents do not contain the answer. Do not use external knowledge unless the user explicitly asks you to search the web or use your general knowledge."#
    );
}

#[async_trait]
pub trait Conversation {
    /// Opens a brand new session whose system instruction embeds the given
    /// documents. The instruction never changes for the lifetime of the
    /// session.
    async fn open_session(
        &self,
        file_names: &[String],
        document_text: &str,
    ) -> Result<SessionBox, ConversationError>;
}

#[async_trait]
pub trait ConversationSession {
    fn system_instruction(&self) -> &str;

    /// Submits a user message and returns the streamed reply.
    ///
    /// Only one reply may stream at a time, a second call before the previous
    /// stream is drained or dropped fails with `ConversationError::Busy`.
    /// Fragments yielded before a mid-stream error are not retracted.
    async fn send(&self, message: &str) -> Result<FragmentStream, ConversationError>;
}
