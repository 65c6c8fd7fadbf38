//! Prompt templates for RAG generation

use serde::Serialize;

use crate::retrieval::SearchResult;

/// A chat message in the OpenAI-compatible wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the provided context. \
If the context doesn't contain relevant information, say so clearly.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from search results: chunk texts separated by blank lines
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the user turn
    pub fn build_user_prompt(question: &str, context: &str) -> String {
        format!(
            "Context:\n{context}\n\nQuestion: {question}\n\nProvide a clear and concise answer based on the context above.",
            context = context,
            question = question
        )
    }

    /// Build the full message list for a chat completion
    pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::build_user_prompt(question, context)),
        ]
    }
}
