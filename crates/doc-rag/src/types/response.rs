//! Response types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated answer with the excerpts it was conditioned on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text
    pub text: String,
    /// Retrieved chunk texts, most similar first
    pub sources: Vec<String>,
}

impl Answer {
    /// Fixed answer used when nothing has been indexed
    pub const NO_CONTEXT: &'static str = "I don't have enough information to answer this question.";

    pub fn no_context() -> Self {
        Self {
            text: Self::NO_CONTEXT.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Response after document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: Uuid,
    pub filename: String,
    pub chunks_created: usize,
    pub message: String,
}

/// Response for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
}

impl QueryResponse {
    pub fn new(question: String, answer: Answer) -> Self {
        Self {
            question,
            answer: answer.text,
            sources: answer.sources,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Whether the hosted model provider answered
    pub provider_connection: bool,
    /// Chunks currently indexed
    pub chunks_indexed: usize,
    pub message: String,
}

/// Collection statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_chunks: usize,
    pub total_documents: usize,
    pub collection_name: String,
}
