//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::retrieval::SearchResult;
use crate::types::{Chunk, Document};

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: embedded ruvector HNSW index
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Persist a document's chunks, one embedding per chunk
    async fn add(&self, document: &Document, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize>;

    /// Search for the `top_k` most similar chunks
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Delete all chunks for a document
    async fn delete_document(&self, document_id: &Uuid) -> Result<usize>;

    /// Get total number of chunks stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get total number of documents stored
    async fn document_count(&self) -> Result<usize>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Embedding dimensionality the store accepts
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
