//! Document store provider trait for keeping raw uploads

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// Trait for raw document storage
///
/// Implementations:
/// - `LocalDocumentStore`: local filesystem
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Store a document, returning its storage URI
    async fn store_document(&self, doc_id: &Uuid, filename: &str, data: &[u8]) -> Result<String>;

    /// Check if document exists
    async fn exists(&self, doc_id: &Uuid, filename: &str) -> Result<bool>;

    /// Remove a stored document, returning whether it existed
    async fn delete_document(&self, doc_id: &Uuid, filename: &str) -> Result<bool>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
