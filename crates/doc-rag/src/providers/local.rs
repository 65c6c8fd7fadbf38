//! Local provider implementations using the embedded vector index and the filesystem

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::retrieval::{SearchResult, VectorStore};
use crate::types::{Chunk, Document};

use super::document_store::DocumentStoreProvider;
use super::vector_store::VectorStoreProvider;

/// Local vector store wrapping the embedded ruvector index
pub struct LocalVectorStore {
    store: Arc<VectorStore>,
}

impl LocalVectorStore {
    /// Create from existing VectorStore
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Create from config
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let store = VectorStore::new(
            &config.storage.data_dir,
            config.embeddings.dimensions,
            &config.vector_db,
        )?;
        Ok(Self::new(Arc::new(store)))
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Internal(format!("Task join error: {}", e))
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn add(&self, document: &Document, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        // Index and catalog calls are blocking
        let store = self.store.clone();
        let document = document.clone();
        let chunks = chunks.to_vec();
        let embeddings = embeddings.to_vec();
        tokio::task::spawn_blocking(move || store.add(&document, &chunks, &embeddings))
            .await
            .map_err(join_error)?
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let store = self.store.clone();
        let vector = vector.to_vec();
        tokio::task::spawn_blocking(move || store.query(&vector, top_k))
            .await
            .map_err(join_error)?
    }

    async fn delete_document(&self, document_id: &Uuid) -> Result<usize> {
        let store = self.store.clone();
        let doc_id = *document_id;
        tokio::task::spawn_blocking(move || store.delete_document(&doc_id))
            .await
            .map_err(join_error)?
    }

    async fn len(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.len())
            .await
            .map_err(join_error)?
    }

    async fn document_count(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.document_count())
            .await
            .map_err(join_error)?
    }

    async fn health_check(&self) -> Result<bool> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || Ok(store.health_check()))
            .await
            .map_err(join_error)?
    }

    fn dimensions(&self) -> usize {
        self.store.dimensions()
    }

    fn name(&self) -> &str {
        "local-ruvector"
    }
}

/// Local document store using filesystem
pub struct LocalDocumentStore {
    /// Directory to store documents
    storage_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create a new local document store
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Get path for a document: `{id}_{filename}`, filename reduced to its last component
    fn doc_path(&self, doc_id: &Uuid, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        self.storage_dir.join(format!("{}_{}", doc_id, name))
    }
}

#[async_trait]
impl DocumentStoreProvider for LocalDocumentStore {
    async fn store_document(&self, doc_id: &Uuid, filename: &str, data: &[u8]) -> Result<String> {
        let doc_path = self.doc_path(doc_id, filename);
        tokio::fs::write(&doc_path, data).await?;
        Ok(doc_path.to_string_lossy().to_string())
    }

    async fn exists(&self, doc_id: &Uuid, filename: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.doc_path(doc_id, filename)).await?)
    }

    async fn delete_document(&self, doc_id: &Uuid, filename: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.doc_path(doc_id, filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.storage_dir.exists())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
