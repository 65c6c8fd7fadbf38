//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::DocumentProcessor;
use crate::pipeline::RagPipeline;
use crate::providers::{
    DocumentStoreProvider, LocalDocumentStore, LocalVectorStore, MistralClient,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Extraction and chunking
    processor: DocumentProcessor,
    /// Embedding, retrieval and generation
    pipeline: RagPipeline,
    /// Raw upload storage
    documents: Arc<dyn DocumentStoreProvider>,
}

impl AppState {
    /// Create new application state backed by Mistral and the local stores
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let store = LocalVectorStore::from_config(&config)?;
        tracing::info!(
            "Vector store initialized at {} ({} dims)",
            config.storage.data_dir.display(),
            config.embeddings.dimensions
        );

        let mistral = Arc::new(MistralClient::new(&config.provider, &config.embeddings)?);
        tracing::info!(
            "Mistral client initialized (chat: {}, embeddings: {})",
            config.provider.chat_model,
            config.provider.embedding_model
        );

        let documents = LocalDocumentStore::new(config.storage.upload_dir.clone())?;
        tracing::info!("Upload directory: {}", config.storage.upload_dir.display());

        let pipeline = RagPipeline::new(mistral.clone(), mistral, Arc::new(store))?;

        Ok(Self::from_parts(config, pipeline, Arc::new(documents)))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: RagConfig,
        pipeline: RagPipeline,
        documents: Arc<dyn DocumentStoreProvider>,
    ) -> Self {
        let processor = DocumentProcessor::from_config(&config.chunking);
        tracing::debug!(
            "Chunker ready: {} chars, {} overlap",
            processor.chunker().chunk_size(),
            processor.chunker().overlap()
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                processor,
                pipeline,
                documents,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the document processor
    pub fn processor(&self) -> &DocumentProcessor {
        &self.inner.processor
    }

    /// Get the RAG pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Get the raw upload store
    pub fn documents(&self) -> &Arc<dyn DocumentStoreProvider> {
        &self.inner.documents
    }
}
