//! Retrieval-augmented answering over the indexed documents

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::ProcessedDocument;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::retrieval::SearchResult;
use crate::types::Answer;

/// Ties the embedding provider, vector store and LLM together
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl RagPipeline {
    /// Build a pipeline; the embedder and store must agree on dimensionality
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        if embedder.dimensions() != store.dimensions() {
            return Err(Error::Config(format!(
                "embedding provider '{}' produces {} dimensions but vector store '{}' expects {}",
                embedder.name(),
                embedder.dimensions(),
                store.name(),
                store.dimensions()
            )));
        }

        Ok(Self { embedder, llm, store })
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Embed every chunk of a processed document and persist them.
    /// Returns the number of chunks stored.
    pub async fn index_document(&self, processed: &ProcessedDocument) -> Result<usize> {
        let texts = processed.texts();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, received {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let stored = self
            .store
            .add(&processed.document, &processed.chunks, &embeddings)
            .await?;

        tracing::info!(
            "Indexed {} chunks for {} ({})",
            stored,
            processed.document.filename,
            processed.document.id
        );

        Ok(stored)
    }

    /// Find the `top_k` chunks most similar to the question.
    ///
    /// Fails with [`Error::RetrievalEmpty`] before calling the embedding
    /// API when nothing has been indexed.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.store.is_empty().await? {
            return Err(Error::RetrievalEmpty);
        }

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.store.query(&query_embedding, top_k).await?;

        tracing::debug!(
            "Retrieved {} chunks (best similarity {:?})",
            results.len(),
            results.first().map(|r| r.similarity)
        );

        Ok(results)
    }

    /// Answer a question from the retrieved context.
    ///
    /// An empty index yields [`Answer::no_context`] without calling any
    /// hosted API.
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        let results = match self.retrieve(question, top_k).await {
            Ok(results) => results,
            Err(Error::RetrievalEmpty) => {
                tracing::info!("Index is empty, returning the no-context answer");
                return Ok(Answer::no_context());
            }
            Err(e) => return Err(e),
        };

        let context = PromptBuilder::build_context(&results);
        let text = self.llm.generate_answer(question, &context).await?;

        Ok(Answer {
            text,
            sources: results.into_iter().map(|r| r.chunk.content).collect(),
        })
    }
}
