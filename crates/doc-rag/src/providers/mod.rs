//! Provider abstractions for embeddings, LLM, vector storage, and document storage
//!
//! The pipeline only sees these traits, so the hosted Mistral client and the
//! local stores can be replaced by fakes in tests.

pub mod document_store;
pub mod embedding;
pub mod llm;
pub mod local;
pub mod mistral;
pub mod vector_store;

pub use document_store::DocumentStoreProvider;
pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use local::{LocalDocumentStore, LocalVectorStore};
pub use mistral::MistralClient;
pub use vector_store::VectorStoreProvider;
