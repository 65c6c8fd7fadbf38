//! doc-rag: document question answering over uploaded files
//!
//! Uploaded PDF, plain-text and Markdown files are extracted, split into
//! overlapping chunks, embedded through the Mistral API and stored in an
//! embedded ruvector HNSW index. Questions are answered by retrieving the
//! most similar chunks and passing them to a Mistral chat model.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use server::RagServer;
pub use types::{Answer, Chunk, Document, FileType, QueryRequest, QueryResponse};
