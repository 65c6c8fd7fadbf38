//! Core types for the document Q&A service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType, TextSpan};
pub use query::QueryRequest;
pub use response::{Answer, HealthResponse, QueryResponse, StatsResponse, UploadResponse};
