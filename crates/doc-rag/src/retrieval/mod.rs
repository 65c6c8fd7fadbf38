//! Vector storage and nearest-neighbour retrieval

mod store;

pub use store::{SearchResult, VectorStore};
