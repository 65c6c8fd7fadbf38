//! Query request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest accepted `top_k`
pub const MIN_TOP_K: usize = 1;
/// Largest accepted `top_k`
pub const MAX_TOP_K: usize = 10;

/// Query request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default: 3)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl QueryRequest {
    /// Create a new query with the default retrieval width
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: default_top_k(),
        }
    }

    /// Set top_k
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Reject empty questions and out-of-range `top_k`
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.top_k) {
            return Err(Error::InvalidRequest(format!(
                "top_k must be between {} and {}, got {}",
                MIN_TOP_K, MAX_TOP_K, self.top_k
            )));
        }
        Ok(())
    }
}
