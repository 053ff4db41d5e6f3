//! Retriever trait: the abstraction over the document index.
//!
//! Given a query, a retriever returns an ordered set of relevant passages,
//! most relevant first. The index is read-only from the answerer's point of
//! view; building it is the job of `docent-index`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A single retrieved text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text
    pub content: String,

    /// Where the passage came from (file path, URL, ...)
    #[serde(default)]
    pub source: String,

    /// Relevance score assigned by the index (higher = more relevant)
    #[serde(default)]
    pub score: f32,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: String::new(),
            score: 0.0,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

/// The core Retriever trait.
///
/// Implementations: keyword, embedding, and hybrid indexes.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The index name (e.g., "keyword", "hybrid").
    fn name(&self) -> &str;

    /// Return at most `k` passages relevant to `query`, most relevant first.
    ///
    /// Zero matches is a valid result, not an error.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError>;

    /// Number of indexed passages.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
