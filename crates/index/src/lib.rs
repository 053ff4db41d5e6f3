//! # docent-index
//!
//! The retrieval side of Docent: load a corpus from disk, split it into
//! overlapping chunks, and serve top-k passages through the `Retriever`
//! trait.
//!
//! Modes:
//! - **keyword**: term-frequency scoring, no provider calls
//! - **vector**: cosine similarity over provider embeddings
//! - **hybrid**: reciprocal rank fusion of the two

pub mod chunker;
pub mod embedding;
pub mod hybrid;
pub mod keyword;
pub mod loader;
pub mod vector;

pub use chunker::{Chunk, Chunker};
pub use embedding::EmbeddingIndex;
pub use hybrid::HybridIndex;
pub use keyword::KeywordIndex;
pub use loader::{Document, load_corpus};

use docent_config::{RetrievalConfig, RetrievalMode};
use docent_core::error::RetrievalError;
use docent_core::provider::Provider;
use docent_core::retrieval::Retriever;
use std::sync::Arc;
use tracing::info;

/// Load and chunk the configured corpus.
pub fn load_chunks(config: &RetrievalConfig) -> Vec<Chunk> {
    let documents = load_corpus(config.corpus_paths.as_slice(), &config.extensions);
    Chunker::from_config(config).chunk_all(&documents)
}

/// Build the retriever selected by `config.mode` over the configured corpus.
///
/// An empty corpus is allowed: every search then returns no passages.
pub async fn build_retriever(
    config: &RetrievalConfig,
    provider: Arc<dyn Provider>,
) -> Result<Arc<dyn Retriever>, RetrievalError> {
    let chunks = load_chunks(config);
    build_from_chunks(config, provider, chunks).await
}

/// Build a retriever over an already-chunked corpus.
pub async fn build_from_chunks(
    config: &RetrievalConfig,
    provider: Arc<dyn Provider>,
    chunks: Vec<Chunk>,
) -> Result<Arc<dyn Retriever>, RetrievalError> {
    let retriever: Arc<dyn Retriever> = match config.mode {
        RetrievalMode::Keyword => Arc::new(KeywordIndex::new(chunks)),
        RetrievalMode::Vector => Arc::new(
            EmbeddingIndex::build(provider, config.embedding_model.clone(), chunks).await?,
        ),
        RetrievalMode::Hybrid => {
            let keyword = KeywordIndex::new(chunks.clone());
            let embedding =
                EmbeddingIndex::build(provider, config.embedding_model.clone(), chunks).await?;
            Arc::new(HybridIndex::new(keyword, embedding))
        }
    };

    info!(mode = retriever.name(), chunks = retriever.len(), "Retriever ready");
    Ok(retriever)
}
