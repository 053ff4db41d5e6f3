//! Embedding index: dense retrieval through `Provider::embed`.

use async_trait::async_trait;
use docent_core::error::RetrievalError;
use docent_core::provider::{EmbeddingRequest, Provider};
use docent_core::retrieval::{Passage, Retriever};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chunker::Chunk;
use crate::keyword::to_passage;
use crate::vector::{Ranked, cosine_similarity, sort_ranked};

const EMBED_BATCH: usize = 32;

pub struct EmbeddingIndex {
    provider: Arc<dyn Provider>,
    model: String,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Embed every chunk up front. Fails if the provider cannot embed.
    pub async fn build(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        chunks: Vec<Chunk>,
    ) -> Result<Self, RetrievalError> {
        let model = model.into();
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBED_BATCH) {
            let inputs = batch.iter().map(|c| c.content.clone()).collect();
            let mut embedded = embed(provider.as_ref(), &model, inputs).await?;
            if embedded.len() != batch.len() {
                return Err(RetrievalError::EmbeddingFailed(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.append(&mut embedded);
            debug!(done = vectors.len(), total = chunks.len(), "Embedded batch");
        }

        info!(chunks = chunks.len(), model = %model, "Embedding index built");
        Ok(Self {
            provider,
            model,
            chunks,
            vectors,
        })
    }

    pub fn chunk(&self, ordinal: usize) -> Option<&Chunk> {
        self.chunks.get(ordinal)
    }

    /// Rank all chunks by cosine similarity to the query embedding.
    pub async fn rank(&self, query: &str, limit: usize) -> Result<Vec<Ranked>, RetrievalError> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = embed(self.provider.as_ref(), &self.model, vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::EmbeddingFailed("empty query embedding".into()))?;

        let mut hits: Vec<Ranked> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, v)| (ordinal, cosine_similarity(v, &query_vector)))
            .collect();

        sort_ranked(&mut hits);
        hits.truncate(limit);
        Ok(hits)
    }
}

async fn embed(
    provider: &dyn Provider,
    model: &str,
    inputs: Vec<String>,
) -> Result<Vec<Vec<f32>>, RetrievalError> {
    provider
        .embed(EmbeddingRequest {
            model: model.to_string(),
            inputs,
        })
        .await
        .map(|r| r.embeddings)
        .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))
}

#[async_trait]
impl Retriever for EmbeddingIndex {
    fn name(&self) -> &str {
        "vector"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        Ok(self
            .rank(query, k)
            .await?
            .into_iter()
            .filter_map(|(ordinal, score)| self.chunk(ordinal).map(|c| to_passage(c, score)))
            .collect())
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
