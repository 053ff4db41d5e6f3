//! Hybrid index: reciprocal rank fusion of keyword and embedding rankings.

use async_trait::async_trait;
use docent_core::error::RetrievalError;
use docent_core::retrieval::{Passage, Retriever};

use crate::embedding::EmbeddingIndex;
use crate::keyword::{KeywordIndex, to_passage};
use crate::vector::reciprocal_rank_fusion;

/// Standard RRF constant.
pub const RRF_K: u32 = 60;

/// Both indexes are built over the same chunk list, so ordinals line up.
pub struct HybridIndex {
    keyword: KeywordIndex,
    embedding: EmbeddingIndex,
}

impl HybridIndex {
    pub fn new(keyword: KeywordIndex, embedding: EmbeddingIndex) -> Self {
        Self { keyword, embedding }
    }
}

#[async_trait]
impl Retriever for HybridIndex {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        // Widen each candidate list so fusion has something to reorder
        let candidates = k.saturating_mul(2).max(k);
        let keyword_hits = self.keyword.rank(query, candidates);
        let vector_hits = self.embedding.rank(query, candidates).await?;

        Ok(reciprocal_rank_fusion(&keyword_hits, &vector_hits, RRF_K, k)
            .into_iter()
            .filter_map(|(ordinal, score)| {
                self.keyword.chunk(ordinal).map(|c| to_passage(c, score))
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.keyword.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::tests::{LetterEmbedder, chunk};
    use std::sync::Arc;

    #[tokio::test]
    async fn fuses_keyword_and_vector_rankings() {
        let chunks = vec![chunk("zebra yak"), chunk("xylophone x"), chunk("xx zz")];
        let keyword = KeywordIndex::new(chunks.clone());
        let embedding = EmbeddingIndex::build(Arc::new(LetterEmbedder), "m", chunks)
            .await
            .unwrap();
        let index = HybridIndex::new(keyword, embedding);

        let results = index.search("xylophone", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        // Ranked first by both lists
        assert_eq!(results[0].content, "xylophone x");
        assert_eq!(index.name(), "hybrid");
        assert_eq!(index.len(), 3);
    }
}
