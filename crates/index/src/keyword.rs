//! In-memory keyword index.
//!
//! Scores each chunk by the term frequency of the query's terms, normalised
//! by chunk length so long chunks do not win on volume alone.

use async_trait::async_trait;
use docent_core::error::RetrievalError;
use docent_core::retrieval::{Passage, Retriever};
use std::collections::{HashMap, HashSet};

use crate::chunker::Chunk;
use crate::vector::{Ranked, sort_ranked};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "in", "is", "it", "me", "of", "on", "or", "the", "that", "this", "to", "was", "what",
    "when", "where", "which", "who", "why", "with", "you",
];

struct IndexedChunk {
    chunk: Chunk,
    term_counts: HashMap<String, u32>,
    length: usize,
}

pub struct KeywordIndex {
    entries: Vec<IndexedChunk>,
}

impl KeywordIndex {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let entries = chunks
            .into_iter()
            .map(|chunk| {
                let tokens = tokenize(&chunk.content);
                let length = tokens.len();
                let mut term_counts = HashMap::new();
                for token in tokens {
                    *term_counts.entry(token).or_insert(0) += 1;
                }
                IndexedChunk {
                    chunk,
                    term_counts,
                    length,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn chunk(&self, ordinal: usize) -> Option<&Chunk> {
        self.entries.get(ordinal).map(|e| &e.chunk)
    }

    /// Rank chunks against `query`; zero-score chunks are excluded.
    pub fn rank(&self, query: &str, limit: usize) -> Vec<Ranked> {
        let terms: HashSet<String> = tokenize(query)
            .into_iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Ranked> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(ordinal, entry)| {
                let matches: u32 = terms
                    .iter()
                    .filter_map(|t| entry.term_counts.get(t))
                    .sum();
                if matches == 0 {
                    return None;
                }
                let norm = (entry.length as f32).sqrt().max(1.0);
                Some((ordinal, matches as f32 / norm))
            })
            .collect();

        sort_ranked(&mut hits);
        hits.truncate(limit);
        hits
    }

    pub(crate) fn passage(&self, (ordinal, score): Ranked) -> Option<Passage> {
        self.chunk(ordinal).map(|c| to_passage(c, score))
    }
}

pub(crate) fn to_passage(chunk: &Chunk, score: f32) -> Passage {
    Passage::new(chunk.content.clone())
        .with_source(chunk.source.clone())
        .with_score(score)
}

/// Lowercased alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[async_trait]
impl Retriever for KeywordIndex {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        Ok(self
            .rank(query, k)
            .into_iter()
            .filter_map(|hit| self.passage(hit))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
