//! Vector similarity and rank fusion utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Reciprocal Rank Fusion (RRF) for merging ranked result lists
//!
//! Rankings are lists of `(chunk ordinal, score)` pairs, best first.

use std::collections::HashMap;

/// A ranked hit: chunk ordinal in the corpus plus its score.
pub type Ranked = (usize, f32);

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Sort hits by descending score; equal scores keep corpus order.
pub fn sort_ranked(hits: &mut [Ranked]) {
    hits.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

/// Reciprocal Rank Fusion (RRF): merge two ranked lists.
///
/// Each hit's final score = sum of 1/(k + rank) across both lists.
/// Standard value is k=60. Deduplicated by chunk ordinal.
pub fn reciprocal_rank_fusion(
    first: &[Ranked],
    second: &[Ranked],
    k: u32,
    limit: usize,
) -> Vec<Ranked> {
    let k = k as f32;
    let mut scores: HashMap<usize, f32> = HashMap::new();

    for list in [first, second] {
        for (rank, (ordinal, _)) in list.iter().enumerate() {
            *scores.entry(*ordinal).or_insert(0.0) += 1.0 / (k + rank as f32 + 1.0);
        }
    }

    let mut fused: Vec<Ranked> = scores.into_iter().collect();
    sort_ranked(&mut fused);
    fused.truncate(limit);
    fused
}
