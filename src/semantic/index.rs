//! In-memory vector index with cosine similarity search.
//!
//! The index is built once after crawl + embed completes and is never
//! mutated afterwards, so concurrent queries need no coordination. Entries
//! reference documents by position in the orchestrator's collection; the
//! index holds no document copies.

/// An entry in the search index.
#[derive(Debug, Clone)]
struct IndexEntry {
    /// Position of the document in the orchestrator's collection
    position: usize,
    /// The embedding vector
    embedding: Vec<f32>,
}

/// Immutable-after-build vector index.
///
/// Ranking is a full linear scan; the document set tops out at a few
/// hundred items, so no approximate structure is warranted.
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

/// A single ranked match produced by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Position of the matched document in the orchestrator's collection
    pub position: usize,
    /// Cosine similarity against the query vector, in [-1, 1]
    pub score: f32,
}

impl SearchIndex {
    /// Build an index from `(document position, embedding)` pairs.
    pub fn build(entries: Vec<(usize, Vec<f32>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(position, embedding)| IndexEntry {
                    position,
                    embedding,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank every indexed vector against `query` and return the best
    /// `top_k` hits, descending by similarity.
    ///
    /// The sort is stable: equal scores keep their insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .entries
            .iter()
            .map(|entry| Hit {
                position: entry.position,
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        hits
    }
}

/// Cosine similarity between two vectors.
///
/// Defined as 0.0 when either vector is empty, the lengths differ, or
/// either magnitude is 0. Not the mathematical cosine in those cases, but
/// a safe default: degenerate input must never crash a query.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-2.0, 0.5, 1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_empty_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_mismatched_lengths_score_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_zero_magnitude_scores_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_search_ranks_descending() {
        let index = SearchIndex::build(vec![
            (0, vec![1.0, 0.0, 0.0]),
            (1, vec![0.0, 1.0, 0.0]),
            (2, vec![0.9, 0.1, 0.0]),
        ]);

        let hits = index.search(&[1.0, 0.0, 0.0], 10);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 2);
        assert_eq!(hits[2].position, 1);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_search_respects_top_k() {
        let entries = (0..10).map(|i| (i, vec![1.0, i as f32 * 0.1])).collect();
        let index = SearchIndex::build(entries);

        let hits = index.search(&[1.0, 0.0], 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        // Identical vectors tie exactly; stable sort must preserve
        // the order they were inserted in.
        let index = SearchIndex::build(vec![
            (5, vec![1.0, 0.0]),
            (7, vec![1.0, 0.0]),
            (2, vec![1.0, 0.0]),
        ]);

        let hits = index.search(&[1.0, 0.0], 10);
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![5, 7, 2]);
    }

    #[test]
    fn test_search_with_mismatched_query_never_panics() {
        let index = SearchIndex::build(vec![(0, vec![1.0, 0.0, 0.0])]);

        let hits = index.search(&[1.0, 0.0], 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
    }

    #[test]
    fn test_empty_index() {
        let index = SearchIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 5).is_empty());
    }
}
