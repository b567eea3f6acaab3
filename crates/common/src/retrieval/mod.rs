//! Similarity retrieval over reference sources
//!
//! Ranks stored reference sources against a free-text query. Candidate
//! selection runs on the storage layer's index metric (L2 distance); the
//! score reported to callers is cosine similarity, recomputed independently.
//! The two can disagree in the tail, so results are re-sorted by the
//! reported score before they leave this module.

use crate::db::{CandidateSource, Repository};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

/// Default number of sources returned when the caller does not ask for more
pub const DEFAULT_TOP_K: usize = 5;

/// Storage seam for candidate selection.
///
/// Implementations select `limit` candidates by their own index metric and
/// attach the reported cosine similarity to each row.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn nearest(&self, embedding: &[f32], limit: usize) -> Result<Vec<CandidateSource>>;
}

#[async_trait]
impl SourceStore for Repository {
    async fn nearest(&self, embedding: &[f32], limit: usize) -> Result<Vec<CandidateSource>> {
        self.nearest_sources(embedding, limit).await
    }
}

/// Ranks reference sources by embedding similarity to a text query
pub struct SourceRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SourceStore>,
}

impl SourceRetriever {
    /// Create a new retriever
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn SourceStore>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve the `top_k` most relevant sources for a text query, ordered
    /// by descending similarity score with ties broken by ascending id.
    ///
    /// An empty query and a zero `top_k` are caller errors; an empty store
    /// is not and yields an empty result.
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> Result<Vec<CandidateSource>> {
        if query_text.trim().is_empty() {
            return Err(AppError::InvalidArgument {
                message: "Query parameter 'q' cannot be empty.".to_string(),
            });
        }
        if top_k < 1 {
            return Err(AppError::InvalidArgument {
                message: "top_k must be at least 1".to_string(),
            });
        }

        let embedding = self.embedder.embed(query_text).await?;

        let mut candidates = self.store.nearest(&embedding, top_k).await?;

        // Caller-visible order follows the reported metric, not the
        // selection metric.
        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test embedder returning one fixed vector for every query
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    /// In-memory store mirroring the SQL query: select by L2, report cosine
    struct InMemoryStore {
        sources: Vec<(i32, Vec<f32>)>,
    }

    fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| ((x - y) as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| (x * y) as f64).sum();
        let norm_a: f64 = a.iter().map(|x| (x * x) as f64).sum::<f64>().sqrt();
        let norm_b: f64 = b.iter().map(|x| (x * x) as f64).sum::<f64>().sqrt();
        dot / (norm_a * norm_b)
    }

    #[async_trait]
    impl SourceStore for InMemoryStore {
        async fn nearest(&self, embedding: &[f32], limit: usize) -> Result<Vec<CandidateSource>> {
            let mut rows: Vec<_> = self.sources.iter().collect();
            rows.sort_by(|(id_a, vec_a), (id_b, vec_b)| {
                l2_distance(vec_a, embedding)
                    .partial_cmp(&l2_distance(vec_b, embedding))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| id_a.cmp(id_b))
            });
            rows.truncate(limit);

            Ok(rows
                .into_iter()
                .map(|(id, vec)| CandidateSource {
                    id: *id,
                    title: format!("Source {}", id),
                    authors: "Doe, J.".to_string(),
                    publication_year: 2020,
                    abstract_text: String::new(),
                    source_type: "paper".to_string(),
                    similarity: cosine_similarity(vec, embedding),
                })
                .collect())
        }
    }

    fn retriever(query: Vec<f32>, sources: Vec<(i32, Vec<f32>)>) -> SourceRetriever {
        SourceRetriever::new(
            Arc::new(FixedEmbedder(query)),
            Arc::new(InMemoryStore { sources }),
        )
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let r = retriever(vec![1.0, 0.0], vec![]);
        assert!(matches!(
            r.retrieve("", DEFAULT_TOP_K).await.unwrap_err(),
            AppError::InvalidArgument { .. }
        ));
        assert!(matches!(
            r.retrieve("   ", DEFAULT_TOP_K).await.unwrap_err(),
            AppError::InvalidArgument { .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let r = retriever(vec![1.0, 0.0], vec![(1, vec![1.0, 0.0])]);
        assert!(matches!(
            r.retrieve("query", 0).await.unwrap_err(),
            AppError::InvalidArgument { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_result() {
        let r = retriever(vec![1.0, 0.0], vec![]);
        let results = r.retrieve("anything", DEFAULT_TOP_K).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_sorted_by_descending_similarity() {
        let r = retriever(
            vec![1.0, 0.0, 0.0],
            vec![
                (1, vec![0.0, 1.0, 0.0]),
                (2, vec![1.0, 0.0, 0.0]),
                (3, vec![0.7, 0.7, 0.0]),
            ],
        );

        let results = r.retrieve("machine learning ethics", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(results
            .iter()
            .all(|s| (-1.0..=1.0).contains(&s.similarity)));
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let r = retriever(
            vec![1.0, 0.0],
            vec![
                (1, vec![1.0, 0.0]),
                (2, vec![0.9, 0.1]),
                (3, vec![0.5, 0.5]),
                (4, vec![0.0, 1.0]),
            ],
        );

        let results = r.retrieve("query", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_tie_break_by_ascending_id() {
        // Identical embeddings -> identical scores -> lower id first.
        let r = retriever(
            vec![1.0, 0.0],
            vec![
                (7, vec![0.5, 0.5]),
                (3, vec![0.5, 0.5]),
                (5, vec![0.5, 0.5]),
            ],
        );

        let results = r.retrieve("query", 3).await.unwrap();
        assert_eq!(
            results.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![3, 5, 7]
        );
    }

    #[tokio::test]
    async fn test_reported_order_follows_cosine_not_l2() {
        // A has the better cosine similarity, B the smaller L2 distance:
        // the caller must see A first.
        let r = retriever(
            vec![1.0, 0.0],
            vec![(1, vec![3.0, 0.0]), (2, vec![0.9, 0.25])],
        );

        let results = r.retrieve("query", 2).await.unwrap();
        assert_eq!(
            results.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn test_repeated_runs_identical() {
        let sources = vec![
            (1, vec![0.2, 0.8]),
            (2, vec![0.8, 0.2]),
            (3, vec![0.6, 0.4]),
        ];
        let r = retriever(vec![1.0, 0.0], sources);

        let first = r.retrieve("query", 3).await.unwrap();
        let second = r.retrieve("query", 3).await.unwrap();
        let ids = |v: &[CandidateSource]| v.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
