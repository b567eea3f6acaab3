//! Embedding client abstraction
//!
//! Converts text into fixed-dimension vectors via an external provider.
//! Provider failures and malformed responses surface as errors to the
//! caller; this layer performs no retries of its own.

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// HTTP embedding client for an OpenAI-compatible provider endpoint
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create a new HTTP embedder
    pub fn new(
        api_key: String,
        model: String,
        dimension: usize,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            dimension,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingProvider {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingProvider {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::EmbeddingProvider {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::EmbeddingProvider {
                message: "Empty embedding response".to_string(),
            })?;

        if embedding.len() != self.dimension {
            return Err(AppError::EmbeddingProvider {
                message: format!(
                    "Provider returned dimension {} (expected {})",
                    embedding.len(),
                    self.dimension
                ),
            });
        }

        Ok(embedding)
    }
}

/// Collapse newlines to spaces before submitting text to the provider
pub fn normalize_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let timer = crate::metrics::Timer::start();
        let result = self.request(&normalize_text(text)).await;
        crate::metrics::record_embedding(timer.elapsed_secs(), &self.model, result.is_ok());
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock embedder for tests.
///
/// Vectors are a pure function of the input text so ranking tests are
/// reproducible across runs.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = normalize_text(text);
        let seed: u32 = normalized
            .bytes()
            .fold(2166136261u32, |acc, b| (acc ^ b as u32).wrapping_mul(16777619));

        Ok((0..self.dimension)
            .map(|i| ((seed.wrapping_add(i as u32) % 1000) as f32 / 500.0) - 1.0)
            .collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Create an embedder based on configuration.
///
/// Falls back to the deterministic mock when no provider key is configured,
/// so local development works without credentials.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match &config.api_key {
        Some(key) => Ok(Arc::new(HttpEmbedder::new(
            key.clone(),
            config.model.clone(),
            config.dimension,
            config.api_base.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => {
            tracing::warn!("No embedding API key configured, using mock embedder");
            Ok(Arc::new(MockEmbedder::new(config.dimension)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_newlines() {
        assert_eq!(normalize_text("a\nb\r\nc"), "a b  c");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[tokio::test]
    async fn test_mock_embedder_dimension() {
        let embedder = MockEmbedder::new(1536);
        let embedding = embedder.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 1536);
    }

    #[tokio::test]
    async fn test_mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("machine learning ethics").await.unwrap();
        let b = embedder.embed("machine learning ethics").await.unwrap();
        let c = embedder.embed("something else").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_mock_embedder_values_bounded() {
        let embedder = MockEmbedder::new(128);
        let embedding = embedder.embed("bounds").await.unwrap();
        assert!(embedding.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
