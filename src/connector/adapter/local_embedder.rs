use async_trait::async_trait;
use sha1::{Digest, Sha1};

use crate::application::Embedder;
use crate::domain::DomainError;

/// Deterministic hash-based embedder: no network, no model weights. Used in tests and offline
/// runs where exact semantic quality does not matter, only stability and dimension-matching.
pub struct LocalEmbedder {
    dimension: usize,
}

impl LocalEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut hasher = Sha1::new();
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();

        (0..self.dimension)
            .map(|i| {
                let byte = digest[i % digest.len()];
                (byte as i8) as f32 / 127.0
            })
            .collect()
    }
}

impl Default for LocalEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| self.hash_to_vector(t)).collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.hash_to_vector(query))
    }

    fn model_name(&self) -> &str {
        "local-sha1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_input_yields_same_vector() {
        let embedder = LocalEmbedder::new(64);
        let a = embedder.embed_query("fn add(a, b)").await.unwrap();
        let b = embedder.embed_query("fn add(a, b)").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_input_yields_different_vector() {
        let embedder = LocalEmbedder::new(64);
        let a = embedder.embed_query("fn add(a, b)").await.unwrap();
        let b = embedder.embed_query("fn subtract(a, b)").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vector_has_configured_dimension() {
        let embedder = LocalEmbedder::new(257);
        let v = embedder.embed_query("x").await.unwrap();
        assert_eq!(v.len(), 257);
    }

    #[tokio::test]
    async fn values_are_scaled_into_unit_range() {
        let embedder = LocalEmbedder::new(128);
        let v = embedder.embed_query("scaled").await.unwrap();
        assert!(v.iter().all(|x| *x >= -1.0 && *x <= 1.0));
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let embedder = LocalEmbedder::new(32);
        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let batch = embedder.embed_texts(&texts).await.unwrap();
        for (text, vec) in texts.iter().zip(batch.iter()) {
            assert_eq!(*vec, embedder.embed_query(text).await.unwrap());
        }
    }
}
