use async_trait::async_trait;

use crate::domain::DomainError;

/// Generates vector embeddings for code chunks and search queries.
///
/// Two implementations live in the connector layer: a deterministic local embedder (hash-based,
/// used for tests and offline runs) and a remote HTTP embedder. A remote embedding failure bubbles
/// up and aborts the enclosing batch; there is no retry at this layer.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts, preserving input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Embeds a single search query.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError>;

    /// Identifies the embedding model, surfaced in logs and diagnostics.
    fn model_name(&self) -> &str;
}
