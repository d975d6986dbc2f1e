use std::sync::Arc;

use tracing::debug;

use crate::application::{Embedder, Featurizer, VectorStore};
use crate::domain::{DomainError, SemanticHit};

/// Embeds a query and runs KNN against the vector store, optionally merging in a featurizer's
/// per-feature coefficients.
pub struct SearchCodeUseCase {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    featurizer: Option<Arc<dyn Featurizer>>,
}

impl SearchCodeUseCase {
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, vector_store, featurizer: None }
    }

    pub fn with_featurizer(mut self, featurizer: Arc<dyn Featurizer>) -> Self {
        self.featurizer = Some(featurizer);
        self
    }

    pub async fn execute(&self, query: &str, top_k: usize) -> Result<Vec<SemanticHit>, DomainError> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.vector_store.query(&vector, top_k).await?;
        debug!(query, hits = hits.len(), "semantic search executed");

        let Some(featurizer) = &self.featurizer else {
            return Ok(hits);
        };

        let response = featurizer.embed(query, 8, 0.7).await?;
        let coefficients = response.coefficients();
        Ok(hits.into_iter().map(|hit| hit.with_features(coefficients.clone())).collect())
    }
}
