use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::Embedder;
use crate::domain::DomainError;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    sentences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Calls a remote embedding service over HTTP: POST `{sentences: [...]}`, expect a JSON array of
/// vectors back in the same order as the request.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model_name: String,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { sentences: texts })
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("request to {} failed: {e}", self.endpoint)))?;

        if !response.status().is_success() {
            return Err(DomainError::embedding(format!(
                "embedding server at {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let EmbedResponse(vectors) = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("invalid embedding response: {e}")))?;

        if vectors.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "embedding server returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }

        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let texts = vec![query.to_string()];
        let mut vectors = self.embed_texts(&texts).await?;
        vectors.pop().ok_or_else(|| DomainError::embedding("empty embedding response"))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
