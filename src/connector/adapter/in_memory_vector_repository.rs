use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::VectorStore;
use crate::domain::{CodeChunk, DomainError, SemanticHit};

struct Item {
    chunk: CodeChunk,
    vector: Vec<f32>,
}

/// Test/embedding collaborator standing in for the durable vector store: same [`VectorStore`]
/// contract, no persistence. A single reader-writer lock guards the `chunk id -> item` map;
/// dimension is inferred from the first write and frozen, exactly as the durable store behaves.
pub struct InMemoryVectorRepository {
    items: RwLock<HashMap<String, Item>>,
    dimension: RwLock<Option<usize>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            dimension: RwLock::new(None),
        }
    }
}

impl Default for InMemoryVectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStore for InMemoryVectorRepository {
    async fn upsert(&self, chunks: &[CodeChunk], vectors: &[Vec<f32>]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }
        if chunks.len() != vectors.len() {
            return Err(DomainError::invalid_input(
                "chunk count and vector count must match",
            ));
        }

        let dim = vectors[0].len();
        if vectors.iter().any(|v| v.len() != dim) {
            return Err(DomainError::invalid_input(
                "all vectors in a batch must share the same dimension",
            ));
        }

        {
            let mut frozen = self.dimension.write().await;
            match *frozen {
                Some(existing) if existing != dim => {
                    return Err(DomainError::invalid_input(format!(
                        "vector dimension is frozen at {existing}, got {dim}"
                    )));
                }
                Some(_) => {}
                None => *frozen = Some(dim),
            }
        }

        let mut items = self.items.write().await;
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            items.insert(
                chunk.id().to_string(),
                Item {
                    chunk: chunk.clone(),
                    vector: vector.clone(),
                },
            );
        }
        debug!("upserted {} chunks into the in-memory vector store", chunks.len());
        Ok(())
    }

    async fn delete_by_file(&self, file: &str) -> Result<u64, DomainError> {
        let mut items = self.items.write().await;
        let ids: Vec<String> = items
            .values()
            .filter(|item| item.chunk.file() == file)
            .map(|item| item.chunk.id().to_string())
            .collect();
        for id in &ids {
            items.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SemanticHit>, DomainError> {
        let dim = *self.dimension.read().await;
        let Some(dim) = dim else {
            return Ok(Vec::new());
        };
        if vector.len() != dim {
            return Err(DomainError::invalid_input(format!(
                "expected query vector of dimension {dim}, got {}",
                vector.len()
            )));
        }

        let items = self.items.read().await;
        let mut scored: Vec<(f32, &Item)> = items
            .values()
            .map(|item| (cosine_distance(vector, &item.vector), item))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, item)| SemanticHit::new(item.chunk.clone(), 1.0 - distance))
            .collect())
    }

    async fn dimension(&self) -> Result<Option<usize>, DomainError> {
        Ok(*self.dimension.read().await)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.items.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Kind, SourceLang};

    fn chunk(id: &str, file: &str) -> CodeChunk {
        CodeChunk::new(
            id.to_string(),
            "add".into(),
            Kind::Function,
            file.to_string(),
            SourceLang::Ts,
            "function_declaration".into(),
            1,
            1,
            0,
            10,
            "export function add() {}".into(),
            String::new(),
        )
    }

    #[tokio::test]
    async fn dimension_freezes_on_first_write() {
        let store = InMemoryVectorRepository::new();
        store.upsert(&[chunk("a", "a.ts")], &[vec![0.0; 4]]).await.unwrap();
        let err = store
            .upsert(&[chunk("b", "b.ts")], &[vec![0.0; 8]])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn query_orders_by_ascending_distance() {
        let store = InMemoryVectorRepository::new();
        store
            .upsert(
                &[chunk("near", "a.ts"), chunk("far", "b.ts")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();
        let hits = store.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].chunk().id(), "near");
        assert!(hits[0].score() >= hits[1].score());
    }

    #[tokio::test]
    async fn delete_by_file_reclaims_rows() {
        let store = InMemoryVectorRepository::new();
        store.upsert(&[chunk("a", "a.ts")], &[vec![1.0, 0.0]]).await.unwrap();
        let removed = store.delete_by_file("a.ts").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
