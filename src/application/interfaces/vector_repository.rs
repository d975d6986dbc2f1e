use async_trait::async_trait;

use crate::domain::{CodeChunk, DomainError, SemanticHit};

/// Chunk metadata plus a fixed-dimension vector table with KNN, sharing the database file with
/// the [`super::SymbolStore`].
///
/// Dimension inference: the first `upsert` call that writes a vector fixes the table's dimension
/// for the lifetime of the store; a later `upsert` with a mismatched vector length fails with
/// [`DomainError::InvalidInput`].
///
/// Invariant upheld by every implementation: for every row in `chunks` whose vector has been
/// written, there is exactly one `vec_map` row and one vector row — orphans are not permitted
/// after a successful transaction.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upserts `chunks[i]` paired with `vectors[i]` in one transaction. `chunks.len()` must equal
    /// `vectors.len()`.
    async fn upsert(&self, chunks: &[CodeChunk], vectors: &[Vec<f32>]) -> Result<(), DomainError>;

    /// Deletes every chunk (and its vector) whose `file` matches. Returns the number deleted.
    async fn delete_by_file(&self, file: &str) -> Result<u64, DomainError>;

    /// Executes KNN: `ORDER BY distance LIMIT k`, returning hits with `score = 1 - distance`,
    /// strictly ordered by ascending distance (descending score).
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SemanticHit>, DomainError>;

    /// The frozen vector dimension, once a first vector has been written. `None` before that.
    async fn dimension(&self) -> Result<Option<usize>, DomainError>;

    /// Total number of chunks currently stored.
    async fn count(&self) -> Result<u64, DomainError>;
}
