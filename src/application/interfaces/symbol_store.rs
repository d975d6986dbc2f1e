use async_trait::async_trait;

use crate::domain::{DomainError, Symbol};

/// Relational persistence of [`Symbol`]s, with secondary indexes on name, file, and kind.
///
/// `upsert` is transactional and idempotent by ID: `ON CONFLICT` replaces every mutable field, so
/// two consecutive `upsert([s])` calls leave the store indistinguishable from one call.
#[async_trait]
pub trait SymbolStore: Send + Sync {
    async fn upsert(&self, symbols: &[Symbol]) -> Result<(), DomainError>;

    async fn delete_by_file(&self, file: &str) -> Result<(), DomainError>;

    async fn find_by_name(&self, name: &str) -> Result<Vec<Symbol>, DomainError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Symbol>, DomainError>;
}
