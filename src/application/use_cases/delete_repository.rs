use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::application::{FileHashRepository, RepositoryRepository, SymbolStore, VectorStore};
use crate::domain::DomainError;

/// Removes an indexed project: every chunk/vector/symbol whose `file` was recorded for this
/// repository, the file-hash cache, and the repository registry row itself.
pub struct DeleteRepositoryUseCase {
    repository_repo: Arc<dyn RepositoryRepository>,
    vector_store: Arc<dyn VectorStore>,
    symbol_store: Arc<dyn SymbolStore>,
    file_hash_repo: Arc<dyn FileHashRepository>,
}

impl DeleteRepositoryUseCase {
    pub fn new(
        repository_repo: Arc<dyn RepositoryRepository>,
        vector_store: Arc<dyn VectorStore>,
        symbol_store: Arc<dyn SymbolStore>,
        file_hash_repo: Arc<dyn FileHashRepository>,
    ) -> Self {
        Self {
            repository_repo,
            vector_store,
            symbol_store,
            file_hash_repo,
        }
    }

    pub async fn execute(&self, id: &str) -> Result<(), DomainError> {
        let repo = self
            .repository_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repository not found: {id}")))?;

        info!(repository = repo.name(), path = repo.path(), "deleting repository");

        for hash in self.file_hash_repo.find_by_repository(id).await? {
            self.vector_store.delete_by_file(hash.file_path()).await?;
            self.symbol_store.delete_by_file(hash.file_path()).await?;
        }
        self.file_hash_repo.delete_by_repository(id).await?;
        self.repository_repo.delete(id).await?;

        info!("repository deleted");
        Ok(())
    }

    pub async fn delete_by_path(&self, path: &str) -> Result<(), DomainError> {
        let canonical_path = Path::new(path)
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("invalid path '{path}': {e}")))?
            .to_string_lossy()
            .to_string();

        let repo = self
            .repository_repo
            .find_by_path(&canonical_path)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repository not found at path: {path}")))?;

        self.execute(repo.id()).await
    }
}
