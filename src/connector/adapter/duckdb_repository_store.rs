use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::RepositoryRepository;
use crate::domain::{DomainError, Repository};

/// Registry of indexed project roots: backs the CLI `list`/`stats`/`delete` commands and the
/// file-hash cache's `repository_id` foreign key.
pub struct DuckdbRepositoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbRepositoryStore {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("failed to open DuckDB database: {e}")))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Shares a connection with other store adapters: DuckDB permits only one write connection
    /// per database file.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        Self::initialize_schema(&conn.lock().await)?;
        Ok(Self { conn })
    }

    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS repositories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                chunk_count BIGINT DEFAULT 0,
                file_count BIGINT DEFAULT 0
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("failed to initialize repository schema: {e}")))?;

        debug!("repository registry schema initialized");
        Ok(())
    }

    fn row_to_repository(row: &duckdb::Row) -> Result<Repository, duckdb::Error> {
        Ok(Repository::reconstitute(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get::<_, i64>(5)? as u64,
            row.get::<_, i64>(6)? as u64,
        ))
    }
}

#[async_trait]
impl RepositoryRepository for DuckdbRepositoryStore {
    async fn save(&self, repository: &Repository) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO repositories (id, name, path, created_at, updated_at, chunk_count, file_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                path = excluded.path,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                chunk_count = excluded.chunk_count,
                file_count = excluded.file_count
            "#,
            params![
                repository.id(),
                repository.name(),
                repository.path(),
                repository.created_at(),
                repository.updated_at(),
                repository.chunk_count() as i64,
                repository.file_count() as i64,
            ],
        )
        .map_err(|e| DomainError::storage(format!("failed to save repository: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Repository>, DomainError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, path, created_at, updated_at, chunk_count, file_count FROM repositories WHERE id = ?1",
            params![id],
            Self::row_to_repository,
        )
        .map(Some)
        .or_else(|e| match e {
            duckdb::Error::QueryReturnedNoRows => Ok(None),
            e => Err(DomainError::storage(format!("failed to query repository: {e}"))),
        })
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<Repository>, DomainError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, path, created_at, updated_at, chunk_count, file_count FROM repositories WHERE path = ?1",
            params![path],
            Self::row_to_repository,
        )
        .map(Some)
        .or_else(|e| match e {
            duckdb::Error::QueryReturnedNoRows => Ok(None),
            e => Err(DomainError::storage(format!("failed to query repository by path: {e}"))),
        })
    }

    async fn list(&self) -> Result<Vec<Repository>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, path, created_at, updated_at, chunk_count, file_count FROM repositories ORDER BY name",
            )
            .map_err(|e| DomainError::storage(format!("failed to prepare statement: {e}")))?;

        let rows = stmt
            .query_map([], Self::row_to_repository)
            .map_err(|e| DomainError::storage(format!("failed to query repositories: {e}")))?;

        let mut repos = Vec::new();
        for row in rows {
            repos.push(row.map_err(|e| DomainError::storage(format!("failed to read row: {e}")))?);
        }
        Ok(repos)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM repositories WHERE id = ?1", params![id])
            .map_err(|e| DomainError::storage(format!("failed to delete repository: {e}")))?;
        Ok(())
    }

    async fn update_stats(
        &self,
        id: &str,
        chunk_count: u64,
        file_count: u64,
    ) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        conn.execute(
            "UPDATE repositories SET chunk_count = ?1, file_count = ?2, updated_at = ?3 WHERE id = ?4",
            params![chunk_count as i64, file_count as i64, now, id],
        )
        .map_err(|e| DomainError::storage(format!("failed to update repository stats: {e}")))?;
        Ok(())
    }
}
