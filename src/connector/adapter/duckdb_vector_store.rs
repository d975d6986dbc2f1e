use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorStore;
use crate::domain::{CodeChunk, DomainError, Kind, SemanticHit, SourceLang};

/// Chunk metadata, a fixed-dimension vector table, and the `vec_map` rowid↔chunk_id bijection
/// that keeps vector rowids stable across updates, all sharing one DuckDB connection.
pub struct DuckdbVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbVectorStore {
    pub fn new(path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("failed to open DuckDB database: {e}")))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DomainError::storage(format!("failed to open in-memory DuckDB: {e}")))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Wraps a connection shared with other store adapters: DuckDB permits only one write
    /// connection per database file.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        Self::initialize(&conn.lock().await)?;
        Ok(Self { conn })
    }

    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            "INSTALL vss; LOAD vss; SET hnsw_enable_experimental_persistence = true;",
        )
        .map_err(|e| DomainError::storage(format!("failed to load vss extension: {e}")))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                file TEXT NOT NULL,
                lang TEXT NOT NULL,
                node_type TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                start_byte BIGINT NOT NULL,
                end_byte BIGINT NOT NULL,
                content TEXT NOT NULL,
                signature TEXT NOT NULL,
                docstring TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS chunks_file_idx ON chunks(file);

            CREATE TABLE IF NOT EXISTS vec_map (
                rowid BIGINT NOT NULL,
                chunk_id TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS vec_map_chunk_idx ON vec_map(chunk_id);

            CREATE TABLE IF NOT EXISTS vector_meta (
                id INTEGER PRIMARY KEY,
                dimension INTEGER NOT NULL
            );

            CREATE SEQUENCE IF NOT EXISTS vec_rowid_seq START 1;
            "#,
        )
        .map_err(|e| DomainError::storage(format!("failed to initialize schema: {e}")))?;

        Ok(())
    }

    fn stored_dimension(conn: &Connection) -> Result<Option<usize>, DomainError> {
        conn.query_row("SELECT dimension FROM vector_meta WHERE id = 1", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|d| Some(d as usize))
        .or_else(|e| match e {
            duckdb::Error::QueryReturnedNoRows => Ok(None),
            e => Err(DomainError::storage(format!("failed to read vector dimension: {e}"))),
        })
    }

    /// Creates the dynamically-dimensioned `vectors` table on first use, or validates `dim`
    /// against the frozen dimension on subsequent calls.
    fn ensure_vectors_table(conn: &Connection, dim: usize) -> Result<(), DomainError> {
        match Self::stored_dimension(conn)? {
            Some(existing) if existing != dim => Err(DomainError::invalid_input(format!(
                "vector dimension is frozen at {existing}, got {dim}"
            ))),
            Some(_) => Ok(()),
            None => {
                conn.execute_batch(&format!(
                    "CREATE TABLE vectors (rowid BIGINT PRIMARY KEY, vector FLOAT[{dim}] NOT NULL); \
                     CREATE INDEX vectors_hnsw_idx ON vectors USING HNSW (vector) WITH (metric = 'cosine');"
                ))
                .map_err(|e| DomainError::storage(format!("failed to create vector table: {e}")))?;
                conn.execute(
                    "INSERT INTO vector_meta (id, dimension) VALUES (1, ?)",
                    params![dim as i64],
                )
                .map_err(|e| DomainError::storage(format!("failed to record vector dimension: {e}")))?;
                Ok(())
            }
        }
    }

    fn vector_literal(vector: &[f32], dim: usize) -> String {
        let mut s = String::with_capacity(vector.len() * 8 + 12);
        s.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&v.to_string());
        }
        s.push(']');
        s.push_str(&format!("::FLOAT[{dim}]"));
        s
    }

    fn row_to_chunk(row: &Row) -> Result<CodeChunk, duckdb::Error> {
        let lang = match row.get::<_, String>(4)?.as_str() {
            "tsx" => SourceLang::Tsx,
            _ => SourceLang::Ts,
        };
        Ok(CodeChunk::reconstitute(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            Kind::from_code(&row.get::<_, String>(2)?).unwrap_or(Kind::Function),
            row.get::<_, String>(3)?,
            lang,
            row.get::<_, String>(5)?,
            u32::try_from(row.get::<_, i64>(6)?).unwrap_or(0),
            u32::try_from(row.get::<_, i64>(7)?).unwrap_or(0),
            usize::try_from(row.get::<_, i64>(8)?).unwrap_or(0),
            usize::try_from(row.get::<_, i64>(9)?).unwrap_or(0),
            row.get::<_, String>(10)?,
            row.get::<_, String>(11)?,
            row.get::<_, String>(12)?,
        ))
    }
}

#[async_trait]
impl VectorStore for DuckdbVectorStore {
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

        let mut conn = self.conn.lock().await;
        Self::ensure_vectors_table(&conn, dim)?;

        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("failed to begin transaction: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks \
                     (id, name, kind, file, lang, node_type, start_line, end_line, start_byte, end_byte, content, signature, docstring) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT (id) DO UPDATE SET \
                     name = excluded.name, kind = excluded.kind, file = excluded.file, lang = excluded.lang, \
                     node_type = excluded.node_type, start_line = excluded.start_line, end_line = excluded.end_line, \
                     start_byte = excluded.start_byte, end_byte = excluded.end_byte, content = excluded.content, \
                     signature = excluded.signature, docstring = excluded.docstring",
                )
                .map_err(|e| DomainError::storage(format!("failed to prepare chunk upsert: {e}")))?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id(),
                    chunk.name(),
                    chunk.kind().code(),
                    chunk.file(),
                    chunk.lang().as_str(),
                    chunk.node_type(),
                    chunk.start_line() as i64,
                    chunk.end_line() as i64,
                    chunk.start_byte() as i64,
                    chunk.end_byte() as i64,
                    chunk.content(),
                    chunk.signature(),
                    chunk.docstring(),
                ])
                .map_err(|e| DomainError::storage(format!("failed to upsert chunk {}: {e}", chunk.id())))?;
            }
        }

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let existing_rowid: Option<i64> = tx
                .query_row(
                    "SELECT rowid FROM vec_map WHERE chunk_id = ?",
                    params![chunk.id()],
                    |row| row.get(0),
                )
                .ok();

            let literal = Self::vector_literal(vector, dim);
            match existing_rowid {
                Some(rowid) => {
                    tx.execute(
                        &format!("UPDATE vectors SET vector = {literal} WHERE rowid = ?"),
                        params![rowid],
                    )
                    .map_err(|e| DomainError::storage(format!("failed to update vector: {e}")))?;
                }
                None => {
                    let rowid: i64 = tx
                        .query_row("SELECT nextval('vec_rowid_seq')", [], |row| row.get(0))
                        .map_err(|e| DomainError::storage(format!("failed to allocate rowid: {e}")))?;
                    tx.execute(
                        &format!("INSERT INTO vectors (rowid, vector) VALUES (?, {literal})"),
                        params![rowid],
                    )
                    .map_err(|e| DomainError::storage(format!("failed to insert vector: {e}")))?;
                    tx.execute(
                        "INSERT INTO vec_map (rowid, chunk_id) VALUES (?, ?)",
                        params![rowid, chunk.id()],
                    )
                    .map_err(|e| DomainError::storage(format!("failed to insert vec_map row: {e}")))?;
                }
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("failed to commit: {e}")))?;

        debug!("upserted {} chunks into the vector store", chunks.len());
        Ok(())
    }

    async fn delete_by_file(&self, file: &str) -> Result<u64, DomainError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("failed to begin transaction: {e}")))?;

        tx.execute(
            "DELETE FROM vectors WHERE rowid IN (\
                SELECT m.rowid FROM vec_map m JOIN chunks c ON c.id = m.chunk_id WHERE c.file = ?)",
            params![file],
        )
        .map_err(|e| DomainError::storage(format!("failed to delete vectors: {e}")))?;

        tx.execute(
            "DELETE FROM vec_map WHERE chunk_id IN (SELECT id FROM chunks WHERE file = ?)",
            params![file],
        )
        .map_err(|e| DomainError::storage(format!("failed to delete vec_map rows: {e}")))?;

        let deleted = tx
            .execute("DELETE FROM chunks WHERE file = ?", params![file])
            .map_err(|e| DomainError::storage(format!("failed to delete chunks: {e}")))?;

        tx.commit()
            .map_err(|e| DomainError::storage(format!("failed to commit: {e}")))?;

        Ok(deleted as u64)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SemanticHit>, DomainError> {
        let conn = self.conn.lock().await;
        let Some(dim) = Self::stored_dimension(&conn)? else {
            return Ok(Vec::new());
        };
        if vector.len() != dim {
            return Err(DomainError::invalid_input(format!(
                "expected query vector of dimension {dim}, got {}",
                vector.len()
            )));
        }

        let literal = Self::vector_literal(vector, dim);
        let sql = format!(
            "SELECT c.id, c.name, c.kind, c.file, c.lang, c.node_type, c.start_line, c.end_line, \
                    c.start_byte, c.end_byte, c.content, c.signature, c.docstring, \
                    array_cosine_distance(v.vector, {literal}) AS distance \
             FROM vectors v \
             JOIN vec_map m ON m.rowid = v.rowid \
             JOIN chunks c ON c.id = m.chunk_id \
             ORDER BY distance ASC LIMIT ?"
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("failed to prepare knn query: {e}")))?;
        let mut rows = stmt
            .query(params![k as i64])
            .map_err(|e| DomainError::storage(format!("failed to run knn query: {e}")))?;

        let mut hits = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::storage(format!("failed to read knn row: {e}")))?
        {
            let distance: f64 = row
                .get(13)
                .map_err(|e| DomainError::storage(format!("failed to read distance: {e}")))?;
            let chunk = Self::row_to_chunk(row)
                .map_err(|e| DomainError::storage(format!("failed to parse chunk row: {e}")))?;
            hits.push(SemanticHit::new(chunk, 1.0 - distance as f32));
        }
        Ok(hits)
    }

    async fn dimension(&self) -> Result<Option<usize>, DomainError> {
        let conn = self.conn.lock().await;
        Self::stored_dimension(&conn)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| DomainError::storage(format!("failed to count chunks: {e}")))?;
        Ok(count as u64)
    }
}
