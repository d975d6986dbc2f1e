use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;

use crate::application::SymbolStore;
use crate::domain::{DomainError, Kind, SourceLang, Symbol};

/// Relational store for [`Symbol`]s with secondary indexes on name, file, and kind.
pub struct DuckdbSymbolStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbSymbolStore {
    pub fn new(path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("failed to open DuckDB database: {e}")))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        Self::initialize(&conn.lock().await)?;
        Ok(Self { conn })
    }

    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS symbols (
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
                docstring TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS symbols_name_idx ON symbols(name);
            CREATE INDEX IF NOT EXISTS symbols_file_idx ON symbols(file);
            CREATE INDEX IF NOT EXISTS symbols_kind_idx ON symbols(kind);
            "#,
        )
        .map_err(|e| DomainError::storage(format!("failed to initialize symbol schema: {e}")))?;
        Ok(())
    }

    fn row_to_symbol(row: &Row) -> Result<Symbol, duckdb::Error> {
        let lang = match row.get::<_, String>(4)?.as_str() {
            "tsx" => SourceLang::Tsx,
            _ => SourceLang::Ts,
        };
        Ok(Symbol::reconstitute(
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
        ))
    }
}

#[async_trait]
impl SymbolStore for DuckdbSymbolStore {
    async fn upsert(&self, symbols: &[Symbol]) -> Result<(), DomainError> {
        if symbols.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("failed to begin transaction: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO symbols \
                     (id, name, kind, file, lang, node_type, start_line, end_line, start_byte, end_byte, docstring) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT (id) DO UPDATE SET \
                     name = excluded.name, kind = excluded.kind, file = excluded.file, lang = excluded.lang, \
                     node_type = excluded.node_type, start_line = excluded.start_line, end_line = excluded.end_line, \
                     start_byte = excluded.start_byte, end_byte = excluded.end_byte, docstring = excluded.docstring",
                )
                .map_err(|e| DomainError::storage(format!("failed to prepare symbol upsert: {e}")))?;

            for symbol in symbols {
                stmt.execute(params![
                    symbol.id(),
                    symbol.name(),
                    symbol.kind().code(),
                    symbol.file(),
                    symbol.lang().as_str(),
                    symbol.node_type(),
                    symbol.start_line() as i64,
                    symbol.end_line() as i64,
                    symbol.start_byte() as i64,
                    symbol.end_byte() as i64,
                    symbol.docstring(),
                ])
                .map_err(|e| {
                    DomainError::storage(format!("failed to upsert symbol {}: {e}", symbol.id()))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("failed to commit: {e}")))?;
        Ok(())
    }

    async fn delete_by_file(&self, file: &str) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM symbols WHERE file = ?", params![file])
            .map_err(|e| DomainError::storage(format!("failed to delete symbols for {file}: {e}")))?;
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Symbol>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, kind, file, lang, node_type, start_line, end_line, start_byte, end_byte, docstring \
                 FROM symbols WHERE name = ?",
            )
            .map_err(|e| DomainError::storage(format!("failed to prepare name lookup: {e}")))?;

        let rows = stmt
            .query_map(params![name], Self::row_to_symbol)
            .map_err(|e| DomainError::storage(format!("failed to run name lookup: {e}")))?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(|e| DomainError::storage(format!("failed to read symbol row: {e}")))?);
        }
        Ok(symbols)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Symbol>, DomainError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, kind, file, lang, node_type, start_line, end_line, start_byte, end_byte, docstring \
             FROM symbols WHERE id = ?",
            params![id],
            Self::row_to_symbol,
        )
        .map(Some)
        .or_else(|e| match e {
            duckdb::Error::QueryReturnedNoRows => Ok(None),
            e => Err(DomainError::storage(format!("failed to get symbol {id}: {e}"))),
        })
    }
}
