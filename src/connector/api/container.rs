use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{
    AstGrepRunner, DeleteRepositoryUseCase, Embedder, Installer, IndexRepositoryUseCase,
    LanguageAdapter, ListRepositoriesUseCase, ParserAdapter, SearchCodeUseCase,
};
use crate::connector::adapter::lsp::{FsInstaller, LspSupervisor, TypeScriptAdapter};
use crate::connector::adapter::{
    DuckdbFileHashRepository, DuckdbRepositoryStore, DuckdbSymbolStore, DuckdbVectorStore,
    HttpEmbedder, LocalEmbedder, TreeSitterParser,
};

const DEFAULT_EMBED_DIMENSIONS: usize = 384;
const DEFAULT_EMBED_BATCH_SIZE: usize = 64;

/// Single source of wiring configuration, built from CLI flags and environment in `main.rs`.
pub struct ContainerConfig {
    pub data_dir: PathBuf,
    /// Overrides the DuckDB file location; defaults to `<data_dir>/ts-index.duckdb`.
    pub db_path: Option<PathBuf>,
    /// Remote embedding endpoint. Absent selects the local deterministic embedder.
    pub embed_url: Option<String>,
    /// Vector dimension used only by the local embedder.
    pub embed_dimensions: usize,
    /// Root cache directory for installed language servers.
    pub lsp_cache_dir: PathBuf,
    pub worker_count: usize,
    pub embed_batch_size: usize,
}

impl ContainerConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            db_path: None,
            embed_url: None,
            embed_dimensions: DEFAULT_EMBED_DIMENSIONS,
            lsp_cache_dir: default_lsp_cache_dir(),
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("ts-index.duckdb"))
    }
}

fn default_lsp_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ts-index")
        .join("lsp-servers")
}

/// Everything the CLI and the MCP tool server depend on, built once in dependency order: config
/// → parser → embedder → stores → search/indexer use cases → LSP supervisor.
pub struct Container {
    pub data_dir: PathBuf,
    pub parser: Arc<dyn ParserAdapter>,
    pub embedder: Arc<dyn Embedder>,
    pub symbol_store: Arc<DuckdbSymbolStore>,
    pub vector_store: Arc<DuckdbVectorStore>,
    pub repository_repo: Arc<DuckdbRepositoryStore>,
    pub file_hash_repo: Arc<DuckdbFileHashRepository>,
    pub index_repository: Arc<IndexRepositoryUseCase>,
    pub search_code: Arc<SearchCodeUseCase>,
    pub list_repositories: Arc<ListRepositoriesUseCase>,
    pub delete_repository: Arc<DeleteRepositoryUseCase>,
    pub lsp_supervisor: Arc<LspSupervisor>,
    pub installer: Arc<dyn Installer>,
    /// The `ast-grep` structural-search collaborator. Always `None`: no concrete implementation
    /// ships with this crate, so the `ast_grep_*` tools report themselves unavailable.
    pub ast_grep: Option<Arc<dyn AstGrepRunner>>,
}

impl Container {
    pub async fn build(config: &ContainerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("failed to create data dir {}", config.data_dir.display()))?;
        std::fs::create_dir_all(&config.lsp_cache_dir)
            .with_context(|| format!("failed to create lsp cache dir {}", config.lsp_cache_dir.display()))?;

        let db_path = config.resolved_db_path();
        debug!(db = %db_path.display(), "opening database");
        let conn = duckdb::Connection::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        let conn = Arc::new(Mutex::new(conn));

        let symbol_store = Arc::new(DuckdbSymbolStore::with_connection(conn.clone()).await?);
        let vector_store = Arc::new(DuckdbVectorStore::with_connection(conn.clone()).await?);
        let repository_repo = Arc::new(DuckdbRepositoryStore::with_connection(conn.clone()).await?);
        let file_hash_repo = Arc::new(DuckdbFileHashRepository::with_connection(conn.clone()).await?);

        let parser: Arc<dyn ParserAdapter> = Arc::new(TreeSitterParser::new());

        let embedder: Arc<dyn Embedder> = match &config.embed_url {
            Some(url) => Arc::new(HttpEmbedder::new(url.clone(), "remote")),
            None => Arc::new(LocalEmbedder::new(config.embed_dimensions)),
        };

        let index_repository = Arc::new(IndexRepositoryUseCase::new(
            parser.clone(),
            embedder.clone(),
            symbol_store.clone(),
            vector_store.clone(),
            repository_repo.clone(),
            file_hash_repo.clone(),
            config.worker_count,
            config.embed_batch_size,
        ));

        let search_code = Arc::new(SearchCodeUseCase::new(embedder.clone(), vector_store.clone()));

        let list_repositories = Arc::new(ListRepositoriesUseCase::new(repository_repo.clone()));
        let delete_repository = Arc::new(DeleteRepositoryUseCase::new(
            repository_repo.clone(),
            vector_store.clone(),
            symbol_store.clone(),
            file_hash_repo.clone(),
        ));

        let installer: Arc<dyn Installer> = Arc::new(FsInstaller::new(config.lsp_cache_dir.clone()));
        let adapters: Vec<Arc<dyn LanguageAdapter>> = vec![Arc::new(TypeScriptAdapter::new())];
        let lsp_supervisor = Arc::new(LspSupervisor::new(installer.clone(), adapters));

        Ok(Self {
            data_dir: config.data_dir.clone(),
            parser,
            embedder,
            symbol_store,
            vector_store,
            repository_repo,
            file_hash_repo,
            index_repository,
            search_code,
            list_repositories,
            delete_repository,
            lsp_supervisor,
            installer,
            ast_grep: None,
        })
    }
}
