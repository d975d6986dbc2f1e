use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::{Embedder, FileHashRepository, ParserAdapter, RepositoryRepository, SymbolStore, VectorStore};
use crate::domain::{
    compute_file_hash, piecewise_percent, CodeChunk, DomainError, FileHash, IndexProgress, Repository, SourceLang,
    Stage, Symbol,
};

const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Indexes a TypeScript/JavaScript project: walks the tree, parses changed files with a bounded
/// worker pool, embeds chunks in fixed-size batches, and upserts symbols once at the end.
pub struct IndexRepositoryUseCase {
    parser: Arc<dyn ParserAdapter>,
    embedder: Arc<dyn Embedder>,
    symbol_store: Arc<dyn SymbolStore>,
    vector_store: Arc<dyn VectorStore>,
    repository_repo: Arc<dyn RepositoryRepository>,
    file_hash_repo: Arc<dyn FileHashRepository>,
    worker_count: usize,
    batch_size: usize,
}

enum FileOutcome {
    Skipped,
    Parsed { hash: String, symbols: Vec<Symbol>, chunks: Vec<CodeChunk> },
}

impl IndexRepositoryUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: Arc<dyn ParserAdapter>,
        embedder: Arc<dyn Embedder>,
        symbol_store: Arc<dyn SymbolStore>,
        vector_store: Arc<dyn VectorStore>,
        repository_repo: Arc<dyn RepositoryRepository>,
        file_hash_repo: Arc<dyn FileHashRepository>,
        worker_count: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            parser,
            embedder,
            symbol_store,
            vector_store,
            repository_repo,
            file_hash_repo,
            worker_count: worker_count.max(1),
            batch_size: batch_size.max(1),
        }
    }

    fn scan(root: &Path) -> Vec<PathBuf> {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                entry.file_type().is_file()
                    || !entry
                        .file_name()
                        .to_str()
                        .map(|name| SKIP_DIRS.contains(&name))
                        .unwrap_or(false)
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| SourceLang::from_path(&entry.path().to_string_lossy()).is_some())
            .map(|entry| entry.into_path())
            .collect()
    }

    async fn emit(progress: &Option<mpsc::Sender<IndexProgress>>, event: IndexProgress) {
        if let Some(tx) = progress {
            let _ = tx.send(event).await;
        }
    }

    async fn process_file(
        parser: Arc<dyn ParserAdapter>,
        path: PathBuf,
        existing_hash: Option<String>,
        force: bool,
    ) -> Result<FileOutcome, DomainError> {
        let content = tokio::fs::read_to_string(&path).await?;
        let hash = compute_file_hash(&content);
        if !force {
            if let Some(previous) = existing_hash {
                if previous == hash {
                    return Ok(FileOutcome::Skipped);
                }
            }
        }
        let (symbols, chunks) = tokio::task::spawn_blocking(move || parser.parse_file(&path))
            .await
            .map_err(|e| DomainError::internal(format!("parse worker panicked: {e}")))??;
        Ok(FileOutcome::Parsed { hash, symbols, chunks })
    }

    async fn flush(&self, pending: &mut Vec<CodeChunk>, exact: usize) -> Result<(), DomainError> {
        let take = exact.min(pending.len());
        if take == 0 {
            return Ok(());
        }
        let batch: Vec<CodeChunk> = pending.drain(0..take).collect();
        let texts: Vec<String> = batch.iter().map(CodeChunk::embedding_text).collect();
        let vectors = self.embedder.embed_texts(&texts).await?;
        self.vector_store.upsert(&batch, &vectors).await?;
        Ok(())
    }

    /// Indexes the project rooted at `path`, creating its repository row on first index or
    /// reusing it on re-index. Files whose content hash is unchanged are skipped unless `force`
    /// clears the incremental cache first. Emits [`IndexProgress`] on `progress` if given.
    pub async fn execute(
        &self,
        path: &str,
        name: Option<&str>,
        force: bool,
        progress: Option<mpsc::Sender<IndexProgress>>,
        cancel: Option<CancellationToken>,
    ) -> Result<Repository, DomainError> {
        let absolute = Path::new(path)
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("invalid project path {path}: {e}")))?;
        let path_str = absolute.to_string_lossy().to_string();

        let repository = match self.repository_repo.find_by_path(&path_str).await? {
            Some(repo) => repo,
            None => {
                let repo_name = name.map(String::from).unwrap_or_else(|| {
                    absolute
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unnamed")
                        .to_string()
                });
                let repo = Repository::new(repo_name, path_str.clone());
                self.repository_repo.save(&repo).await?;
                repo
            }
        };

        if force {
            self.file_hash_repo.delete_by_repository(repository.id()).await?;
        }

        Self::emit(
            &progress,
            IndexProgress::new(Stage::Scan, 0, 0, None, 0.0, "scanning project tree".to_string()),
        )
        .await;

        let files = Self::scan(&absolute);
        let total_files = files.len();
        let current_files: HashSet<String> =
            files.iter().map(|p| p.to_string_lossy().to_string()).collect();

        let existing_hashes = self.file_hash_repo.find_by_repository(repository.id()).await?;
        let existing_map: HashMap<String, String> = existing_hashes
            .iter()
            .map(|fh| (fh.file_path().to_string(), fh.content_hash().to_string()))
            .collect();

        let deleted: Vec<String> = existing_map
            .keys()
            .filter(|path| !current_files.contains(*path))
            .cloned()
            .collect();
        for path in &deleted {
            self.vector_store.delete_by_file(path).await?;
            self.symbol_store.delete_by_file(path).await?;
        }
        if !deleted.is_empty() {
            self.file_hash_repo.delete_by_paths(repository.id(), &deleted).await?;
        }

        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut join_set = JoinSet::new();
        for file in files {
            let existing_hash = existing_map.get(&file.to_string_lossy().to_string()).cloned();
            let parser = self.parser.clone();
            let sem = semaphore.clone();
            let file_for_outcome = file.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.expect("semaphore never closes");
                let outcome = Self::process_file(parser, file, existing_hash, force).await;
                (file_for_outcome, outcome)
            });
        }

        let mut symbols_all: Vec<Symbol> = Vec::new();
        let mut pending_chunks: Vec<CodeChunk> = Vec::new();
        let mut new_hashes: Vec<FileHash> = Vec::new();
        let mut files_done = 0usize;
        let mut chunk_delta: i64 = 0;

        while let Some(joined) = join_set.join_next().await {
            if let Some(token) = &cancel {
                if token.is_cancelled() {
                    join_set.abort_all();
                    return Err(DomainError::cancelled("indexing cancelled"));
                }
            }

            let (path, outcome) = joined.map_err(|e| DomainError::internal(format!("indexing task panicked: {e}")))?;
            let path_str = path.to_string_lossy().to_string();

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    join_set.abort_all();
                    return Err(err);
                }
            };

            match outcome {
                FileOutcome::Skipped => {
                    debug!(file = %path_str, "unchanged, skipping");
                }
                FileOutcome::Parsed { hash, symbols, chunks } => {
                    let removed = self.vector_store.delete_by_file(&path_str).await?;
                    self.symbol_store.delete_by_file(&path_str).await?;
                    chunk_delta -= removed as i64;
                    chunk_delta += chunks.len() as i64;

                    new_hashes.push(FileHash::new(path_str.clone(), hash, repository.id().to_string()));
                    symbols_all.extend(symbols);
                    pending_chunks.extend(chunks);

                    while pending_chunks.len() >= self.batch_size {
                        self.flush(&mut pending_chunks, self.batch_size).await?;
                    }
                }
            }

            files_done += 1;
            let percent = piecewise_percent(Stage::Parse, files_done, total_files);
            Self::emit(
                &progress,
                IndexProgress::new(
                    Stage::Parse,
                    total_files,
                    files_done,
                    Some(path_str),
                    percent,
                    "parsing".to_string(),
                ),
            )
            .await;
        }

        let remaining = pending_chunks.len();
        self.flush(&mut pending_chunks, remaining).await?;
        Self::emit(
            &progress,
            IndexProgress::new(
                Stage::Embed,
                total_files,
                total_files,
                None,
                piecewise_percent(Stage::Embed, total_files, total_files),
                "embedding complete".to_string(),
            ),
        )
        .await;

        if !new_hashes.is_empty() {
            self.file_hash_repo.save_batch(&new_hashes).await?;
        }

        self.symbol_store.upsert(&symbols_all).await?;
        Self::emit(
            &progress,
            IndexProgress::new(
                Stage::Symbols,
                total_files,
                total_files,
                None,
                1.0,
                "symbols upserted".to_string(),
            ),
        )
        .await;

        let final_file_count = current_files.len() as u64;
        let final_chunk_count = (repository.chunk_count() as i64 + chunk_delta).max(0) as u64;
        self.repository_repo
            .update_stats(repository.id(), final_chunk_count, final_file_count)
            .await?;

        Self::emit(
            &progress,
            IndexProgress::new(Stage::Done, total_files, total_files, None, 1.0, "done".to_string()),
        )
        .await;

        info!(
            repository = repository.id(),
            files = final_file_count,
            chunks = final_chunk_count,
            "indexing finished"
        );

        self.repository_repo
            .find_by_id(repository.id())
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repository {} vanished after indexing", repository.id())))
    }

    /// Re-indexes a single file: delete-by-file on both stores, parse, embed every chunk as one
    /// batch, then upsert symbols and vectors.
    pub async fn index_file(&self, absolute_path: &Path) -> Result<(), DomainError> {
        let path_str = absolute_path.to_string_lossy().to_string();
        self.symbol_store.delete_by_file(&path_str).await?;
        self.vector_store.delete_by_file(&path_str).await?;

        let parser = self.parser.clone();
        let path = absolute_path.to_path_buf();
        let (symbols, chunks) = tokio::task::spawn_blocking(move || parser.parse_file(&path))
            .await
            .map_err(|e| DomainError::internal(format!("parse worker panicked: {e}")))??;

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(CodeChunk::embedding_text).collect();
            let vectors = self.embedder.embed_texts(&texts).await?;
            self.vector_store.upsert(&chunks, &vectors).await?;
        }
        self.symbol_store.upsert(&symbols).await?;
        warn!(file = %path_str, "single-file re-index complete");
        Ok(())
    }
}
