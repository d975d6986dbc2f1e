mod duckdb_file_hash_repository;
mod duckdb_repository_store;
mod duckdb_symbol_store;
mod duckdb_vector_store;
mod http_embedder;
mod in_memory_vector_repository;
mod local_embedder;
mod treesitter_parser;

pub mod lsp;
pub mod mcp;

pub use duckdb_file_hash_repository::DuckdbFileHashRepository;
pub use duckdb_repository_store::DuckdbRepositoryStore;
pub use duckdb_symbol_store::DuckdbSymbolStore;
pub use duckdb_vector_store::DuckdbVectorStore;
pub use http_embedder::HttpEmbedder;
pub use in_memory_vector_repository::InMemoryVectorRepository;
pub use local_embedder::LocalEmbedder;
pub use treesitter_parser::TreeSitterParser;
