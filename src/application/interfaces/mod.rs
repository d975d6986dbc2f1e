mod ast_grep;
mod embedding_service;
mod featurizer;
mod file_hash_repository;
mod lsp;
mod parser_service;
mod repository_repository;
mod symbol_store;
mod vector_repository;

pub use ast_grep::*;
pub use embedding_service::*;
pub use featurizer::*;
pub use file_hash_repository::*;
pub use lsp::*;
pub use parser_service::*;
pub use repository_repository::*;
pub use symbol_store::*;
pub use vector_repository::*;
