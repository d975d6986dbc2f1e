//! External integrations implementing the `application` layer's interfaces: DuckDB-backed
//! storage (symbols, vectors, file hashes, the repository registry), tree-sitter parsing,
//! pluggable embedders, the LSP client/supervisor/installer, and the MCP tool server.

pub mod adapter;
pub mod api;
