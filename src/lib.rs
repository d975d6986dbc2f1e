//! # ts-index
//!
//! Indexes TypeScript/JavaScript source trees for exact symbol lookup, semantic vector search,
//! and language-server introspection, exposed as a CLI and as MCP tools.
//!
//! ## Architecture
//!
//! The crate is organized following Domain-Driven Design principles:
//!
//! - `domain`: Core business models and error types
//! - `application`: Use cases and the interfaces connectors implement
//! - `connector`: External integrations (DuckDB, tree-sitter, embedders, LSP, MCP)
//! - `cli`: Command-line argument definitions

pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

// Re-export commonly used types
pub use application::*;
pub use cli::Commands;
pub use connector::*;
pub use domain::*;
