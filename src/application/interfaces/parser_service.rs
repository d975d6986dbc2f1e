use std::path::Path;

use crate::domain::{CodeChunk, DomainError, Symbol};

/// Tree-sitter driven extraction of symbols and chunks from TypeScript/JavaScript source.
///
/// Fails with [`DomainError::ParseError`] only on IO or grammar-load failure; malformed source
/// yields best-effort partial results rather than an error.
pub trait ParserAdapter: Send + Sync {
    /// Parses a single `.ts`/`.tsx` file into its declarations.
    fn parse_file(&self, path: &Path) -> Result<(Vec<Symbol>, Vec<CodeChunk>), DomainError>;

    /// Recursively parses every `.ts`/`.tsx` file under `root`, skipping `node_modules`, `.git`,
    /// `dist`, `build`, and `.d.ts` files.
    fn parse_project(&self, root: &Path) -> Result<(Vec<Symbol>, Vec<CodeChunk>), DomainError>;
}
