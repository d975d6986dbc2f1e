mod code_chunk;
mod file_hash;
mod hit;
mod progress;
mod repository;
mod symbol;

pub use code_chunk::CodeChunk;
pub use file_hash::{compute_file_hash, FileHash};
pub use hit::{SemanticHit, SymbolHit};
pub use progress::{piecewise_percent, IndexProgress, Stage};
pub use repository::Repository;
pub use symbol::{Kind, SourceLang, Symbol};
