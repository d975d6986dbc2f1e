use serde::{Deserialize, Serialize};

use super::code_chunk::CodeChunk;
use super::symbol::Symbol;

/// A KNN result: higher `score` is more similar. Derived from raw distance `d` as `1 - d`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticHit {
    chunk: CodeChunk,
    score: f32,
    /// Featurizer coefficients merged in by the search service, keyed by feature id.
    #[serde(default)]
    features: std::collections::HashMap<String, f32>,
}

impl SemanticHit {
    pub fn new(chunk: CodeChunk, score: f32) -> Self {
        Self {
            chunk,
            score,
            features: std::collections::HashMap::new(),
        }
    }

    pub fn with_features(mut self, features: std::collections::HashMap<String, f32>) -> Self {
        self.features = features;
        self
    }

    pub fn chunk(&self) -> &CodeChunk {
        &self.chunk
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn features(&self) -> &std::collections::HashMap<String, f32> {
        &self.features
    }
}

/// An exact-match symbol lookup result. Ordering follows storage order: stable but unspecified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolHit {
    symbol: Symbol,
}

impl SymbolHit {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}
