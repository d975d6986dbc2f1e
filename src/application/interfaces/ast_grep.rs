use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// One structural match reported by the `ast-grep` collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstGrepMatch {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
}

/// Outcome of running a declarative ast-grep rule against a test fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstGrepTestResult {
    pub passed: bool,
    pub message: String,
}

/// External structural-search collaborator backing the `ast_grep_*` tools. No concrete
/// implementation ships with this crate; the core only specifies the contract, the same way
/// [`super::Featurizer`] specifies the LLM feature-scoring contract without shipping a model.
#[async_trait]
pub trait AstGrepRunner: Send + Sync {
    /// Structural pattern search, e.g. `console.log($ARG)`, rooted at `project`.
    async fn search(&self, project: &str, pattern: &str) -> Result<Vec<AstGrepMatch>, DomainError>;

    /// Runs a YAML rule document against `project`.
    async fn rule(&self, project: &str, rule_yaml: &str) -> Result<Vec<AstGrepMatch>, DomainError>;

    /// Executes a rule's bundled test fixtures and reports pass/fail per case.
    async fn test(&self, rule_yaml: &str) -> Result<Vec<AstGrepTestResult>, DomainError>;

    /// Renders the concrete syntax tree for `source`, for interactively authoring rules/patterns.
    async fn syntax_tree(&self, source: &str) -> Result<String, DomainError>;
}
