use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_top_k() -> usize {
    10
}

fn default_max_results() -> usize {
    20
}

/// Marker input for tools that take no arguments (`lsp_list`, `lsp_health`).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyInput {}

/// Input for `semantic_search`. When `project` is given and not yet indexed, it is indexed first.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SemanticSearchInput {
    /// Natural-language description of the code to find.
    pub query: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Project root to pre-index if it hasn't been indexed yet.
    pub project: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SemanticSearchHit {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub score: f32,
    pub kind: String,
    pub name: String,
    pub content: String,
}

/// Input for `symbol_search`: exact-name lookup.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SymbolSearchInput {
    pub name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SymbolSearchHit {
    pub id: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub kind: String,
    pub name: String,
}

fn default_language() -> String {
    "typescript".to_string()
}

/// Shared shape for every `lsp_*` position-based tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LspPositionInput {
    pub project: String,
    pub file: String,
    pub line: u32,
    pub character: u32,

    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LspAnalyzeInput {
    pub project: String,
    pub file: String,
    pub line: u32,
    pub character: u32,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub hover: bool,
    #[serde(default)]
    pub definition: bool,
    #[serde(default)]
    pub references: bool,
    #[serde(default)]
    pub implementation: bool,
    #[serde(default)]
    pub type_definition: bool,
    #[serde(default)]
    pub declaration: bool,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
pub struct LspAnalyzeOutput {
    pub hover: Option<serde_json::Value>,
    pub definition: Option<Vec<serde_json::Value>>,
    pub references: Option<Vec<serde_json::Value>>,
    pub implementation: Option<Vec<serde_json::Value>>,
    pub type_definition: Option<Vec<serde_json::Value>>,
    pub declaration: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LspCompletionInput {
    pub project: String,
    pub file: String,
    pub line: u32,
    pub character: u32,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LspSymbolsInput {
    pub project: String,
    pub query: String,

    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AstGrepSearchInput {
    pub project: String,
    pub pattern: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AstGrepRuleInput {
    pub project: String,
    pub rule_yaml: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AstGrepTestInput {
    pub rule_yaml: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AstGrepSyntaxTreeInput {
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_search_input_defaults_top_k() {
        let input: SemanticSearchInput = serde_json::from_str(r#"{"query": "parse json"}"#).unwrap();
        assert_eq!(input.top_k, 10);
        assert!(input.project.is_none());
    }

    #[test]
    fn lsp_analyze_input_flags_default_false() {
        let input: LspAnalyzeInput = serde_json::from_str(
            r#"{"project": "/p", "file": "a.ts", "line": 0, "character": 0, "hover": true}"#,
        )
        .unwrap();
        assert!(input.hover);
        assert!(!input.definition);
        assert_eq!(input.language, "typescript");
    }
}
