use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::tool;
use rmcp::tool_handler;
use rmcp::tool_router;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;

use crate::connector::adapter::lsp::path_to_uri;
use crate::connector::api::Container;
use crate::domain::{SemanticHit, Symbol};

use super::tools::{
    AstGrepRuleInput, AstGrepSearchInput, AstGrepSyntaxTreeInput, AstGrepTestInput, EmptyInput,
    LspAnalyzeInput, LspAnalyzeOutput, LspCompletionInput, LspPositionInput, LspSymbolsInput,
    SemanticSearchHit, SemanticSearchInput, SymbolSearchHit, SymbolSearchInput,
};

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to serialize result: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn tool_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

fn semantic_hit_to_output(hit: &SemanticHit) -> SemanticSearchHit {
    let chunk = hit.chunk();
    SemanticSearchHit {
        file: chunk.file().to_string(),
        start_line: chunk.start_line(),
        end_line: chunk.end_line(),
        score: hit.score(),
        kind: chunk.kind().to_string(),
        name: chunk.name().to_string(),
        content: chunk.content().to_string(),
    }
}

fn symbol_to_output(symbol: &Symbol) -> SymbolSearchHit {
    SymbolSearchHit {
        id: symbol.id().to_string(),
        file: symbol.file().to_string(),
        start_line: symbol.start_line(),
        end_line: symbol.end_line(),
        kind: symbol.kind().to_string(),
        name: symbol.name().to_string(),
    }
}

/// Exposes the indexing, search, and LSP introspection surface as MCP tools. Every tool shares
/// this one `Container`, so the same state backs the CLI and every transport below.
#[derive(Clone)]
pub struct TsIndexToolServer {
    container: Arc<Container>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TsIndexToolServer {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            tool_router: Self::tool_router(),
        }
    }

    /// Semantic vector search over indexed code. Optionally pre-indexes `project` if it hasn't
    /// been indexed yet, then embeds `query` and returns the top `top_k` matches by cosine score.
    #[tool(name = "semantic_search")]
    async fn semantic_search(
        &self,
        params: Parameters<SemanticSearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;

        if let Some(project) = &input.project {
            let canonical = std::path::Path::new(project)
                .canonicalize()
                .map_err(|e| tool_error(format!("invalid project path '{project}': {e}")))?
                .to_string_lossy()
                .to_string();
            let known = self
                .container
                .list_repositories
                .get_by_path(&canonical)
                .await
                .map_err(|e| tool_error(e.to_string()))?;
            if known.is_none() {
                self.container
                    .index_repository
                    .execute(project, None, false, None, None)
                    .await
                    .map_err(|e| tool_error(format!("pre-indexing '{project}' failed: {e}")))?;
            }
        }

        let hits = self
            .container
            .search_code
            .execute(&input.query, input.top_k)
            .await
            .map_err(|e| tool_error(e.to_string()))?;

        json_result(&hits.iter().map(semantic_hit_to_output).collect::<Vec<_>>())
    }

    /// Exact-name symbol lookup.
    #[tool(name = "symbol_search")]
    async fn symbol_search(
        &self,
        params: Parameters<SymbolSearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let hits = self
            .container
            .symbol_store
            .find_by_name(&params.0.name)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&hits.iter().map(symbol_to_output).collect::<Vec<_>>())
    }

    async fn opened_client(
        &self,
        project: &str,
        file: &str,
        language: &str,
    ) -> Result<(Arc<crate::connector::adapter::lsp::LspClient>, String), McpError> {
        let root = std::path::Path::new(project)
            .canonicalize()
            .map_err(|e| tool_error(format!("invalid project path '{project}': {e}")))?;
        let client = self
            .container
            .lsp_supervisor
            .get_or_create(&root, language)
            .await
            .map_err(|e| tool_error(e.to_string()))?;

        let file_path = root.join(file);
        let text = tokio::fs::read_to_string(&file_path)
            .await
            .map_err(|e| tool_error(format!("failed to read {}: {e}", file_path.display())))?;
        let uri = path_to_uri(&file_path);
        let language_id = if file.ends_with(".tsx") { "typescriptreact" } else { "typescript" };
        client
            .did_open(&uri, language_id, &text)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        Ok((client, uri))
    }

    /// Any combination of hover/definition/references/implementation/type-definition/declaration
    /// at a position, per whichever flags are set.
    #[tool(name = "lsp_analyze")]
    async fn lsp_analyze(
        &self,
        params: Parameters<LspAnalyzeInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let (client, uri) = self.opened_client(&input.project, &input.file, &input.language).await?;
        let mut output = LspAnalyzeOutput::default();

        if input.hover {
            output.hover = client
                .hover(&uri, input.line, input.character)
                .await
                .map_err(|e| tool_error(e.to_string()))?;
        }
        if input.definition {
            output.definition = Some(
                client
                    .goto_definition(&uri, input.line, input.character)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?,
            );
        }
        if input.references {
            output.references = Some(
                client
                    .find_references(&uri, input.line, input.character)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?,
            );
        }
        if input.implementation {
            output.implementation = Some(
                client
                    .goto_implementation(&uri, input.line, input.character)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?,
            );
        }
        if input.type_definition {
            output.type_definition = Some(
                client
                    .goto_type_definition(&uri, input.line, input.character)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?,
            );
        }
        if input.declaration {
            output.declaration = Some(
                client
                    .goto_declaration(&uri, input.line, input.character)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?,
            );
        }

        json_result(&output)
    }

    /// Completions at a position, capped at `max_results`.
    #[tool(name = "lsp_completion")]
    async fn lsp_completion(
        &self,
        params: Parameters<LspCompletionInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let (client, uri) = self.opened_client(&input.project, &input.file, &input.language).await?;
        let items = client
            .completion(&uri, input.line, input.character)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&items.into_iter().take(input.max_results).collect::<Vec<_>>())
    }

    /// Workspace symbol search via the running language server.
    #[tool(name = "lsp_symbols")]
    async fn lsp_symbols(
        &self,
        params: Parameters<LspSymbolsInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let root = std::path::Path::new(&input.project)
            .canonicalize()
            .map_err(|e| tool_error(format!("invalid project path '{}': {e}", input.project)))?;
        let client = self
            .container
            .lsp_supervisor
            .get_or_create(&root, &input.language)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        let results = client
            .workspace_symbols(&input.query)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&results)
    }

    /// Goto-implementation at a position.
    #[tool(name = "lsp_implementation")]
    async fn lsp_implementation(
        &self,
        params: Parameters<LspPositionInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let (client, uri) = self.opened_client(&input.project, &input.file, &input.language).await?;
        let results = client
            .goto_implementation(&uri, input.line, input.character)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&results)
    }

    /// Goto-type-definition at a position.
    #[tool(name = "lsp_type_definition")]
    async fn lsp_type_definition(
        &self,
        params: Parameters<LspPositionInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let (client, uri) = self.opened_client(&input.project, &input.file, &input.language).await?;
        let results = client
            .goto_type_definition(&uri, input.line, input.character)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&results)
    }

    /// Goto-declaration at a position.
    #[tool(name = "lsp_declaration")]
    async fn lsp_declaration(
        &self,
        params: Parameters<LspPositionInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let (client, uri) = self.opened_client(&input.project, &input.file, &input.language).await?;
        let results = client
            .goto_declaration(&uri, input.line, input.character)
            .await
            .map_err(|e| tool_error(e.to_string()))?;
        json_result(&results)
    }

    /// `(workspace, language)` pairs with a currently running language server.
    #[tool(name = "lsp_list")]
    async fn lsp_list(&self, _params: Parameters<EmptyInput>) -> Result<CallToolResult, McpError> {
        json_result(&self.container.lsp_supervisor.running().await)
    }

    /// Installed/running status per registered language adapter.
    #[tool(name = "lsp_health")]
    async fn lsp_health(&self, _params: Parameters<EmptyInput>) -> Result<CallToolResult, McpError> {
        json_result(&self.container.lsp_supervisor.health().await)
    }

    /// Structural pattern search via `ast-grep`. Reports unavailable: no `ast-grep` collaborator
    /// is configured in this deployment.
    #[tool(name = "ast_grep_search")]
    async fn ast_grep_search(
        &self,
        params: Parameters<AstGrepSearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        match &self.container.ast_grep {
            Some(runner) => {
                let matches = runner
                    .search(&input.project, &input.pattern)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?;
                json_result(&matches)
            }
            None => Err(tool_error("no ast-grep collaborator is configured")),
        }
    }

    /// Runs a declarative `ast-grep` rule. Reports unavailable: no collaborator is configured.
    #[tool(name = "ast_grep_rule")]
    async fn ast_grep_rule(
        &self,
        params: Parameters<AstGrepRuleInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = params.0;
        match &self.container.ast_grep {
            Some(runner) => {
                let matches = runner
                    .rule(&input.project, &input.rule_yaml)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?;
                json_result(&matches)
            }
            None => Err(tool_error("no ast-grep collaborator is configured")),
        }
    }

    /// Runs an `ast-grep` rule's test fixtures. Reports unavailable: no collaborator is
    /// configured.
    #[tool(name = "ast_grep_test")]
    async fn ast_grep_test(
        &self,
        params: Parameters<AstGrepTestInput>,
    ) -> Result<CallToolResult, McpError> {
        match &self.container.ast_grep {
            Some(runner) => {
                let results = runner
                    .test(&params.0.rule_yaml)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?;
                json_result(&results)
            }
            None => Err(tool_error("no ast-grep collaborator is configured")),
        }
    }

    /// Renders a source snippet's concrete syntax tree. Reports unavailable: no collaborator is
    /// configured.
    #[tool(name = "ast_grep_syntax_tree")]
    async fn ast_grep_syntax_tree(
        &self,
        params: Parameters<AstGrepSyntaxTreeInput>,
    ) -> Result<CallToolResult, McpError> {
        match &self.container.ast_grep {
            Some(runner) => {
                let tree = runner
                    .syntax_tree(&params.0.source)
                    .await
                    .map_err(|e| tool_error(e.to_string()))?;
                Ok(CallToolResult::success(vec![Content::text(tree)]))
            }
            None => Err(tool_error("no ast-grep collaborator is configured")),
        }
    }
}

#[tool_handler]
impl ServerHandler for TsIndexToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Indexes TypeScript/JavaScript projects for exact symbol lookup, semantic vector \
                 search, and language-server introspection. Call `semantic_search` or \
                 `symbol_search` to find code, and the `lsp_*` tools for hover/definitions/\
                 references/completions against a running language server."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tool transport parity (spec scenario 6): every transport binds the same `ToolRouter`
    /// built by `Self::tool_router()`, so the registry — name + schema per tool — is a pure
    /// function of the type and cannot vary between stdio/HTTP/SSE/in-process.
    #[test]
    fn tool_registry_is_deterministic() {
        let first = TsIndexToolServer::tool_router().list_all();
        let second = TsIndexToolServer::tool_router().list_all();

        let mut first_names: Vec<_> = first.iter().map(|t| t.name.to_string()).collect();
        let mut second_names: Vec<_> = second.iter().map(|t| t.name.to_string()).collect();
        first_names.sort();
        second_names.sort();
        assert_eq!(first_names, second_names);

        for expected in [
            "semantic_search",
            "symbol_search",
            "lsp_analyze",
            "lsp_completion",
            "lsp_symbols",
            "lsp_implementation",
            "lsp_type_definition",
            "lsp_declaration",
            "lsp_list",
            "lsp_health",
            "ast_grep_search",
            "ast_grep_rule",
            "ast_grep_test",
            "ast_grep_syntax_tree",
        ] {
            assert!(first_names.contains(&expected.to_string()), "missing tool {expected}");
        }
    }
}
