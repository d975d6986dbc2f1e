use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::connector::adapter::lsp::path_to_uri;

use super::super::Container;

pub struct LspController<'a> {
    container: &'a Container,
}

impl<'a> LspController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    fn canonical_root(project: &str) -> Result<std::path::PathBuf> {
        Path::new(project)
            .canonicalize()
            .with_context(|| format!("invalid project path: {project}"))
    }

    pub async fn info(&self, project: String, language: String) -> Result<String> {
        let root = Self::canonical_root(&project)?;
        let running = self
            .container
            .lsp_supervisor
            .running()
            .await
            .into_iter()
            .any(|(workspace, lang)| workspace == root.to_string_lossy() && lang == language);
        let installed = self
            .container
            .lsp_supervisor
            .health()
            .await
            .into_iter()
            .find(|(lang, _, _)| *lang == language)
            .map(|(_, installed, _)| installed)
            .unwrap_or(false);

        Ok(format!(
            "Language server for '{language}' in {}\n  installed: {installed}\n  running:   {running}",
            root.display(),
        ))
    }

    /// Opens `file` against the `(project, language)` server, then runs whichever capability
    /// operations the caller requested at `(line, character)`.
    #[allow(clippy::too_many_arguments)]
    pub async fn analyze(
        &self,
        project: String,
        file: String,
        line: u32,
        character: u32,
        hover: bool,
        definition: bool,
        references: bool,
        implementation: bool,
        type_definition: bool,
        declaration: bool,
    ) -> Result<String> {
        let root = Self::canonical_root(&project)?;
        let client = self
            .container
            .lsp_supervisor
            .get_or_create(&root, "typescript")
            .await?;

        let file_path = root.join(&file);
        let text = tokio::fs::read_to_string(&file_path)
            .await
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        let uri = path_to_uri(&file_path);
        let language_id = if file.ends_with(".tsx") { "typescriptreact" } else { "typescript" };
        client.did_open(&uri, language_id, &text).await?;

        let mut output = String::new();
        if hover {
            let result = client.hover(&uri, line, character).await?;
            output.push_str(&format!("hover: {}\n", render(&result)));
        }
        if definition {
            let result = client.goto_definition(&uri, line, character).await?;
            output.push_str(&format!("definition: {}\n", render_list(&result)));
        }
        if references {
            let result = client.find_references(&uri, line, character).await?;
            output.push_str(&format!("references: {}\n", render_list(&result)));
        }
        if implementation {
            let result = client.goto_implementation(&uri, line, character).await?;
            output.push_str(&format!("implementation: {}\n", render_list(&result)));
        }
        if type_definition {
            let result = client.goto_type_definition(&uri, line, character).await?;
            output.push_str(&format!("type_definition: {}\n", render_list(&result)));
        }
        if declaration {
            let result = client.goto_declaration(&uri, line, character).await?;
            output.push_str(&format!("declaration: {}\n", render_list(&result)));
        }

        if output.is_empty() {
            output.push_str("no capability flag was set; nothing to report\n");
        }
        Ok(output)
    }

    pub async fn completion(
        &self,
        project: String,
        file: String,
        line: u32,
        character: u32,
        max_results: usize,
    ) -> Result<String> {
        let root = Self::canonical_root(&project)?;
        let client = self
            .container
            .lsp_supervisor
            .get_or_create(&root, "typescript")
            .await?;

        let file_path = root.join(&file);
        let text = tokio::fs::read_to_string(&file_path)
            .await
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        let uri = path_to_uri(&file_path);
        let language_id = if file.ends_with(".tsx") { "typescriptreact" } else { "typescript" };
        client.did_open(&uri, language_id, &text).await?;

        let items = client.completion(&uri, line, character).await?;
        Ok(render_list(&items.into_iter().take(max_results).collect::<Vec<_>>()))
    }

    pub async fn symbols(&self, project: String, query: String) -> Result<String> {
        let root = Self::canonical_root(&project)?;
        let client = self
            .container
            .lsp_supervisor
            .get_or_create(&root, "typescript")
            .await?;
        let results = client.workspace_symbols(&query).await?;
        Ok(render_list(&results))
    }

    pub async fn install(&self, server: String, version: Option<String>) -> Result<String> {
        let path = self
            .container
            .installer
            .install(&server, version.as_deref().map(|v| semver::Version::parse(v)).transpose()?.as_ref())
            .await?;
        Ok(format!("Installed {server} at {}", path.display()))
    }

    pub async fn install_by_language(&self, language: String, version: Option<String>) -> Result<String> {
        let path = self
            .container
            .lsp_supervisor
            .install_language(&language, version.as_deref())
            .await?;
        Ok(format!("Installed the '{language}' language server at {}", path.display()))
    }

    pub async fn list(&self) -> Result<String> {
        let running = self.container.lsp_supervisor.running().await;
        if running.is_empty() {
            return Ok("No language servers are running.".to_string());
        }
        let mut output = "Running language servers:\n\n".to_string();
        for (workspace, language) in running {
            output.push_str(&format!("  {language} @ {workspace}\n"));
        }
        Ok(output)
    }

    pub async fn health(&self) -> Result<String> {
        let report = self.container.lsp_supervisor.health().await;
        if report.is_empty() {
            return Ok("No language adapters are registered.".to_string());
        }
        let mut output = "Language adapter health:\n\n".to_string();
        for (language, installed, running) in report {
            output.push_str(&format!(
                "  {language}: installed={installed} running={running}\n"
            ));
        }
        Ok(output)
    }
}

fn render(value: &Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

fn render_list(items: &[Value]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n  ")
}
