use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::application::{Installer, LanguageAdapter, ServerCommand};
use crate::domain::DomainError;

const SERVER_NAME: &str = "typescript-language-server";
const ALT_SYSTEM_BINARY: &str = "vtsls";

/// TypeScript/TSX language support. Resolution order: a locally installed
/// `typescript-language-server` (cache-managed), then a system `vtsls`, then a system
/// `typescript-language-server` on `PATH`.
pub struct TypeScriptAdapter;

impl TypeScriptAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn server_name(&self) -> &'static str {
        SERVER_NAME
    }

    async fn resolve_command(
        &self,
        installer: &dyn Installer,
        _workspace_root: &Path,
    ) -> Result<ServerCommand, DomainError> {
        let cached = installer.cached_versions(SERVER_NAME).into_iter().last();
        if let Some(version) = cached {
            if let Some(bin) = installer.cached_install(SERVER_NAME, &version) {
                return Ok(ServerCommand::new(bin.to_string_lossy().to_string())
                    .with_args(["--stdio"]));
            }
        }

        if let Some(vtsls) = installer.find_on_path(ALT_SYSTEM_BINARY) {
            return Ok(ServerCommand::new(vtsls.to_string_lossy().to_string()).with_args(["--stdio"]));
        }

        if let Some(tsserver) = installer.find_on_path(SERVER_NAME) {
            return Ok(ServerCommand::new(tsserver.to_string_lossy().to_string())
                .with_args(["--stdio"]));
        }

        Err(DomainError::not_found(format!(
            "{SERVER_NAME} is not installed; run the install command first"
        )))
    }

    fn initialization_options(&self, _workspace_root: &Path) -> Value {
        json!({
            "preferences": {
                "includeCompletionsForModuleExports": true,
                "includeCompletionsWithInsertText": true,
            },
            "hostInfo": "ts-index",
        })
    }

    fn workspace_configuration(&self, workspace_root: &Path) -> Value {
        let has_tsconfig = workspace_root.join("tsconfig.json").exists();
        json!({
            "typescript": {
                "tsdk": null,
                "preferences": {"includePackageJsonAutoImports": "auto"},
            },
            "implicitProjectConfig": {
                "checkJs": has_tsconfig,
            },
        })
    }

    async fn is_installed(&self, installer: &dyn Installer) -> bool {
        !installer.cached_versions(SERVER_NAME).is_empty()
            || installer.find_on_path(ALT_SYSTEM_BINARY).is_some()
            || installer.find_on_path(SERVER_NAME).is_some()
    }

    async fn install(
        &self,
        installer: &dyn Installer,
        version: Option<&str>,
    ) -> Result<PathBuf, DomainError> {
        let parsed = version
            .map(|v| {
                semver::Version::parse(v)
                    .map_err(|e| DomainError::invalid_input(format!("invalid version {v}: {e}")))
            })
            .transpose()?;
        installer.install(SERVER_NAME, parsed.as_ref()).await
    }
}
