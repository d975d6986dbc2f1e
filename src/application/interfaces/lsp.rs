use std::path::{Path, PathBuf};

use async_trait::async_trait;
use semver::Version;

use crate::domain::DomainError;

/// Resolved command line for spawning a language server process.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Language-specific strategy object: server command lookup, init options, workspace
/// configuration, and install state. One adapter is registered per language name in the
/// supervisor's adapter registry.
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    /// The language name this adapter serves (e.g. `"typescript"`).
    fn language(&self) -> &'static str;

    /// The server binary name as known to the installer (e.g. `"typescript-language-server"`).
    fn server_name(&self) -> &'static str;

    /// Resolves the command used to spawn the server for `workspace_root`: prefers a locally
    /// installed binary, then a system binary already on `PATH`, returning
    /// [`DomainError::NotFound`] when neither is available and the caller must install first.
    async fn resolve_command(
        &self,
        installer: &dyn Installer,
        workspace_root: &Path,
    ) -> Result<ServerCommand, DomainError>;

    /// `initializationOptions` sent with the `initialize` request.
    fn initialization_options(&self, workspace_root: &Path) -> serde_json::Value;

    /// `workspace/configuration` response payload, influenced by the presence of configuration
    /// files in `workspace_root` (e.g. `tsconfig.json`).
    fn workspace_configuration(&self, workspace_root: &Path) -> serde_json::Value;

    /// Whether a usable server binary is already available (installed or on `PATH`), without
    /// triggering an install.
    async fn is_installed(&self, installer: &dyn Installer) -> bool;

    /// Installs the server via the adapter's package manager of choice.
    async fn install(
        &self,
        installer: &dyn Installer,
        version: Option<&str>,
    ) -> Result<PathBuf, DomainError>;
}

/// Resolves or installs a language-server binary into a versioned cache directory.
///
/// Resolution order: (1) user-installed on `PATH`; (2) locally installed under
/// `<cache>/lsp-servers/<server>/<version>/...`; (3) a fresh install via the server's package
/// manager. Cached version discovery sorts by parsed semver, not lexicographically.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Finds `server` on `PATH`, returning its absolute path.
    fn find_on_path(&self, server: &str) -> Option<PathBuf>;

    /// Lists versions already installed under the cache directory, sorted ascending by semver.
    fn cached_versions(&self, server: &str) -> Vec<Version>;

    /// The cache directory for a specific installed version, if present.
    fn cached_install(&self, server: &str, version: &Version) -> Option<PathBuf>;

    /// Fetches the latest published version from the upstream package registry over HTTPS.
    async fn latest_version(&self, server: &str) -> Result<Version, DomainError>;

    /// Installs `server` at `version` (or the latest, when `None`) into the cache directory and
    /// returns the installed binary's path.
    async fn install(
        &self,
        server: &str,
        version: Option<&Version>,
    ) -> Result<PathBuf, DomainError>;

    /// Root cache directory, e.g. `~/.cache/ts-index/lsp-servers`.
    fn cache_dir(&self) -> &Path;
}
