use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::application::{Installer, LanguageAdapter};
use crate::domain::DomainError;

use super::client::LspClient;

type PoolKey = (String, String);

/// One running server per `(absolute_workspace, language)`. `get_or_create` double-checks under
/// the write lock so two concurrent callers for the same key never spawn two servers.
pub struct LspSupervisor {
    adapters: HashMap<&'static str, Arc<dyn LanguageAdapter>>,
    installer: Arc<dyn Installer>,
    pool: RwLock<HashMap<PoolKey, Arc<LspClient>>>,
}

impl LspSupervisor {
    pub fn new(installer: Arc<dyn Installer>, adapters: Vec<Arc<dyn LanguageAdapter>>) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.language(), a)).collect();
        Self {
            adapters,
            installer,
            pool: RwLock::new(HashMap::new()),
        }
    }

    fn key(root: &Path, language: &str) -> PoolKey {
        (root.to_string_lossy().to_string(), language.to_string())
    }

    pub fn languages(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }

    pub async fn get_or_create(&self, root: &Path, language: &str) -> Result<Arc<LspClient>, DomainError> {
        let key = Self::key(root, language);

        if let Some(client) = self.pool.read().await.get(&key) {
            return Ok(client.clone());
        }

        let mut pool = self.pool.write().await;
        if let Some(client) = pool.get(&key) {
            return Ok(client.clone());
        }

        let adapter = self
            .adapters
            .get(language)
            .ok_or_else(|| DomainError::not_found(format!("no language adapter registered for {language}")))?
            .clone();

        if !adapter.is_installed(self.installer.as_ref()).await {
            return Err(DomainError::not_found(format!(
                "{} is not installed for language {language}",
                adapter.server_name()
            )));
        }

        let command = adapter.resolve_command(self.installer.as_ref(), root).await?;
        let client = Arc::new(LspClient::new(root.to_path_buf()));
        client.start(&command, adapter.initialization_options(root)).await?;

        info!(language, root = %root.display(), "started language server");
        pool.insert(key, client.clone());
        Ok(client)
    }

    pub async fn stop_workspace(&self, root: &Path) -> Result<(), DomainError> {
        let root_key = root.to_string_lossy().to_string();
        let mut pool = self.pool.write().await;
        let keys: Vec<PoolKey> = pool.keys().filter(|(r, _)| *r == root_key).cloned().collect();
        for key in keys {
            if let Some(client) = pool.remove(&key) {
                client.stop().await?;
            }
        }
        Ok(())
    }

    pub async fn stop_language(&self, root: &Path, language: &str) -> Result<(), DomainError> {
        let key = Self::key(root, language);
        if let Some(client) = self.pool.write().await.remove(&key) {
            client.stop().await?;
        }
        Ok(())
    }

    pub async fn stop_all(&self) -> Result<(), DomainError> {
        let mut pool = self.pool.write().await;
        for (_, client) in pool.drain() {
            client.stop().await?;
        }
        Ok(())
    }

    /// `(workspace, language)` pairs with a live server, for the `lsp_list` tool.
    pub async fn running(&self) -> Vec<(String, String)> {
        self.pool.read().await.keys().cloned().collect()
    }

    /// Installs the server registered for `language`, regardless of whether a client for it is
    /// currently running.
    pub async fn install_language(
        &self,
        language: &str,
        version: Option<&str>,
    ) -> Result<std::path::PathBuf, DomainError> {
        let adapter = self
            .adapters
            .get(language)
            .ok_or_else(|| DomainError::not_found(format!("no language adapter registered for {language}")))?
            .clone();
        adapter.install(self.installer.as_ref(), version).await
    }

    /// Per-adapter installed/running status, for the `lsp_health` tool.
    pub async fn health(&self) -> Vec<(String, bool, bool)> {
        let running_languages: std::collections::HashSet<String> =
            self.pool.read().await.keys().map(|(_, lang)| lang.clone()).collect();
        let mut report = Vec::new();
        for (language, adapter) in &self.adapters {
            let installed = adapter.is_installed(self.installer.as_ref()).await;
            let running = running_languages.contains(*language);
            report.push((language.to_string(), installed, running));
        }
        report
    }
}
