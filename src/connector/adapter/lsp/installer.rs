use std::path::{Path, PathBuf};

use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::Installer;
use crate::domain::DomainError;

#[derive(Deserialize)]
struct NpmLatest {
    version: String,
}

/// Resolves language-server binaries against `PATH`, a versioned cache directory, and npm as the
/// package manager of last resort. Cached versions are discovered by directory name and sorted by
/// parsed semver rather than lexicographically, so `9.2.0` is newer than `9.10.0`... the reverse
/// of what string sort would say.
pub struct FsInstaller {
    cache_dir: PathBuf,
    http: reqwest::Client,
}

impl FsInstaller {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            http: reqwest::Client::new(),
        }
    }

    fn server_dir(&self, server: &str) -> PathBuf {
        self.cache_dir.join(server)
    }

    /// The installed package's `node_modules/.bin/<server>` entry point, for npm-installed
    /// servers.
    pub fn bin_path(&self, server: &str, version: &Version) -> PathBuf {
        self.server_dir(server)
            .join(version.to_string())
            .join("node_modules")
            .join(".bin")
            .join(server)
    }
}

#[async_trait]
impl Installer for FsInstaller {
    fn find_on_path(&self, server: &str) -> Option<PathBuf> {
        which::which(server).ok()
    }

    fn cached_versions(&self, server: &str) -> Vec<Version> {
        let Ok(entries) = std::fs::read_dir(self.server_dir(server)) else {
            return Vec::new();
        };
        let mut versions: Vec<Version> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().and_then(|n| Version::parse(n).ok()))
            .collect();
        versions.sort();
        versions
    }

    fn cached_install(&self, server: &str, version: &Version) -> Option<PathBuf> {
        let bin = self.bin_path(server, version);
        bin.exists().then_some(bin)
    }

    async fn latest_version(&self, server: &str) -> Result<Version, DomainError> {
        let url = format!("https://registry.npmjs.org/{server}/latest");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::lsp(format!("failed to query npm registry: {e}")))?
            .error_for_status()
            .map_err(|e| DomainError::lsp(format!("npm registry returned an error: {e}")))?;
        let latest: NpmLatest = response
            .json()
            .await
            .map_err(|e| DomainError::lsp(format!("malformed npm registry response: {e}")))?;
        Version::parse(&latest.version)
            .map_err(|e| DomainError::lsp(format!("npm reported an unparsable version: {e}")))
    }

    async fn install(&self, server: &str, version: Option<&Version>) -> Result<PathBuf, DomainError> {
        let resolved = match version {
            Some(v) => v.clone(),
            None => self.latest_version(server).await?,
        };

        let install_dir = self.server_dir(server).join(resolved.to_string());
        tokio::fs::create_dir_all(&install_dir).await?;

        info!(server, version = %resolved, "installing language server via npm");
        let status = tokio::process::Command::new("npm")
            .arg("install")
            .arg("--no-save")
            .arg("--prefix")
            .arg(&install_dir)
            .arg(format!("{server}@{resolved}"))
            .status()
            .await
            .map_err(|e| DomainError::lsp(format!("failed to spawn npm: {e}")))?;

        if !status.success() {
            return Err(DomainError::lsp(format!(
                "npm install failed for {server}@{resolved} (status {status})"
            )));
        }

        let bin = self.bin_path(server, &resolved);
        if !bin.exists() {
            return Err(DomainError::lsp(format!(
                "npm install succeeded but {} is missing",
                bin.display()
            )));
        }
        debug!(path = %bin.display(), "language server installed");
        Ok(bin)
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_versions_sort_numerically_not_lexicographically() {
        let dir = tempfile::tempdir().unwrap();
        let installer = FsInstaller::new(dir.path().to_path_buf());
        for v in ["2.0.0", "10.0.0", "9.0.0"] {
            std::fs::create_dir_all(installer.server_dir("ts").join(v)).unwrap();
        }
        let versions = installer.cached_versions("ts");
        let strs: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(strs, vec!["2.0.0", "9.0.0", "10.0.0"]);
    }
}
