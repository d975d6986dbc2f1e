use anyhow::Result;

use crate::Repository;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let repos = self.container.list_repositories.execute().await?;
        Ok(self.format_stats(&repos))
    }

    fn format_stats(&self, repos: &[Repository]) -> String {
        let total_repos = repos.len();
        let total_files: u64 = repos.iter().map(|r| r.file_count()).sum();
        let total_chunks: u64 = repos.iter().map(|r| r.chunk_count()).sum();

        format!(
            "ts-index statistics\n====================\nRepositories: {}\nTotal files:  {}\nTotal chunks: {}\nData dir:     {}",
            total_repos,
            total_files,
            total_chunks,
            self.container.data_dir.display()
        )
    }
}
