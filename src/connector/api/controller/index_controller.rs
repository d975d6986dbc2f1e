use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use super::super::Container;

pub struct IndexController<'a> {
    container: &'a Container,
}

impl<'a> IndexController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Indexes `project`, rendering an `indicatif` progress bar driven by the pipeline's
    /// `IndexProgress` stream. The bar is a consumer of the channel, not its producer, so the
    /// same use case runs headlessly from the MCP tool and from tests.
    pub async fn index(&self, project: String, name: Option<String>, force: bool) -> Result<String> {
        let (tx, mut rx) = mpsc::channel(32);
        let use_case = self.container.index_repository.clone();
        let project_for_task = project.clone();

        let task = tokio::spawn(async move {
            use_case.execute(&project_for_task, name.as_deref(), force, Some(tx), None).await
        });

        let bar = indicatif::ProgressBar::new(100);
        bar.set_style(
            indicatif::ProgressStyle::with_template("{bar:40} {percent}% {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        while let Some(event) = rx.recv().await {
            bar.set_position((event.percent() * 100.0) as u64);
            bar.set_message(event.message().to_string());
        }
        bar.finish_and_clear();

        let repository = task
            .await
            .map_err(|e| anyhow::anyhow!("indexing task panicked: {e}"))??;

        info!(repository = repository.name(), "indexing complete");
        Ok(format!(
            "Indexed {} ({} files, {} chunks).",
            repository.name(),
            repository.file_count(),
            repository.chunk_count()
        ))
    }
}
