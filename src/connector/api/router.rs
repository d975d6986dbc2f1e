use anyhow::Result;

use crate::cli::LspCommand;
use crate::Commands;

use super::container::Container;
use super::controller::{
    DeleteController, IndexController, ListRepositoriesController, LspController, SearchController,
    StatsController,
};

pub struct Router<'a> {
    search_controller: SearchController<'a>,
    stats_controller: StatsController<'a>,
    index_controller: IndexController<'a>,
    list_repositories_controller: ListRepositoriesController<'a>,
    delete_controller: DeleteController<'a>,
    lsp_controller: LspController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            search_controller: SearchController::new(container),
            stats_controller: StatsController::new(container),
            index_controller: IndexController::new(container),
            list_repositories_controller: ListRepositoriesController::new(container),
            delete_controller: DeleteController::new(container),
            lsp_controller: LspController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Index { project, name, force } => {
                self.index_controller.index(project, name, force).await
            }
            Commands::Search { query, top_k, symbol, project } => {
                self.search_controller.search(query, top_k, symbol, project).await
            }
            Commands::List => self.list_repositories_controller.list().await,
            Commands::Delete { id_or_path } => self.delete_controller.delete(id_or_path).await,
            Commands::Stats => self.stats_controller.stats().await,
            Commands::Lsp { command } => self.route_lsp(command).await,
            Commands::Mcp { .. } => unreachable!("the Mcp command is handled directly in main"),
        }
    }

    async fn route_lsp(&self, command: LspCommand) -> Result<String> {
        match command {
            LspCommand::Info { project, language } => self.lsp_controller.info(project, language).await,
            LspCommand::Analyze {
                project,
                file,
                line,
                character,
                hover,
                definition,
                references,
                implementation,
                type_definition,
                declaration,
            } => {
                self.lsp_controller
                    .analyze(
                        project,
                        file,
                        line,
                        character,
                        hover,
                        definition,
                        references,
                        implementation,
                        type_definition,
                        declaration,
                    )
                    .await
            }
            LspCommand::Completion { project, file, line, character, max_results } => {
                self.lsp_controller.completion(project, file, line, character, max_results).await
            }
            LspCommand::Symbols { project, query } => self.lsp_controller.symbols(project, query).await,
            LspCommand::Install { server, version } => self.lsp_controller.install(server, version).await,
            LspCommand::InstallByLanguage { language, version } => {
                self.lsp_controller.install_by_language(language, version).await
            }
            LspCommand::List => self.lsp_controller.list().await,
            LspCommand::Health => self.lsp_controller.health().await,
        }
    }
}
