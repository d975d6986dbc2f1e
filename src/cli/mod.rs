use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Index a TypeScript/JavaScript project.
    Index {
        /// Project root to index.
        #[arg(long)]
        project: String,

        #[arg(short, long)]
        name: Option<String>,

        /// Force full re-index, ignoring cached file hashes.
        #[arg(short, long)]
        force: bool,
    },

    /// Run a semantic or exact-name search.
    Search {
        query: String,

        #[arg(long, default_value = "10")]
        top_k: usize,

        /// Search symbols by exact name instead of running a semantic vector search.
        #[arg(long)]
        symbol: bool,

        /// Restrict to a previously indexed project; defaults to every indexed project.
        #[arg(long)]
        project: Option<String>,
    },

    List,

    Delete {
        id_or_path: String,
    },

    Stats,

    /// Language server introspection and lifecycle.
    Lsp {
        #[command(subcommand)]
        command: LspCommand,
    },

    /// Start the MCP tool server.
    Mcp {
        #[arg(long, value_enum, default_value_t = McpTransport::Stdio)]
        transport: McpTransport,

        /// Bind address for the http/sse transports (e.g. `:8080`).
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LspCommand {
    /// Report whether a language server is installed/running for a project.
    Info {
        #[arg(long)]
        project: String,

        #[arg(long, default_value = "typescript")]
        language: String,
    },

    /// Hover, definitions, references, implementations, type-definitions, and declarations at a
    /// position.
    Analyze {
        #[arg(long)]
        project: String,

        #[arg(long)]
        file: String,

        #[arg(long)]
        line: u32,

        #[arg(long)]
        character: u32,

        #[arg(long)]
        hover: bool,

        #[arg(long)]
        definition: bool,

        #[arg(long)]
        references: bool,

        #[arg(long)]
        implementation: bool,

        #[arg(long = "type-definition")]
        type_definition: bool,

        #[arg(long)]
        declaration: bool,
    },

    /// Completions at a position.
    Completion {
        #[arg(long)]
        project: String,

        #[arg(long)]
        file: String,

        #[arg(long)]
        line: u32,

        #[arg(long)]
        character: u32,

        #[arg(long, default_value = "20")]
        max_results: usize,
    },

    /// Workspace symbol search via the language server.
    Symbols {
        #[arg(long)]
        project: String,

        query: String,
    },

    /// Install a language server by its package/server name.
    Install {
        server: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Install the language server registered for a language name.
    InstallByLanguage {
        language: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Inventory of installed language servers.
    List,

    /// Installed/running health per registered language adapter.
    Health,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum McpTransport {
    Stdio,
    Http,
    Sse,
    HttpHandler,
}
