//! `ts-index`: indexes TypeScript/JavaScript projects for exact symbol lookup, semantic vector
//! search, and LSP introspection, and serves the same surface over the CLI or as MCP tools.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ts_index::cli::McpTransport;
use ts_index::connector::adapter::mcp::TsIndexToolServer;
use ts_index::connector::api::{Container, ContainerConfig, Router as CliRouter};
use ts_index::Commands;

/// `ts-index` - index TypeScript/JavaScript projects for symbol lookup, semantic search, and LSP
/// introspection, exposed over the CLI or as MCP tools.
#[derive(Parser)]
#[command(name = "ts-index")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity; repeat for more (-v debug, -vv trace). Overridden by `RUST_LOG`.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Root directory for the database and other on-disk state.
    #[arg(long, global = true, default_value = "~/.cache/ts-index")]
    data_dir: String,

    /// Override the database file path; defaults to `<data_dir>/ts-index.duckdb`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Remote embedding endpoint; absent selects the local deterministic embedder.
    #[arg(long, global = true)]
    embed_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "ts_index=debug,info",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Accepts both a bare `:8080` (matching the spec's go-style flag) and a full `host:port`.
fn parse_bind_address(address: &str) -> Result<SocketAddr> {
    let address = address.trim();
    if let Some(port) = address.strip_prefix(':') {
        return format!("0.0.0.0:{port}")
            .parse()
            .with_context(|| format!("invalid --address port: {address}"));
    }
    address
        .parse()
        .with_context(|| format!("invalid --address, expected host:port or :port: {address}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = expand_tilde(&cli.data_dir);
    let mut config = ContainerConfig::new(data_dir);
    if let Some(db) = cli.db {
        config.db_path = Some(PathBuf::from(db));
    }
    if let Some(embed_url) = cli.embed_url {
        config.embed_url = Some(embed_url);
    }

    if let Err(err) = run(cli.command, config).await {
        println!();
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, config: ContainerConfig) -> Result<()> {
    let container = Arc::new(Container::build(&config).await?);

    if let Commands::Mcp { transport, address } = command {
        return serve_mcp(container, transport, address).await;
    }

    let router = CliRouter::new(&container);
    let output = router.route(command).await?;
    println!("{output}");
    Ok(())
}

/// Binds the same `TsIndexToolServer` tool registry to whichever transport was requested. Every
/// transport shares one `Container`, so `tools/list` returns an identical surface regardless of
/// how the server was reached.
async fn serve_mcp(
    container: Arc<Container>,
    transport: McpTransport,
    address: Option<String>,
) -> Result<()> {
    use rmcp::transport::sse_server::{SseServer, SseServerConfig};
    use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
    use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
    use tokio_util::sync::CancellationToken;

    match transport {
        McpTransport::Stdio => {
            tracing::info!("serving MCP over stdio");
            let server = TsIndexToolServer::new(container);
            let transport = rmcp::transport::io::stdio();
            let service = rmcp::serve_server(server, transport).await?;
            service.waiting().await?;
        }
        McpTransport::Http => {
            let bind = parse_bind_address(address.as_deref().unwrap_or(":8080"))?;
            let service = StreamableHttpService::new(
                move || Ok(TsIndexToolServer::new(container.clone())),
                Arc::new(LocalSessionManager::default()),
                StreamableHttpServerConfig {
                    sse_keep_alive: Some(std::time::Duration::from_secs(15)),
                    stateful_mode: true,
                    cancellation_token: CancellationToken::new(),
                },
            );
            let router = axum::Router::new().nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(%bind, "serving MCP over streamable HTTP at /mcp");
            axum::serve(listener, router).await?;
        }
        // The same streamable-HTTP service, mounted as a bare handler at the root path rather
        // than nested under `/mcp` — for embedding this tool surface into a larger HTTP app.
        McpTransport::HttpHandler => {
            let bind = parse_bind_address(address.as_deref().unwrap_or(":8080"))?;
            let service = StreamableHttpService::new(
                move || Ok(TsIndexToolServer::new(container.clone())),
                Arc::new(LocalSessionManager::default()),
                StreamableHttpServerConfig {
                    sse_keep_alive: Some(std::time::Duration::from_secs(15)),
                    stateful_mode: true,
                    cancellation_token: CancellationToken::new(),
                },
            );
            let router = axum::Router::new().fallback_service(service);
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(%bind, "serving MCP as a bare HTTP handler at /");
            axum::serve(listener, router).await?;
        }
        McpTransport::Sse => {
            let bind = parse_bind_address(address.as_deref().unwrap_or(":8080"))?;
            let config = SseServerConfig {
                bind,
                sse_path: "/sse".to_string(),
                post_path: "/message".to_string(),
                ct: CancellationToken::new(),
                sse_keep_alive: None,
            };
            let listen_ct = config.ct.clone();
            let (sse_server, router) = SseServer::new(config);
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(%bind, "serving MCP over SSE at /sse and /message");
            let server_task = tokio::spawn(async move {
                let _ = axum::serve(listener, router).await;
            });

            let service_ct = sse_server.with_service(move || TsIndexToolServer::new(container.clone()));
            tokio::signal::ctrl_c().await.ok();
            service_ct.cancel();
            listen_ct.cancel();
            let _ = server_task.await;
        }
    }
    Ok(())
}
