use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::ServerCommand;
use crate::domain::DomainError;

const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(400);

type Pending = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value, DomainError>>>>>;

struct Running {
    child: Child,
    stdin: Mutex<ChildStdin>,
    next_id: AtomicI64,
    pending: Pending,
    reader_task: JoinHandle<()>,
}

/// A single language server connection: length-prefixed JSON-RPC 2.0 framing over the child
/// process's stdio, a dedicated reader-loop task, and per-request single-slot channels keyed by
/// monotonically increasing integer ids. One client per `(workspace, language)` pair; the
/// supervisor owns the pool.
pub struct LspClient {
    inner: RwLock<Option<Running>>,
    workspace_root: PathBuf,
    doc_versions: Mutex<HashMap<String, i32>>,
}

impl LspClient {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            inner: RwLock::new(None),
            workspace_root,
            doc_versions: Mutex::new(HashMap::new()),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Spawns the server, performs the `initialize`/`initialized` handshake, and leaves the
    /// client ready to serve capability operations. Fails with [`DomainError::AlreadyRunning`] if
    /// a server is already attached.
    pub async fn start(
        &self,
        command: &ServerCommand,
        init_options: Value,
    ) -> Result<(), DomainError> {
        if self.inner.read().await.is_some() {
            return Err(DomainError::AlreadyRunning);
        }

        let mut child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().cloned())
            .current_dir(&self.workspace_root)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::lsp(format!("failed to spawn {}: {e}", command.program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DomainError::lsp("server process has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::lsp("server process has no stdout"))?;

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader_task = tokio::spawn(reader_loop(BufReader::new(stdout), pending.clone()));

        let running = Running {
            child,
            stdin: Mutex::new(stdin),
            next_id: AtomicI64::new(1),
            pending,
            reader_task,
        };
        *self.inner.write().await = Some(running);

        let uri = path_to_uri(&self.workspace_root);
        let init_params = json!({
            "processId": std::process::id(),
            "rootUri": uri,
            "capabilities": {
                "textDocument": {
                    "hover": {},
                    "completion": {},
                    "definition": {},
                    "references": {},
                    "implementation": {},
                    "typeDefinition": {},
                    "declaration": {},
                    "documentSymbol": {},
                },
                "workspace": {
                    "symbol": {},
                },
            },
            "initializationOptions": init_options,
        });

        match self.request_timeout("initialize", init_params, INITIALIZE_TIMEOUT).await {
            Ok(_) => {}
            Err(e) => {
                self.teardown().await;
                return Err(e);
            }
        }
        self.notify("initialized", json!({})).await?;
        debug!(root = %self.workspace_root.display(), "language server initialized");
        Ok(())
    }

    /// `shutdown`/`exit`, then reaps the process. Fails with [`DomainError::ServerNotRunning`] if
    /// no server is attached.
    pub async fn stop(&self) -> Result<(), DomainError> {
        if self.inner.read().await.is_none() {
            return Err(DomainError::ServerNotRunning);
        }
        let _ = self.request_timeout("shutdown", Value::Null, SHUTDOWN_TIMEOUT).await;
        let _ = self.notify("exit", Value::Null).await;
        self.teardown().await;
        Ok(())
    }

    async fn teardown(&self) {
        if let Some(mut running) = self.inner.write().await.take() {
            running.reader_task.abort();
            let _ = running.child.kill().await;
            let _ = running.child.wait().await;
        }
    }

    async fn next_id(&self) -> Result<i64, DomainError> {
        let guard = self.inner.read().await;
        let running = guard.as_ref().ok_or(DomainError::ServerNotRunning)?;
        Ok(running.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn write_frame(&self, body: &[u8]) -> Result<(), DomainError> {
        let guard = self.inner.read().await;
        let running = guard.as_ref().ok_or(DomainError::ServerNotRunning)?;
        let mut stdin = running.stdin.lock().await;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        stdin
            .write_all(header.as_bytes())
            .await
            .map_err(|e| DomainError::lsp(format!("write failed: {e}")))?;
        stdin
            .write_all(body)
            .await
            .map_err(|e| DomainError::lsp(format!("write failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| DomainError::lsp(format!("flush failed: {e}")))?;
        Ok(())
    }

    async fn request_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, DomainError> {
        let id = self.next_id().await?;
        let (tx, rx) = oneshot::channel();
        {
            let guard = self.inner.read().await;
            let running = guard.as_ref().ok_or(DomainError::ServerNotRunning)?;
            running.pending.lock().await.insert(id, tx);
        }

        let frame = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        let body = serde_json::to_vec(&frame)
            .map_err(|e| DomainError::lsp(format!("failed to encode request: {e}")))?;
        debug!(method, id, "lsp -> request");
        self.write_frame(&body).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DomainError::lsp("server closed before responding")),
            Err(_) => {
                if let Some(running) = self.inner.read().await.as_ref() {
                    running.pending.lock().await.remove(&id);
                }
                Err(DomainError::lsp(format!("{method} timed out")))
            }
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, DomainError> {
        self.request_timeout(method, params, REQUEST_TIMEOUT).await
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), DomainError> {
        let frame = if params.is_null() {
            json!({"jsonrpc": "2.0", "method": method})
        } else {
            json!({"jsonrpc": "2.0", "method": method, "params": params})
        };
        let body = serde_json::to_vec(&frame)
            .map_err(|e| DomainError::lsp(format!("failed to encode notification: {e}")))?;
        debug!(method, "lsp -> notification");
        self.write_frame(&body).await
    }

    // --- document lifecycle -------------------------------------------------

    /// Ensures `uri` is open, sending `textDocument/didOpen` the first time this client has seen
    /// it. Safe to call repeatedly before a query.
    pub async fn did_open(&self, uri: &str, language_id: &str, text: &str) -> Result<(), DomainError> {
        let mut versions = self.doc_versions.lock().await;
        if versions.contains_key(uri) {
            return Ok(());
        }
        versions.insert(uri.to_string(), 1);
        drop(versions);

        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text,
                }
            }),
        )
        .await
    }

    pub async fn did_change(&self, uri: &str, text: &str) -> Result<(), DomainError> {
        let version = {
            let mut versions = self.doc_versions.lock().await;
            let v = versions.entry(uri.to_string()).or_insert(1);
            *v += 1;
            *v
        };
        self.notify(
            "textDocument/didChange",
            json!({
                "textDocument": {"uri": uri, "version": version},
                "contentChanges": [{"text": text}],
            }),
        )
        .await
    }

    pub async fn did_close(&self, uri: &str) -> Result<(), DomainError> {
        self.doc_versions.lock().await.remove(uri);
        self.notify("textDocument/didClose", json!({"textDocument": {"uri": uri}}))
            .await
    }

    /// Diagnostics are pushed as notifications, not pulled; this core discards them in its reader
    /// loop, so the result is always empty by design.
    pub fn get_diagnostics(&self, _uri: &str) -> Vec<Value> {
        Vec::new()
    }

    // --- capability operations ----------------------------------------------

    fn position_params(uri: &str, line: u32, character: u32) -> Value {
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": line, "character": character},
        })
    }

    pub async fn hover(&self, uri: &str, line: u32, character: u32) -> Result<Option<Value>, DomainError> {
        let result = self
            .request("textDocument/hover", Self::position_params(uri, line, character))
            .await?;
        Ok(if result.is_null() { None } else { Some(result) })
    }

    pub async fn completion(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/completion", Self::position_params(uri, line, character))
            .await?;
        Ok(match result {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            Value::Object(mut map) => map
                .remove("items")
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default(),
            _ => Vec::new(),
        })
    }

    pub async fn goto_definition(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/definition", Self::position_params(uri, line, character))
            .await?;
        Ok(normalize_locations(result))
    }

    pub async fn find_references(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let mut params = Self::position_params(uri, line, character);
        params["context"] = json!({"includeDeclaration": true});
        let result = self.request("textDocument/references", params).await?;
        Ok(normalize_locations(result))
    }

    pub async fn goto_implementation(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/implementation", Self::position_params(uri, line, character))
            .await?;
        Ok(normalize_locations(result))
    }

    pub async fn goto_type_definition(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/typeDefinition", Self::position_params(uri, line, character))
            .await?;
        Ok(normalize_locations(result))
    }

    pub async fn goto_declaration(&self, uri: &str, line: u32, character: u32) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/declaration", Self::position_params(uri, line, character))
            .await?;
        Ok(normalize_locations(result))
    }

    pub async fn workspace_symbols(&self, query: &str) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("workspace/symbol", json!({"query": query}))
            .await?;
        Ok(normalize_locations(result))
    }

    pub async fn document_symbols(&self, uri: &str) -> Result<Vec<Value>, DomainError> {
        let result = self
            .request("textDocument/documentSymbol", json!({"textDocument": {"uri": uri}}))
            .await?;
        Ok(normalize_locations(result))
    }
}

fn normalize_locations(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

async fn read_header<R: tokio::io::AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Option<usize>> {
    let mut header = Vec::with_capacity(64);
    let mut last4 = [0u8; 4];
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            return Ok(None);
        }
        header.push(byte[0]);
        last4.rotate_left(1);
        last4[3] = byte[0];
        if &last4 == b"\r\n\r\n" {
            break;
        }
        if header.len() > 8192 {
            return Ok(None);
        }
    }
    let text = String::from_utf8_lossy(&header);
    let length = text
        .split("\r\n")
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .and_then(|v| v.trim().parse::<usize>().ok());
    Ok(length)
}

async fn reader_loop<R: tokio::io::AsyncRead + Unpin>(mut reader: BufReader<R>, pending: Pending) {
    loop {
        let length = match read_header(&mut reader).await {
            Ok(Some(length)) => length,
            Ok(None) => break,
            Err(e) => {
                warn!("lsp reader loop: {e}");
                break;
            }
        };

        let mut body = vec![0u8; length];
        if reader.read_exact(&mut body).await.is_err() {
            break;
        }

        let Ok(message) = serde_json::from_slice::<Value>(&body) else {
            continue;
        };

        let Some(id) = message.get("id").and_then(|v| v.as_i64()) else {
            continue; // notification, discarded by design
        };

        let outcome = match message.get("error") {
            Some(err) => Err(DomainError::lsp(err.to_string())),
            None => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
        };

        if let Some(tx) = pending.lock().await.remove(&id) {
            let _ = tx.send(outcome);
        }
    }

    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err(DomainError::lsp("connection closed")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trips_absolute_path() {
        let path = PathBuf::from("/tmp/project/a.ts");
        let uri = path_to_uri(&path);
        assert_eq!(uri, "file:///tmp/project/a.ts");
        assert_eq!(uri_to_path(&uri), path);
    }

    #[test]
    fn normalizes_null_array_and_bare_object() {
        assert!(normalize_locations(Value::Null).is_empty());
        assert_eq!(normalize_locations(json!([1, 2])).len(), 2);
        assert_eq!(normalize_locations(json!({"a": 1})).len(), 1);
    }
}
