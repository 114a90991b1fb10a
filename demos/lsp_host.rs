//! Hosts a single LSP server subprocess over the library's Endpoint/FrameReader/
//! FrameWriter, proving out "hosting the LSP base transport" end to end.
//!
//! This is a demonstration, not part of the crate's public surface: LSP method
//! handlers, subprocess plumbing and config loading are exactly the kind of
//! external collaborator the core treats as out of scope.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use lsp_types::{
    ClientCapabilities, DidOpenTextDocumentParams, Hover, HoverParams, InitializeParams,
    InitializeResult, InitializedParams, Position, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Url, WorkDoneProgressParams,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use jsonrpc_endpoint::{
    frame::{FrameReader, FrameWriter},
    Dispatcher, Endpoint, HandlerOutcome, MessageConsumer, MethodMap,
};

#[derive(Debug, Clone, Deserialize)]
struct Config {
    servers: HashMap<String, ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    extensions: Vec<String>,
}

impl Config {
    fn load_default() -> Result<Self> {
        let paths = [
            Some(std::path::PathBuf::from("config.toml")),
            dirs::config_dir().map(|d| d.join("jsonrpc-endpoint").join("config.toml")),
        ];
        for path in paths.into_iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                return toml::from_str(&content).context("parsing config.toml");
            }
        }
        anyhow::bail!("no config.toml found (expected ./config.toml or the platform config dir)")
    }

    fn server_for_extension(&self, ext: &str) -> Option<&ServerConfig> {
        self.servers
            .values()
            .find(|cfg| cfg.extensions.iter().any(|e| e == ext))
    }
}

/// Handles requests/notifications the *server* sends back to us (the client
/// role of the endpoint), logging anything we don't special-case.
fn client_side_dispatcher() -> Arc<dyn Dispatcher> {
    Arc::new(
        MethodMap::new()
            .register("workspace/configuration", |_params: Option<Value>| {
                HandlerOutcome::ready_ok(json!([]))
            })
            .register("client/registerCapability", |_params: Option<Value>| {
                HandlerOutcome::ready_ok(Value::Null)
            })
            .register(
                "textDocument/publishDiagnostics",
                |params: Option<Value>| {
                    tracing::info!(?params, "diagnostics published");
                    HandlerOutcome::ready_ok(Value::Null)
                },
            ),
    )
}

async fn hover(endpoint: &Endpoint, uri: &Url, line: u32, character: u32) -> Result<Option<Hover>> {
    let params = HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
    };
    let value = serde_json::to_value(&params).context("encoding hover params")?;
    let result = endpoint
        .request("textDocument/hover", Some(value))
        .await
        .await
        .map_err(|e| anyhow::anyhow!("hover request failed: {e}"))?;
    if result.is_null() {
        return Ok(None);
    }
    serde_json::from_value(result).context("decoding hover result")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load_default()?;
    let file = std::env::args()
        .nth(1)
        .context("usage: lsp-host <file-to-open>")?;
    let path = Path::new(&file);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .context("file has no extension, can't pick a server")?;

    let server_config = config
        .server_for_extension(ext)
        .with_context(|| format!("no server configured for .{ext} files"))?
        .clone();

    let mut child = Command::new(&server_config.command)
        .args(&server_config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn LSP server")?;

    let stdin = child.stdin.take().expect("piped stdin");
    let stdout = child.stdout.take().expect("piped stdout");

    let writer = Arc::new(FrameWriter::new(stdin));
    let consumer: Arc<dyn MessageConsumer> = {
        let writer = writer.clone();
        Arc::new(move |msg: Value| {
            let writer = writer.clone();
            async move { writer.write(&msg).await }
        })
    };

    let endpoint = Endpoint::new(client_side_dispatcher(), consumer);

    let reader = FrameReader::new(tokio::io::BufReader::new(stdout));
    let reader_endpoint = endpoint.clone();
    let reader_task = tokio::spawn(reader.listen(move |msg| {
        let endpoint = reader_endpoint.clone();
        async move { endpoint.consume(msg).await }
    }));

    let root_path = path
        .parent()
        .unwrap_or(Path::new("/"))
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    let root_uri =
        Url::from_directory_path(&root_path).map_err(|_| anyhow::anyhow!("not an absolute path: {}", root_path.display()))?;

    let init_params = InitializeParams {
        process_id: Some(std::process::id()),
        root_uri: Some(root_uri),
        capabilities: ClientCapabilities::default(),
        ..Default::default()
    };
    let init_value = serde_json::to_value(&init_params).context("encoding initialize params")?;
    let init_result = endpoint
        .request("initialize", Some(init_value))
        .await
        .await
        .map_err(|e| anyhow::anyhow!("initialize failed: {e}"))?;
    let init_result: InitializeResult =
        serde_json::from_value(init_result).context("decoding initialize result")?;
    tracing::info!(?init_result, "server initialized");

    endpoint
        .notify(
            "initialized",
            Some(serde_json::to_value(InitializedParams {})?),
        )
        .await;

    let doc_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let uri = Url::from_file_path(&doc_path).map_err(|_| anyhow::anyhow!("not an absolute path: {}", doc_path.display()))?;
    let contents = tokio::fs::read_to_string(path).await.unwrap_or_default();
    let did_open = DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: uri.clone(),
            language_id: ext.to_string(),
            version: 1,
            text: contents,
        },
    };
    endpoint
        .notify(
            "textDocument/didOpen",
            Some(serde_json::to_value(&did_open).context("encoding didOpen params")?),
        )
        .await;

    match hover(&endpoint, &uri, 0, 0).await {
        Ok(Some(result)) => println!("{}", serde_json::to_string_pretty(&result)?),
        Ok(None) => println!("no hover information available"),
        Err(e) => eprintln!("hover failed: {e}"),
    }

    let _ = endpoint.request("shutdown", None).await.await;
    endpoint.notify("exit", None).await;
    writer.close().await;
    reader_task.abort();
    let _ = child.kill().await;

    Ok(())
}
