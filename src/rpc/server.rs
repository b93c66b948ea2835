//! JSON-RPC server over stdin/stdout.
//!
//! Requests are handled one at a time; stdout carries only responses.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::MixConfig;
use crate::error::Result;
use crate::mixing::MixOrchestrator;

use super::methods::handle_request;
use super::types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};

/// State shared across all request handlers.
pub struct ServerState {
    /// Mix pipeline entry point.
    pub orchestrator: MixOrchestrator,
    /// Flag to signal server shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ServerState {
    /// Creates new server state.
    pub fn new(config: MixConfig) -> Self {
        Self {
            orchestrator: MixOrchestrator::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Runs the JSON-RPC server, reading from stdin and writing to stdout.
pub fn run_server(mut state: ServerState) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let reader = stdin.lock();

    log::info!(
        "JSON-RPC server started (uploads: {})",
        state.orchestrator.uploads_dir().display()
    );

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Error reading stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = process_request(&line, &mut state);
        writeln!(stdout, "{}", response).ok();
        stdout.flush().ok();

        if state.is_shutdown() {
            log::info!("Server shutdown requested");
            break;
        }
    }

    log::info!("JSON-RPC server stopped");
    Ok(())
}

/// Processes a single JSON-RPC request line into a response line.
fn process_request(line: &str, state: &mut ServerState) -> String {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let error = JsonRpcErrorResponse::new(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            );
            return serde_json::to_string(&error).unwrap_or_default();
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        let error = JsonRpcErrorResponse::new(
            Some(request.id),
            JsonRpcError::invalid_request("Invalid JSON-RPC version (expected 2.0)"),
        );
        return serde_json::to_string(&error).unwrap_or_default();
    }

    log::debug!("request {:?}: {}", request.id, request.method);

    match handle_request(&request.method, request.params, state) {
        Ok(result) => serde_json::to_string(&JsonRpcResponse::new(request.id, result))
            .unwrap_or_default(),
        Err(error) => serde_json::to_string(&JsonRpcErrorResponse::new(Some(request.id), error))
            .unwrap_or_default(),
    }
}
