//! JSON-RPC method handlers.

use crate::types::MixRequest;

use super::server::ServerState;
use super::types::{AnalyzeParams, JsonRpcError, MixResponse};

/// Handles a JSON-RPC method call.
pub fn handle_request(
    method: &str,
    params: serde_json::Value,
    state: &mut ServerState,
) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        "mix" => handle_mix(params, state),
        "analyze" => handle_analyze(params, state),
        "list_tracks" => handle_list_tracks(state),
        "capabilities" => handle_capabilities(state),
        "ping" => handle_ping(),
        "shutdown" => handle_shutdown(state),
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

/// Handles the ping method for health checks.
fn handle_ping() -> Result<serde_json::Value, JsonRpcError> {
    Ok(serde_json::json!({ "status": "ok" }))
}

/// Handles the shutdown method.
fn handle_shutdown(state: &mut ServerState) -> Result<serde_json::Value, JsonRpcError> {
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}

/// Handles the mix method.
///
/// Pipeline failures are reported inside the result (`ok: false` plus a
/// status), not as JSON-RPC errors.
fn handle_mix(
    params: serde_json::Value,
    state: &mut ServerState,
) -> Result<serde_json::Value, JsonRpcError> {
    let request: MixRequest = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))?;

    let result = state.orchestrator.mix(&request);
    to_value(&MixResponse::from_result(&result))
}

/// Handles the analyze method.
fn handle_analyze(
    params: serde_json::Value,
    state: &mut ServerState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: AnalyzeParams = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))?;

    let analysis = state
        .orchestrator
        .analyze(&params.file)
        .map_err(|e| JsonRpcError::from_mix_error(&e))?;
    to_value(&analysis)
}

/// Handles the list_tracks method.
fn handle_list_tracks(state: &mut ServerState) -> Result<serde_json::Value, JsonRpcError> {
    let listing = state
        .orchestrator
        .list_tracks()
        .map_err(|e| JsonRpcError::from_mix_error(&e))?;
    to_value(&listing)
}

/// Handles the capabilities method.
fn handle_capabilities(state: &mut ServerState) -> Result<serde_json::Value, JsonRpcError> {
    to_value(&state.orchestrator.capabilities())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)))
}
