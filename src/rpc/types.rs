//! JSON-RPC types for the daemon protocol.
//!
//! Envelope types follow JSON-RPC 2.0. The `mix` result uses the
//! `{ok, archivo, mensaje}` contract expected by the web front end.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, MixError, Result};
use crate::mixing::MixArtifact;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Integer(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

/// A JSON-RPC request wrapper.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC response wrapper.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// A JSON-RPC error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Extended error data for application-specific errors.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub error_code: String,
    /// HTTP-like status of the underlying error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonRpcError {
    /// Creates a parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an invalid request error (-32600).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a method not found error (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    /// Creates an invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    /// Maps a pipeline error into the application range (-32000..=-32007).
    pub fn from_mix_error(err: &MixError) -> Self {
        Self {
            code: application_code(err.code),
            message: err.message.clone(),
            data: Some(JsonRpcErrorData {
                error_code: err.code.as_str().to_string(),
                status: err.status(),
                details: Some(err.code.recovery_hint().to_string()),
            }),
        }
    }
}

fn application_code(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::NotFound => -32000,
        ErrorCode::DecodeError => -32001,
        ErrorCode::RenderError => -32002,
        ErrorCode::ComposeError => -32003,
        ErrorCode::ToolkitUnavailable => -32004,
        ErrorCode::RemoteServiceError => -32005,
        ErrorCode::Io => -32006,
        ErrorCode::BadRequest => -32007,
    }
}

// ============================================================================
// Method params
// ============================================================================

/// Parameters for the `analyze` method.
#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    /// Track name inside the uploads directory.
    pub file: String,
}

// ============================================================================
// Mix result contract
// ============================================================================

/// Outcome of a mix request as seen by the calling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixResponse {
    pub ok: bool,

    /// Name of the produced file; only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archivo: Option<String>,

    /// Human-readable outcome.
    pub mensaje: String,

    /// 400, 404 or 500; only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl MixResponse {
    pub fn from_result(result: &Result<MixArtifact>) -> Self {
        match result {
            Ok(artifact) => Self {
                ok: true,
                archivo: Some(artifact.name.clone()),
                mensaje: format!("Mix generated successfully ({})", artifact.strategy),
                status: None,
            },
            Err(e) => Self {
                ok: false,
                archivo: None,
                mensaje: format!("Error: {}", e.message),
                status: Some(e.status()),
            },
        }
    }
}
