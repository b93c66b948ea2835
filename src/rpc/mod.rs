//! JSON-RPC module for daemon communication.
//!
//! Provides the JSON-RPC 2.0 server implementation for:
//! - `mix`: Produce the canonical mix (`{files, mode}` → `{ok, archivo, mensaje}`)
//! - `analyze`: Tempo, key, energy and chroma of one track
//! - `list_tracks`: Mixable tracks and the current mix
//! - `capabilities`: Toolkit and rubberband availability
//! - `ping`: Health check
//! - `shutdown`: Graceful shutdown

pub mod methods;
pub mod server;
pub mod types;

pub use server::{run_server, ServerState};
pub use types::{
    AnalyzeParams, JsonRpcError, JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse,
    MixResponse, RequestId,
};
