//! JSON-RPC request/response pair threaded through the handler pipeline.
//!
//! A request is created per call, handed to each handler by mutable
//! reference, and discarded once its response is produced. The response is
//! the single result/error slot for that request.

use serde::{Deserialize, Serialize};

use crate::network::{NetworkClientId, Origin};

fn jsonrpc_version() -> String {
    "2.0".to_string()
}

/// An inbound JSON-RPC request, tagged by the host with the caller's origin
/// and the network client it was issued against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0".
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    /// Caller-chosen request id, echoed back on the response.
    #[serde(default)]
    pub id: serde_json::Value,
    /// Method name (e.g. "eth_sendTransaction").
    pub method: String,
    /// Method parameters; handlers may rewrite them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Identity of the calling context (e.g. a dapp's domain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    /// Network client the caller issued the request against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_client_id: Option<NetworkClientId>,
}

impl JsonRpcRequest {
    /// Build a request for `method` with no params, origin or network client.
    pub fn new(id: impl Into<serde_json::Value>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: id.into(),
            method: method.into(),
            params: None,
            origin: None,
            network_client_id: None,
        }
    }

    /// Attach params.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach the calling origin.
    pub fn with_origin(mut self, origin: impl Into<Origin>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Attach the network client id.
    pub fn with_network_client_id(mut self, id: impl Into<NetworkClientId>) -> Self {
        self.network_client_id = Some(id.into());
        self
    }
}

/// The serialized form of a failure, as carried on a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The result/error slot paired 1:1 with a [`JsonRpcRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0".
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    /// Id of the request this answers.
    #[serde(default)]
    pub id: serde_json::Value,
    /// Successful result, written by a downstream handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure, written by a handler or by the middleware on early termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// An empty response slot for `request`.
    pub fn for_request(request: &JsonRpcRequest) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: request.id.clone(),
            result: None,
            error: None,
        }
    }

    /// Whether a handler has written either a result or an error.
    pub fn is_settled(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }
}

/// How a method is admitted by the network-switch middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodClass {
    /// No network-context guarantee needed; dispatched immediately, outside the queue.
    Bypass,
    /// Must run against the correct, user-approved network; queued.
    RequiresConfirmation,
    /// The dapp-initiated chain switch itself; queued, but skips the chain check.
    IsNetworkSwitchRequest,
}

impl MethodClass {
    /// Whether requests of this class go through the admission queue.
    pub fn is_queued(self) -> bool {
        !matches!(self, MethodClass::Bypass)
    }
}
