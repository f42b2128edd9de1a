//! Unified error type for the switchyard request coordinator.
//!
//! Every failure that can reach a caller is one of these variants. Failures
//! raised inside a queued job are converted to a [`JsonRpcError`] with
//! [`SwitchyardError::to_rpc_error`] and written into that request's response.

use crate::rpc::JsonRpcError;

/// JSON-RPC 2.0 "invalid request" code.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC 2.0 "method not found" code.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC 2.0 "internal error" code.
pub const INTERNAL_ERROR: i64 = -32603;
/// EIP-1193 "user rejected request" code.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// All modules use this error type for propagation across crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchyardError {
    /// The request carried no `origin`.
    #[error("Request object is lacking an 'origin'")]
    MissingOrigin,

    /// The request carried no `networkClientId`.
    #[error("Request object is lacking a 'networkClientId'")]
    MissingNetworkClientId,

    /// The user declined an approval request.
    #[error("user rejected the request: {0}")]
    ApprovalDeclined(String),

    /// The approval channel failed for a reason other than a decline.
    #[error("approval error: {0}")]
    Approval(String),

    /// The network directory could not resolve a network client.
    #[error("network lookup error: {0}")]
    NetworkLookup(String),

    /// Switching the selected network or updating the origin mapping failed.
    #[error("network switch error: {0}")]
    SwitchActuation(String),

    /// Timed out waiting for a response.
    #[error("timeout: {0}")]
    Timeout(String),

    /// No handler in the pipeline produced a result.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchyardError {
    /// JSON-RPC error code this error is surfaced with.
    pub fn code(&self) -> i64 {
        match self {
            SwitchyardError::MissingOrigin | SwitchyardError::MissingNetworkClientId => {
                INVALID_REQUEST
            }
            SwitchyardError::ApprovalDeclined(_) => USER_REJECTED_REQUEST,
            SwitchyardError::MethodNotFound(_) => METHOD_NOT_FOUND,
            SwitchyardError::Approval(_)
            | SwitchyardError::NetworkLookup(_)
            | SwitchyardError::SwitchActuation(_)
            | SwitchyardError::Timeout(_)
            | SwitchyardError::Config(_)
            | SwitchyardError::Serialization(_)
            | SwitchyardError::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Serialize into the error object carried by a JSON-RPC response.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<serde_json::Error> for SwitchyardError {
    fn from(err: serde_json::Error) -> Self {
        SwitchyardError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for SwitchyardError {
    fn from(err: serde_yaml::Error) -> Self {
        SwitchyardError::Serialization(err.to_string())
    }
}
