//! Descriptors handed to the approval channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::{ChainId, NetworkClientId, Origin};

/// Kind of user approval being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalKind {
    /// Switch the selected network before running a confirmation-requiring request.
    #[serde(rename = "wallet_switchEthereumChain")]
    SwitchEthereumChain,
}

/// Details of a proposed network switch, shown to the user for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainRequestData {
    /// Chain currently selected.
    pub from_chain_id: ChainId,
    /// Chain the request targets.
    pub to_chain_id: ChainId,
    /// Network client the selection will move to on approval.
    pub to_network_client_id: NetworkClientId,
}

/// A request for user approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// Unique identifier, used to accept or reject the request.
    pub id: Uuid,
    /// Origin the approval is requested on behalf of.
    pub origin: Origin,
    /// What is being approved.
    pub kind: ApprovalKind,
    /// Kind-specific details.
    pub request_data: SwitchChainRequestData,
    /// When the request was raised.
    pub requested_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Describe a proposed switch from `from` to `to` for `origin`.
    pub fn switch_chain(
        origin: Origin,
        from: ChainId,
        to: ChainId,
        to_network_client_id: NetworkClientId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            kind: ApprovalKind::SwitchEthereumChain,
            request_data: SwitchChainRequestData {
                from_chain_id: from,
                to_chain_id: to,
                to_network_client_id,
            },
            requested_at: Utc::now(),
        }
    }
}
