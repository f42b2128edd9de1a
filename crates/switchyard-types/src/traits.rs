//! Trait contracts for the collaborators the coordinator depends on.
//!
//! The middleware codes against these interfaces only. Concrete
//! implementations live in `switchyard-channels` or in the embedding host,
//! and tests substitute hand-written mocks.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::approval::ApprovalRequest;
use crate::config::SwitchyardConfig;
use crate::errors::SwitchyardError;
use crate::network::{BuiltInNetwork, ChainId, NetworkClientConfig, NetworkClientId, Origin};

/// Resolves network clients and reports the globally selected network.
#[async_trait]
pub trait NetworkDirectory: Send + Sync {
    /// Look up the configuration of a network client.
    ///
    /// Fails with [`SwitchyardError::NetworkLookup`] if the id is unknown.
    async fn client_config(
        &self,
        id: &NetworkClientId,
    ) -> Result<NetworkClientConfig, SwitchyardError>;

    /// Chain id of the globally selected network.
    async fn selected_chain_id(&self) -> Result<ChainId, SwitchyardError>;
}

/// Asks the user to approve an action.
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    /// Resolves when the user approves.
    ///
    /// A decline is reported as [`SwitchyardError::ApprovalDeclined`]; any
    /// other error means the channel itself failed.
    async fn request_approval(&self, request: ApprovalRequest) -> Result<(), SwitchyardError>;
}

/// Performs network changes and maintains the origin → network-client mapping.
#[async_trait]
pub trait NetworkSwitchActuator: Send + Sync {
    /// Select a built-in network.
    async fn switch_to_built_in(&self, network: BuiltInNetwork) -> Result<(), SwitchyardError>;

    /// Select a custom network client.
    async fn switch_to_custom(&self, id: &NetworkClientId) -> Result<(), SwitchyardError>;

    /// Associate `origin`'s session with a network client.
    async fn set_network_client_for_origin(
        &self,
        origin: &Origin,
        id: &NetworkClientId,
    ) -> Result<(), SwitchyardError>;
}

/// Feature flag gating admission control. Read once per request.
pub trait QueueingToggle: Send + Sync {
    fn is_queueing_enabled(&self) -> bool;
}

impl QueueingToggle for bool {
    fn is_queueing_enabled(&self) -> bool {
        *self
    }
}

impl QueueingToggle for AtomicBool {
    fn is_queueing_enabled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// Follows the hot-reloaded configuration.
impl QueueingToggle for watch::Receiver<SwitchyardConfig> {
    fn is_queueing_enabled(&self) -> bool {
        self.borrow().queue.queueing_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_toggle_follows_store() {
        let flag = AtomicBool::new(true);
        assert!(flag.is_queueing_enabled());
        flag.store(false, Ordering::Release);
        assert!(!flag.is_queueing_enabled());
    }

    #[test]
    fn test_watch_toggle_follows_config_updates() {
        let (tx, rx) = watch::channel(SwitchyardConfig::default());
        assert!(rx.is_queueing_enabled());

        let mut updated = SwitchyardConfig::default();
        updated.queue.queueing_enabled = false;
        tx.send(updated).unwrap();
        assert!(!rx.is_queueing_enabled());
    }
}
