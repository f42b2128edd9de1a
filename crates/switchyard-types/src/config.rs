//! Configuration types, parsed from the YAML files in the config directory.
use serde::{Deserialize, Serialize};

use crate::network::{ChainId, NetworkClientId};

/// Aggregate configuration loaded by [`crate::config_loader::ConfigLoader`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchyardConfig {
    /// Admission control, from `queue.yaml`.
    pub queue: QueueConfig,
    /// Network clients, from `networks.yaml`.
    pub networks: NetworksConfig,
}

/// Admission control settings, parsed from `config/queue.yaml`.
///
/// ```yaml
/// queueing_enabled: true
/// confirmation_methods:
///   - eth_sendTransaction
/// network_switch_methods:
///   - wallet_switchEthereumChain
/// approval_timeout_secs: 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Whether confirmation-requiring requests are serialized at all.
    #[serde(default = "default_true")]
    pub queueing_enabled: bool,
    /// Methods that must run against a user-approved network.
    #[serde(default = "default_confirmation_methods")]
    pub confirmation_methods: Vec<String>,
    /// Methods that are themselves network-switch requests.
    #[serde(default = "default_network_switch_methods")]
    pub network_switch_methods: Vec<String>,
    /// How long the in-process approval controller waits for a decision.
    /// `None` waits indefinitely.
    #[serde(default)]
    pub approval_timeout_secs: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queueing_enabled: true,
            confirmation_methods: default_confirmation_methods(),
            network_switch_methods: default_network_switch_methods(),
            approval_timeout_secs: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_confirmation_methods() -> Vec<String> {
    [
        "eth_sendTransaction",
        "eth_sign",
        "personal_sign",
        "eth_signTypedData",
        "eth_signTypedData_v1",
        "eth_signTypedData_v3",
        "eth_signTypedData_v4",
        "wallet_addEthereumChain",
        "wallet_watchAsset",
        "wallet_requestPermissions",
        "eth_requestAccounts",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_network_switch_methods() -> Vec<String> {
    vec!["wallet_switchEthereumChain".to_string()]
}

/// Network client settings, parsed from `config/networks.yaml`.
///
/// ```yaml
/// selected: mainnet
/// custom:
///   - id: local-devnet
///     chain_id: "0x539"
///     rpc_url: http://127.0.0.1:8545
///     ticker: ETH
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworksConfig {
    /// Network client selected at startup.
    #[serde(default = "default_selected")]
    pub selected: NetworkClientId,
    /// Custom network clients, resolved through the network directory.
    #[serde(default)]
    pub custom: Vec<CustomNetworkConfig>,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            selected: default_selected(),
            custom: Vec::new(),
        }
    }
}

fn default_selected() -> NetworkClientId {
    NetworkClientId::from("mainnet")
}

/// A single custom network client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomNetworkConfig {
    pub id: NetworkClientId,
    pub chain_id: ChainId,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
}
