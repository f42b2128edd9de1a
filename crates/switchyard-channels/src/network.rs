//! In-memory network controller.
//!
//! Tracks the globally selected network client, the custom network clients
//! known besides the built-in ones, and which network client each origin's
//! session is bound to. Implements both [`NetworkDirectory`] and
//! [`NetworkSwitchActuator`] so a single instance serves the middleware.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use switchyard_types::config::NetworksConfig;
use switchyard_types::errors::SwitchyardError;
use switchyard_types::network::{
    BuiltInNetwork, ChainId, NetworkClientConfig, NetworkClientId, Origin,
};
use switchyard_types::traits::{NetworkDirectory, NetworkSwitchActuator};

/// Network state shared by the directory and actuator roles.
pub struct NetworkController {
    /// Custom network clients, keyed by id.
    custom: RwLock<HashMap<NetworkClientId, NetworkClientConfig>>,
    /// Globally selected network client.
    selected: RwLock<NetworkClientId>,
    /// Network client each origin was last bound to.
    origins: RwLock<HashMap<Origin, NetworkClientId>>,
}

impl Default for NetworkController {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkController {
    /// Create a controller with only the built-in networks, on mainnet.
    pub fn new() -> Self {
        Self {
            custom: RwLock::new(HashMap::new()),
            selected: RwLock::new(NetworkClientId::from(BuiltInNetwork::Mainnet.client_id())),
            origins: RwLock::new(HashMap::new()),
        }
    }

    /// Create a controller from `networks.yaml`.
    ///
    /// Fails if a custom id shadows a built-in one or `selected` is unknown.
    pub fn from_config(config: &NetworksConfig) -> Result<Self, SwitchyardError> {
        let mut custom = HashMap::new();
        for network in &config.custom {
            if BuiltInNetwork::from_client_id(&network.id).is_some() {
                return Err(SwitchyardError::Config(format!(
                    "custom network '{}' shadows a built-in network",
                    network.id
                )));
            }
            custom.insert(
                network.id.clone(),
                NetworkClientConfig {
                    chain_id: network.chain_id,
                    rpc_url: network.rpc_url.clone(),
                    ticker: network.ticker.clone(),
                },
            );
        }

        if BuiltInNetwork::from_client_id(&config.selected).is_none()
            && !custom.contains_key(&config.selected)
        {
            return Err(SwitchyardError::Config(format!(
                "selected network '{}' is not a known network client",
                config.selected
            )));
        }

        debug!(
            selected = %config.selected,
            custom = custom.len(),
            "network controller initialized"
        );
        Ok(Self {
            custom: RwLock::new(custom),
            selected: RwLock::new(config.selected.clone()),
            origins: RwLock::new(HashMap::new()),
        })
    }

    /// Register or replace a custom network client.
    pub async fn add_custom(
        &self,
        id: NetworkClientId,
        config: NetworkClientConfig,
    ) -> Result<(), SwitchyardError> {
        if BuiltInNetwork::from_client_id(&id).is_some() {
            return Err(SwitchyardError::NetworkLookup(format!(
                "'{id}' is a built-in network client"
            )));
        }
        info!(network_client_id = %id, chain_id = %config.chain_id, "registered custom network");
        self.custom.write().await.insert(id, config);
        Ok(())
    }

    /// Remove a custom network client.
    ///
    /// The selected network cannot be removed.
    pub async fn remove_custom(&self, id: &NetworkClientId) -> Result<(), SwitchyardError> {
        // Lock order: `custom`, then `selected`.
        let mut custom = self.custom.write().await;
        let selected = self.selected.read().await;
        if *selected == *id {
            return Err(SwitchyardError::NetworkLookup(format!(
                "cannot remove selected network '{id}'"
            )));
        }
        match custom.remove(id) {
            Some(_) => {
                info!(network_client_id = %id, "removed custom network");
                Ok(())
            }
            None => Err(SwitchyardError::NetworkLookup(format!(
                "unknown network client '{id}'"
            ))),
        }
    }

    /// The globally selected network client.
    pub async fn selected_network_client(&self) -> NetworkClientId {
        self.selected.read().await.clone()
    }

    /// The network client `origin` is bound to, if any.
    pub async fn network_client_for_origin(&self, origin: &Origin) -> Option<NetworkClientId> {
        self.origins.read().await.get(origin).cloned()
    }

    async fn resolve(&self, id: &NetworkClientId) -> Option<NetworkClientConfig> {
        match BuiltInNetwork::from_client_id(id) {
            Some(network) => Some(NetworkClientConfig {
                chain_id: network.chain_id(),
                rpc_url: None,
                ticker: None,
            }),
            None => self.custom.read().await.get(id).cloned(),
        }
    }
}

#[async_trait]
impl NetworkDirectory for NetworkController {
    async fn client_config(
        &self,
        id: &NetworkClientId,
    ) -> Result<NetworkClientConfig, SwitchyardError> {
        self.resolve(id)
            .await
            .ok_or_else(|| SwitchyardError::NetworkLookup(format!("unknown network client '{id}'")))
    }

    async fn selected_chain_id(&self) -> Result<ChainId, SwitchyardError> {
        let selected = self.selected_network_client().await;
        Ok(self.client_config(&selected).await?.chain_id)
    }
}

#[async_trait]
impl NetworkSwitchActuator for NetworkController {
    async fn switch_to_built_in(&self, network: BuiltInNetwork) -> Result<(), SwitchyardError> {
        *self.selected.write().await = NetworkClientId::from(network.client_id());
        info!(network = %network, chain_id = %network.chain_id(), "selected built-in network");
        Ok(())
    }

    async fn switch_to_custom(&self, id: &NetworkClientId) -> Result<(), SwitchyardError> {
        // Held until the selection is written so the client cannot be
        // removed in between.
        let custom = self.custom.read().await;
        let chain_id = match custom.get(id) {
            Some(config) => config.chain_id,
            None => {
                return Err(SwitchyardError::SwitchActuation(format!(
                    "unknown custom network client '{id}'"
                )))
            }
        };
        *self.selected.write().await = id.clone();
        drop(custom);
        info!(network_client_id = %id, %chain_id, "selected custom network");
        Ok(())
    }

    async fn set_network_client_for_origin(
        &self,
        origin: &Origin,
        id: &NetworkClientId,
    ) -> Result<(), SwitchyardError> {
        if self.resolve(id).await.is_none() {
            return Err(SwitchyardError::SwitchActuation(format!(
                "cannot bind {origin} to unknown network client '{id}'"
            )));
        }
        self.origins
            .write()
            .await
            .insert(origin.clone(), id.clone());
        debug!(%origin, network_client_id = %id, "bound origin to network client");
        Ok(())
    }
}
