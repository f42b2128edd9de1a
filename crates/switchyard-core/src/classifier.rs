//! Static method classification.
//!
//! Maps a JSON-RPC method name to how the middleware admits it. The method
//! sets are fixed when the classifier is built; classification itself is a
//! pure lookup with no side effects.

use std::collections::HashSet;

use switchyard_types::config::QueueConfig;
use switchyard_types::rpc::MethodClass;

/// Classifies methods into [`MethodClass`] variants.
#[derive(Debug, Clone)]
pub struct MethodClassifier {
    confirmation_methods: HashSet<String>,
    network_switch_methods: HashSet<String>,
}

impl Default for MethodClassifier {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

impl MethodClassifier {
    /// Build a classifier from explicit method sets.
    ///
    /// A method present in both sets is treated as a network-switch request.
    pub fn new<C, S>(confirmation_methods: C, network_switch_methods: S) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            confirmation_methods: confirmation_methods.into_iter().map(Into::into).collect(),
            network_switch_methods: network_switch_methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a classifier from the method lists in `queue.yaml`.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(
            config.confirmation_methods.iter().cloned(),
            config.network_switch_methods.iter().cloned(),
        )
    }

    pub fn classify(&self, method: &str) -> MethodClass {
        if self.network_switch_methods.contains(method) {
            MethodClass::IsNetworkSwitchRequest
        } else if self.confirmation_methods.contains(method) {
            MethodClass::RequiresConfirmation
        } else {
            MethodClass::Bypass
        }
    }
}
