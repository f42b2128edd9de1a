//! Config directory loader with validation and hot-reload support.
//!
//! Reads all config from a directory path, validates on load, watches for
//! file changes via `notify`, and emits config change events via
//! `tokio::sync::watch`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;

use crate::config::*;
use crate::errors::SwitchyardError;
use crate::network::BuiltInNetwork;

const METHOD_NAME_PATTERN: &str = "^[A-Za-z][A-Za-z0-9_]*$";

/// Loads, validates, and watches configuration from a directory.
///
/// Expected directory structure:
/// ```text
/// config/
/// ├── queue.yaml
/// └── networks.yaml   (optional)
/// ```
pub struct ConfigLoader {
    /// Root config directory path.
    config_dir: PathBuf,
    /// Watch sender for broadcasting config changes.
    tx: watch::Sender<SwitchyardConfig>,
    /// File watcher handle (kept alive to maintain the watch).
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigLoader {
    /// Load all configuration from a directory, validate, and return a `ConfigLoader`
    /// along with a `watch::Receiver` for subscribing to config changes.
    ///
    /// Call `watch()` afterwards to start hot-reload file watching.
    pub fn load(
        config_dir: &Path,
    ) -> Result<(Self, watch::Receiver<SwitchyardConfig>), SwitchyardError> {
        let config = Self::load_all(config_dir)?;
        Self::validate(&config)?;

        let (tx, rx) = watch::channel(config);

        Ok((
            Self {
                config_dir: config_dir.to_path_buf(),
                tx,
                _watcher: None,
            },
            rx,
        ))
    }

    /// Start watching the config directory for changes.
    ///
    /// A valid reload is broadcast via the watch channel. Invalid configs are
    /// logged and the previous config stays in effect.
    pub fn watch(&mut self) -> Result<(), SwitchyardError> {
        let config_dir = self.config_dir.clone();
        let tx = self.tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        Self::reload_into(&config_dir, &tx);
                    }
                }
                Err(e) => {
                    tracing::error!("file watcher error: {e}");
                }
            }
        })
        .map_err(|e| SwitchyardError::Config(format!("failed to create file watcher: {e}")))?;

        watcher
            .watch(&self.config_dir, RecursiveMode::Recursive)
            .map_err(|e| {
                SwitchyardError::Config(format!("failed to watch config directory: {e}"))
            })?;

        self._watcher = Some(watcher);
        tracing::info!(dir = %self.config_dir.display(), "started watching config directory");
        Ok(())
    }

    /// Re-read the directory and broadcast the result if it is valid.
    ///
    /// Returns whether a new config was published.
    pub fn reload(&self) -> bool {
        Self::reload_into(&self.config_dir, &self.tx)
    }

    fn reload_into(config_dir: &Path, tx: &watch::Sender<SwitchyardConfig>) -> bool {
        match Self::load_all(config_dir) {
            Ok(config) => match Self::validate(&config) {
                Ok(()) => {
                    tx.send_replace(config);
                    tracing::info!("config reloaded successfully");
                    true
                }
                Err(e) => {
                    tracing::warn!(
                        "config validation failed after file change, keeping previous config: {e}"
                    );
                    false
                }
            },
            Err(e) => {
                tracing::warn!("config load failed after file change, keeping previous config: {e}");
                false
            }
        }
    }

    /// Load all config files from a directory.
    pub fn load_all(config_dir: &Path) -> Result<SwitchyardConfig, SwitchyardError> {
        let queue = Self::load_queue(config_dir)?;
        let networks = Self::load_networks(config_dir)?;
        Ok(SwitchyardConfig { queue, networks })
    }

    /// Load queue.yaml from the config directory.
    fn load_queue(config_dir: &Path) -> Result<QueueConfig, SwitchyardError> {
        let path = config_dir.join("queue.yaml");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SwitchyardError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            SwitchyardError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load networks.yaml from the config directory, defaulting when absent.
    fn load_networks(config_dir: &Path) -> Result<NetworksConfig, SwitchyardError> {
        let path = config_dir.join("networks.yaml");
        if !path.exists() {
            return Ok(NetworksConfig::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SwitchyardError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            SwitchyardError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Validate the aggregate config for internal consistency.
    ///
    /// Checks:
    /// - Method names are well-formed and classified at most once
    /// - The approval timeout, if set, is positive
    /// - Custom network ids are unique and do not shadow built-in ids
    /// - The selected network names a known network client
    pub fn validate(config: &SwitchyardConfig) -> Result<(), SwitchyardError> {
        Self::validate_queue(&config.queue)?;
        Self::validate_networks(&config.networks)?;
        Ok(())
    }

    fn validate_queue(config: &QueueConfig) -> Result<(), SwitchyardError> {
        let pattern = regex::Regex::new(METHOD_NAME_PATTERN)
            .map_err(|e| SwitchyardError::Config(format!("invalid method name pattern: {e}")))?;
        let mut seen: HashSet<&str> = HashSet::new();

        for (list_name, methods) in [
            ("confirmation_methods", &config.confirmation_methods),
            ("network_switch_methods", &config.network_switch_methods),
        ] {
            for method in methods {
                if !pattern.is_match(method) {
                    return Err(SwitchyardError::Config(format!(
                        "invalid method name '{method}' in '{list_name}'"
                    )));
                }
                if !seen.insert(method.as_str()) {
                    return Err(SwitchyardError::Config(format!(
                        "duplicate method '{method}' found in '{list_name}' (already classified)"
                    )));
                }
            }
        }

        if config.approval_timeout_secs == Some(0) {
            return Err(SwitchyardError::Config(
                "approval_timeout_secs must be positive (got 0)".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_networks(config: &NetworksConfig) -> Result<(), SwitchyardError> {
        let mut custom_ids: HashSet<&str> = HashSet::new();

        for network in &config.custom {
            if network.id.as_str().is_empty() {
                return Err(SwitchyardError::Config(
                    "custom network id must not be empty".to_string(),
                ));
            }
            if BuiltInNetwork::from_client_id(&network.id).is_some() {
                return Err(SwitchyardError::Config(format!(
                    "custom network '{}' shadows a built-in network",
                    network.id
                )));
            }
            if !custom_ids.insert(network.id.as_str()) {
                return Err(SwitchyardError::Config(format!(
                    "duplicate custom network '{}'",
                    network.id
                )));
            }
        }

        let selected_known = BuiltInNetwork::from_client_id(&config.selected).is_some()
            || custom_ids.contains(config.selected.as_str());
        if !selected_known {
            return Err(SwitchyardError::Config(format!(
                "selected network '{}' is neither built-in nor a declared custom network",
                config.selected
            )));
        }

        Ok(())
    }
}
