//! The channel registry.
//!
//! Built once at startup from a [`RegistryConfig`] and immutable
//! afterward: lookups read a plain `HashMap` with no locking, because
//! nothing writes to it after construction. All connection state lives
//! inside each [`Channel`], guarded by its own single-flight cell.

use crate::channel::Channel;
use crate::config::{ChannelSpec, RegistryConfig};
use crate::connect::{Connector, SqlxConnector};
use crate::error::{ChannelError, ChannelResult};
use crate::resolve::resolve_engine;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Mapping from channel name to its lazily connected channel.
///
/// Channels whose section names no known engine are skipped at build
/// time; an empty registry is valid. A malformed engine section aborts
/// construction instead (see [`crate::resolve`]).
#[derive(Debug)]
pub struct ChannelRegistry<C: Connector = SqlxConnector> {
    channels: HashMap<String, Channel<C>>,
}

impl ChannelRegistry<SqlxConnector> {
    /// Build a registry backed by the bundled sqlx connector.
    pub fn from_config(config: RegistryConfig) -> ChannelResult<Self> {
        Self::with_connector(config, Arc::new(SqlxConnector::new()))
    }
}

impl<C: Connector> ChannelRegistry<C> {
    /// Build a registry with an injected connection-opening strategy.
    pub fn with_connector(config: RegistryConfig, connector: Arc<C>) -> ChannelResult<Self> {
        let mut channels = HashMap::new();

        for (name, section) in config {
            let Some((driver, engine)) = resolve_engine(&name, &section.engines)? else {
                debug!(channel = %name, "no engine section, channel skipped");
                continue;
            };

            info!(channel = %name, driver = %driver, "registered database channel");
            let spec = ChannelSpec::new(name.clone(), section.options, engine);
            channels.insert(name, Channel::new(spec, connector.clone()));
        }

        Ok(Self { channels })
    }

    /// Get the named channel's connection handle, opening it on first
    /// access.
    ///
    /// Fails immediately with [`ChannelError::ChannelNotFound`] for
    /// unknown names; every other error comes from the channel's own
    /// initialization and is returned verbatim.
    pub async fn get(&self, name: &str) -> ChannelResult<C::Handle> {
        match self.channels.get(name) {
            Some(channel) => channel.get().await,
            None => Err(ChannelError::not_found(name)),
        }
    }

    /// Look up a channel without touching its connection state.
    pub fn channel(&self, name: &str) -> Option<&Channel<C>> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Registered channel names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
