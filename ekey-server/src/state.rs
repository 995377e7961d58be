//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use ekey_core::MappingTable;

use crate::auth::SecretToken;
use crate::bridge::Bridge;
use crate::bus::EventBus;
use crate::config::Config;
use crate::publisher::Hub;

/// Application state containing shared resources.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Resolve-and-publish pipeline holding the current mapping
    pub bridge: Arc<Bridge>,
    /// Event bus and sensor registry the bridge publishes into
    pub hub: Arc<Hub>,
    /// Bearer token for the webhook and admin routes, `None` when disabled
    pub secret_token: Option<Arc<SecretToken>>,
}

impl AppState {
    /// Wire a hub and bridge around `mapping`.
    pub fn new(mapping: MappingTable, bus: EventBus, secret_token: Option<SecretToken>) -> Self {
        let hub = Arc::new(Hub::new(bus));
        let bridge = Arc::new(Bridge::new(mapping, hub.clone()));

        Self {
            bridge,
            hub,
            secret_token: secret_token.map(Arc::new),
        }
    }

    /// State built from server configuration and an already loaded mapping.
    pub fn from_config(config: &Config, mapping: MappingTable) -> Self {
        Self::new(
            mapping,
            EventBus::new(config.event_bus_capacity),
            config.token(),
        )
    }

    pub fn bus(&self) -> &EventBus {
        self.hub.bus()
    }
}
