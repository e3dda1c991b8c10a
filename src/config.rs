//! Manager configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default capacity for lifecycle event channels.
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration for a [`SubscriptionManager`](crate::SubscriptionManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Label used in log fields and lifecycle events.
    /// Default: "subscription"
    pub name: String,

    /// Capacity of channels created by [`ManagerConfig::event_channel`].
    /// Default: 256
    pub event_buffer_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: "subscription".to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ManagerConfig {
    /// Default configuration with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Create a channel observer sized by this configuration.
    pub fn event_channel(&self) -> (crate::events::ChannelObserver, crate::events::EventHandle) {
        crate::events::ChannelObserver::bounded(self.event_buffer_size)
    }
}
