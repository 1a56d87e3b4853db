use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque handle to a remote webhook resource. Whatever the platform needs to
/// address it again (for Discord: the webhook id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointHandle(pub String);

impl std::fmt::Display for EndpointHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One webhook as reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Full remote name, including the device prefix (e.g. `Gaming-Esp1`).
    pub name: String,
    pub handle: EndpointHandle,
    pub url: String,
    pub endpoint_id: String,
}

/// A registered device, keyed by `name` inside the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub name: String,
    pub endpoint_reference: EndpointHandle,
    pub endpoint_url: String,
    pub endpoint_id: String,
}

impl DeviceEntry {
    pub fn from_remote(name: impl Into<String>, remote: &RemoteEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint_reference: remote.handle.clone(),
            endpoint_url: remote.url.clone(),
            endpoint_id: remote.endpoint_id.clone(),
        }
    }

    pub fn to_persisted(&self) -> PersistedDevice {
        PersistedDevice {
            url: self.endpoint_url.clone(),
            webhook_id: self.endpoint_id.clone(),
        }
    }
}

/// Value half of the persisted `name -> {url, webhook_id}` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDevice {
    pub url: String,
    pub webhook_id: String,
}

pub type PersistedRegistry = BTreeMap<String, PersistedDevice>;
