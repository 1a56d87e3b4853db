use async_trait::async_trait;

use crate::error::Error;
use crate::models::device::{EndpointHandle, PersistedRegistry, RemoteEndpoint};

/// Load/save boundary for the persisted `name -> {url, webhook_id}` document.
/// Always written as the full map.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn load(&self) -> Result<PersistedRegistry, Error>;
    async fn save(&self, registry: &PersistedRegistry) -> Result<(), Error>;
}

/// Creates and removes the remote webhook resources devices post through.
///
/// `delete` is not idempotent: deleting an already-deleted handle is an error.
#[async_trait]
pub trait EndpointManager: Send + Sync {
    /// Every webhook on the target channel, prefixed or not.
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, Error>;
    /// `full_name` already carries the device prefix.
    async fn create(&self, full_name: &str) -> Result<RemoteEndpoint, Error>;
    async fn rename(&self, handle: &EndpointHandle, full_name: &str) -> Result<(), Error>;
    async fn delete(&self, handle: &EndpointHandle) -> Result<(), Error>;
}
