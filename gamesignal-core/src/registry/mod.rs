//! src/registry/mod.rs
//!
//! In-memory registry of device name -> webhook endpoint. The remote webhook
//! list is the source of truth; the persisted store is a cache that is
//! rewritten after every mutation and after every reconciliation.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use gamesignal_common::models::device::{DeviceEntry, PersistedRegistry, RemoteEndpoint};
use gamesignal_common::traits::registry_traits::{EndpointManager, RegistryStore};

use crate::Error;

/// Name reported for inbound webhook ids that match no registered device.
pub const UNKNOWN_DEVICE: &str = "Unknown";

pub const DEFAULT_ENDPOINT_PREFIX: &str = "Gaming-";

/// What a reconciliation pass found, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Devices now in the registry, in remote order.
    pub restored: Vec<String>,
    /// Persisted names whose endpoint no longer exists remotely.
    pub stale: Vec<String>,
    /// Persisted names whose url/webhook_id disagreed with the remote.
    pub refreshed: Vec<String>,
}

/// A mutation that went through on the remote side. The in-memory map always
/// reflects it; `unsaved` holds the store error if the write-through failed.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub unsaved: Option<Error>,
}

/// Pure half of reconciliation: rebuild entries from the remote list and
/// cross-check them against the persisted cache.
pub fn reconcile_entries(
    prefix: &str,
    remote: &[RemoteEndpoint],
    persisted: &PersistedRegistry,
) -> (Vec<DeviceEntry>, ReconcileReport) {
    let mut entries: Vec<DeviceEntry> = Vec::new();
    let mut report = ReconcileReport::default();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for endpoint in remote {
        let Some(name) = endpoint.name.strip_prefix(prefix) else {
            continue;
        };
        if name.is_empty() {
            debug!("Skipping webhook {} with an empty device name", endpoint.handle);
            continue;
        }
        if entries.iter().any(|e| e.name == name) {
            warn!(
                "Duplicate remote webhook name '{}' (id={}); keeping the first one",
                endpoint.name, endpoint.endpoint_id
            );
            continue;
        }
        if !seen_ids.insert(endpoint.endpoint_id.as_str()) {
            warn!("Remote webhook id {} listed twice; ignoring repeat", endpoint.endpoint_id);
            continue;
        }

        let entry = DeviceEntry::from_remote(name, endpoint);
        match persisted.get(name) {
            Some(cached) if *cached != entry.to_persisted() => {
                info!("Persisted entry for {name} disagrees with remote; refreshing");
                report.refreshed.push(name.to_string());
            }
            Some(_) => {}
            None => debug!("Device {name} found remotely but not in the persisted cache"),
        }
        report.restored.push(name.to_string());
        entries.push(entry);
    }

    for name in persisted.keys() {
        if !entries.iter().any(|e| &e.name == name) {
            warn!("Persisted device {name} has no remote webhook; dropping it");
            report.stale.push(name.clone());
        }
    }

    (entries, report)
}

fn to_persisted(entries: &[DeviceEntry]) -> PersistedRegistry {
    entries
        .iter()
        .map(|e| (e.name.clone(), e.to_persisted()))
        .collect()
}

fn normalize_name(raw: &str) -> Result<&str, Error> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::MalformedCommand("device name must not be empty".into()));
    }
    Ok(name)
}

/// Owns the device map plus the two collaborators every mutation goes through.
///
/// Mutations take `&mut self`; callers that share a registry across tasks wrap
/// the whole thing in one mutex, since rename/delete touch more than one key.
///
/// Until one reconciliation has succeeded the map is not trusted: mutations
/// retry reconciliation first and `flush` writes nothing.
pub struct DeviceRegistry {
    entries: Vec<DeviceEntry>,
    loaded: bool,
    prefix: String,
    remote_timeout: Duration,
    endpoints: Arc<dyn EndpointManager>,
    store: Arc<dyn RegistryStore>,
}

impl DeviceRegistry {
    pub fn new(
        endpoints: Arc<dyn EndpointManager>,
        store: Arc<dyn RegistryStore>,
        prefix: impl Into<String>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            entries: Vec::new(),
            loaded: false,
            prefix: prefix.into(),
            remote_timeout,
            endpoints,
            store,
        }
    }

    /// Rebuild the registry from the remote webhook list, cross-check it with
    /// the persisted cache, then overwrite the cache with the result.
    ///
    /// An unreadable store counts as empty. A failed remote listing leaves the
    /// registry untouched and is returned to the caller.
    pub async fn reconcile(&mut self) -> Result<ReconcileReport, Error> {
        let persisted = match self.bounded("loading registry store", self.store.load()).await {
            Ok(map) => map,
            Err(e) => {
                warn!("Could not load persisted devices, starting from remote only: {e}");
                PersistedRegistry::new()
            }
        };

        let remote = self
            .bounded("listing webhooks", self.endpoints.list())
            .await?;

        let (entries, report) = reconcile_entries(&self.prefix, &remote, &persisted);
        for name in &report.restored {
            info!("Reloaded webhook for {name}");
        }
        if let Some(e) = self.commit(entries).await {
            warn!("Reconciled registry could not be saved: {e}");
        }
        self.loaded = true;
        Ok(report)
    }

    /// Whether a reconciliation has succeeded at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn ensure_loaded(&mut self) -> Result<(), Error> {
        if self.loaded {
            return Ok(());
        }
        debug!("Registry not loaded yet; reconciling before mutation");
        self.reconcile().await.map(|_| ()).map_err(|e| {
            Error::RemoteOperation(format!("device registry not loaded yet: {e}"))
        })
    }

    /// Create a remote endpoint for `name` and register it. Returns the URL
    /// the device should post to.
    pub async fn create(&mut self, name: &str) -> Result<Applied<String>, Error> {
        let name = normalize_name(name)?;
        self.ensure_loaded().await?;
        if self.contains(name) {
            return Err(Error::DuplicateDevice(name.to_string()));
        }

        let full_name = format!("{}{}", self.prefix, name);
        let remote = self
            .bounded("creating webhook", self.endpoints.create(&full_name))
            .await?;
        if let Some(owner) = self.entries.iter().find(|e| e.endpoint_id == remote.endpoint_id) {
            let owner = owner.name.clone();
            warn!(
                "Webhook {} ({}) reuses the id of {owner}; removing it",
                remote.endpoint_id, remote.name
            );
            if let Err(e) = self
                .bounded("removing conflicting webhook", self.endpoints.delete(&remote.handle))
                .await
            {
                warn!("Could not remove webhook {}: {e}", remote.endpoint_id);
            }
            return Err(Error::RemoteOperation(format!(
                "remote returned endpoint id {} already owned by {owner}",
                remote.endpoint_id
            )));
        }

        let url = remote.url.clone();
        let mut next = self.entries.clone();
        next.push(DeviceEntry::from_remote(name, &remote));
        let unsaved = self.commit(next).await;

        info!("Created webhook for {name}: id={}", remote.endpoint_id);
        Ok(Applied { value: url, unsaved })
    }

    /// Move `old` to `new`, keeping the same remote endpoint. The remote
    /// webhook is renamed too so the new name survives reconciliation.
    pub async fn rename(&mut self, old: &str, new: &str) -> Result<Applied<()>, Error> {
        let old = normalize_name(old)?;
        let new = normalize_name(new)?;
        self.ensure_loaded().await?;

        let Some(pos) = self.position(old) else {
            return Err(Error::DeviceNotFound(old.to_string()));
        };
        if old == new {
            return Ok(Applied { value: (), unsaved: None });
        }
        if self.contains(new) {
            return Err(Error::DuplicateDevice(new.to_string()));
        }

        let handle = self.entries[pos].endpoint_reference.clone();
        let full_name = format!("{}{}", self.prefix, new);
        self.bounded("renaming webhook", self.endpoints.rename(&handle, &full_name))
            .await?;

        let mut next = self.entries.clone();
        next[pos].name = new.to_string();
        let unsaved = self.commit(next).await;

        info!("Renamed device: {old} -> {new}");
        Ok(Applied { value: (), unsaved })
    }

    /// Delete the remote endpoint, then drop the entry. If the remote call
    /// fails the entry stays.
    pub async fn delete(&mut self, name: &str) -> Result<Applied<()>, Error> {
        let name = normalize_name(name)?;
        self.ensure_loaded().await?;
        let Some(pos) = self.position(name) else {
            return Err(Error::DeviceNotFound(name.to_string()));
        };

        let handle = self.entries[pos].endpoint_reference.clone();
        self.bounded("deleting webhook", self.endpoints.delete(&handle))
            .await
            .map_err(|e| match e {
                Error::RemoteOperation(_) => e,
                other => Error::RemoteOperation(other.to_string()),
            })?;

        let mut next = self.entries.clone();
        next.remove(pos);
        let unsaved = self.commit(next).await;

        info!("Deleted webhook for {name}");
        Ok(Applied { value: (), unsaved })
    }

    /// Reverse lookup used for webhook-originated messages.
    pub fn lookup_by_endpoint_id(&self, endpoint_id: &str) -> &str {
        self.entries
            .iter()
            .find(|e| e.endpoint_id == endpoint_id)
            .map(|e| e.name.as_str())
            .unwrap_or(UNKNOWN_DEVICE)
    }

    pub fn list_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&DeviceEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the current map to the store. Used at shutdown. Does nothing if
    /// the registry was never loaded, so an outage cannot wipe the cache.
    pub async fn flush(&self) -> Result<(), Error> {
        if !self.loaded {
            debug!("Registry never loaded; leaving the store as it is");
            return Ok(());
        }
        self.save(&to_persisted(&self.entries)).await
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    async fn save(&self, snapshot: &PersistedRegistry) -> Result<(), Error> {
        self.bounded("saving registry store", self.store.save(snapshot))
            .await
            .map_err(|e| match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            })
    }

    /// Write-through then swap. The remote side has already changed by the
    /// time we get here, so the swap happens even if the save fails; the
    /// save error is handed back for the caller to report.
    async fn commit(&mut self, next: Vec<DeviceEntry>) -> Option<Error> {
        let snapshot = to_persisted(&next);
        let unsaved = match self.save(&snapshot).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to persist device registry ({} entries): {e}", snapshot.len());
                Some(e)
            }
        };
        self.entries = next;
        unsaved
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(self.remote_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteOperation(format!(
                "{what} timed out after {}s",
                self.remote_timeout.as_secs()
            ))),
        }
    }
}
