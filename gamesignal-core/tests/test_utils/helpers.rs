// File: gamesignal-core/tests/test_utils/helpers.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamesignal_common::models::device::{
    EndpointHandle, PersistedDevice, PersistedRegistry, RemoteEndpoint,
};
use gamesignal_common::traits::{ChatOutlet, EndpointManager, RegistryStore};
use gamesignal_core::{DeviceRegistry, Error};

pub const PREFIX: &str = "Gaming-";

pub fn remote(name: &str, id: u64) -> RemoteEndpoint {
    RemoteEndpoint {
        name: name.to_string(),
        handle: EndpointHandle(id.to_string()),
        url: format!("https://discord.com/api/webhooks/{id}/token{id}"),
        endpoint_id: id.to_string(),
    }
}

pub fn persisted(id: u64) -> PersistedDevice {
    PersistedDevice {
        url: format!("https://discord.com/api/webhooks/{id}/token{id}"),
        webhook_id: id.to_string(),
    }
}

/// Registry store kept in memory, counting saves.
#[derive(Default)]
pub struct MemoryStore {
    pub data: Mutex<PersistedRegistry>,
    pub saves: AtomicUsize,
    pub fail_loads: AtomicBool,
    pub fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn with(data: PersistedRegistry) -> Self {
        Self {
            data: Mutex::new(data),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> PersistedRegistry {
        self.data.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load(&self) -> Result<PersistedRegistry, Error> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Error::Persistence("store unreadable".into()));
        }
        Ok(self.snapshot())
    }

    async fn save(&self, registry: &PersistedRegistry) -> Result<(), Error> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Persistence("store unwritable".into()));
        }
        *self.data.lock().unwrap() = registry.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Stateful stand-in for the Discord webhook API.
pub struct FakeEndpoints {
    pub webhooks: Mutex<Vec<RemoteEndpoint>>,
    pub next_id: AtomicUsize,
    pub creates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_next: Mutex<Option<Error>>,
}

impl FakeEndpoints {
    pub fn new(webhooks: Vec<RemoteEndpoint>) -> Self {
        Self {
            webhooks: Mutex::new(webhooks),
            next_id: AtomicUsize::new(100),
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    pub fn fail_next_call(&self, err: Error) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn names(&self) -> Vec<String> {
        self.webhooks.lock().unwrap().iter().map(|w| w.name.clone()).collect()
    }

    fn take_failure(&self) -> Result<(), Error> {
        match self.fail_next.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EndpointManager for FakeEndpoints {
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, Error> {
        self.take_failure()?;
        Ok(self.webhooks.lock().unwrap().clone())
    }

    async fn create(&self, full_name: &str) -> Result<RemoteEndpoint, Error> {
        self.take_failure()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        let endpoint = remote(full_name, id);
        self.webhooks.lock().unwrap().push(endpoint.clone());
        Ok(endpoint)
    }

    async fn rename(&self, handle: &EndpointHandle, full_name: &str) -> Result<(), Error> {
        self.take_failure()?;
        let mut hooks = self.webhooks.lock().unwrap();
        let hook = hooks
            .iter_mut()
            .find(|w| &w.handle == handle)
            .ok_or_else(|| Error::RemoteOperation(format!("unknown webhook {handle}")))?;
        hook.name = full_name.to_string();
        Ok(())
    }

    async fn delete(&self, handle: &EndpointHandle) -> Result<(), Error> {
        self.take_failure()?;
        let mut hooks = self.webhooks.lock().unwrap();
        let before = hooks.len();
        hooks.retain(|w| &w.handle != handle);
        if hooks.len() == before {
            return Err(Error::RemoteOperation(format!("unknown webhook {handle}")));
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Collects every line the service posts.
#[derive(Default)]
pub struct RecordingOutlet {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingOutlet {
    pub fn lines(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatOutlet for RecordingOutlet {
    async fn send(&self, text: &str) -> Result<(), Error> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn build_registry(endpoints: Arc<FakeEndpoints>, store: Arc<MemoryStore>) -> DeviceRegistry {
    DeviceRegistry::new(endpoints, store, PREFIX, Duration::from_secs(5))
}
