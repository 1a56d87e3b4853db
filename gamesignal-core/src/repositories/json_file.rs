// src/repositories/json_file.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use gamesignal_common::models::device::PersistedRegistry;
use gamesignal_common::traits::registry_traits::RegistryStore;

use crate::Error;

/// Registry store backed by a single JSON document:
/// `{ "<device>": { "url": "...", "webhook_id": "..." } }`.
pub struct JsonFileRegistryStore {
    path: PathBuf,
}

impl JsonFileRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RegistryStore for JsonFileRegistryStore {
    async fn load(&self) -> Result<PersistedRegistry, Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No registry file at {}; starting empty", self.path.display());
                return Ok(PersistedRegistry::new());
            }
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "reading {}: {e}",
                    self.path.display()
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PersistedRegistry::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Persistence(format!("parsing {}: {e}", self.path.display()))
        })
    }

    async fn save(&self, registry: &PersistedRegistry) -> Result<(), Error> {
        let body = serde_json::to_vec_pretty(registry)?;
        let tmp = self.temp_path();

        // Write beside the target and rename over it so readers never see a
        // half-written document.
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| Error::Persistence(format!("writing {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::Persistence(format!(
                "replacing {}: {e}",
                self.path.display()
            )));
        }

        trace!("Saved {} devices to {}", registry.len(), self.path.display());
        Ok(())
    }
}
