// File: gamesignal-core/tests/json_store_tests.rs

use gamesignal_common::models::device::{PersistedDevice, PersistedRegistry};
use gamesignal_common::traits::RegistryStore;
use gamesignal_core::repositories::JsonFileRegistryStore;
use gamesignal_core::Error;

#[tokio::test]
async fn test_missing_file_loads_empty() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = JsonFileRegistryStore::new(dir.path().join("devices.json"));
    assert!(store.load().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_save_writes_documented_layout() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let store = JsonFileRegistryStore::new(&path);

    let mut map = PersistedRegistry::new();
    map.insert(
        "Esp1".into(),
        PersistedDevice {
            url: "https://discord.com/api/webhooks/42/abc".into(),
            webhook_id: "42".into(),
        },
    );
    store.save(&map).await?;

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
    assert_eq!(raw["Esp1"]["webhook_id"], "42");
    assert_eq!(raw["Esp1"]["url"], "https://discord.com/api/webhooks/42/abc");

    assert_eq!(store.load().await?, map);
    assert!(!dir.path().join("devices.json.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn test_save_overwrites_full_map() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = JsonFileRegistryStore::new(dir.path().join("devices.json"));

    let mut map = PersistedRegistry::new();
    map.insert("Esp1".into(), PersistedDevice { url: "u1".into(), webhook_id: "1".into() });
    map.insert("Esp2".into(), PersistedDevice { url: "u2".into(), webhook_id: "2".into() });
    store.save(&map).await?;

    map.remove("Esp1");
    store.save(&map).await?;
    let loaded = store.load().await?;
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains_key("Esp2"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_persistence_error() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    std::fs::write(&path, b"{ not json")?;

    let store = JsonFileRegistryStore::new(&path);
    assert!(matches!(store.load().await, Err(Error::Persistence(_))));
    Ok(())
}

#[tokio::test]
async fn test_failed_replace_removes_temp_file() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    // A non-empty directory in the way makes the rename fail.
    std::fs::create_dir(&path)?;
    std::fs::write(path.join("keep"), b"x")?;

    let store = JsonFileRegistryStore::new(&path);
    let result = store.save(&PersistedRegistry::new()).await;
    assert!(matches!(result, Err(Error::Persistence(_))));
    assert!(!dir.path().join("devices.json.tmp").exists());
    Ok(())
}
