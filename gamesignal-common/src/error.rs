// ================================================================
// File: gamesignal-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Registry / command errors, each one becomes a chat reply:
    #[error("Device {0} is already registered")]
    DuplicateDevice(String),

    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    // Remote endpoint errors:
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    // Registry store errors:
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
